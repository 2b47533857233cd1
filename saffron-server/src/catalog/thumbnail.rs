//! Thumbnail reconciliation
//!
//! Every product keeps exactly one image flagged as its thumbnail. The
//! reconciler takes the current images plus a pending operation set and
//! returns a patched copy of the operations (the input is never mutated)
//! such that exactly one image ends up flagged. Priority when several ops
//! claim the flag: first flagged create, then first flagged update, then
//! the surviving current thumbnail. When the current thumbnail is deleted
//! without an explicit replacement, the first remaining image (preferring
//! one with pending edits) takes over. Zero remaining images fails the
//! whole request.

use shared::models::{Image, ImageOpUpdate, ImageOps};

use super::violation::{CatalogViolations, ViolationCode};

/// Validate the uploaded-file references of an operation set.
///
/// Collects every problem: duplicate create indices, create/update index
/// overlaps and out-of-bounds references.
pub fn validate_file_refs(ops: &ImageOps, files_len: usize) -> Result<(), CatalogViolations> {
    let mut violations = CatalogViolations::new();

    let mut seen_create: Vec<usize> = Vec::new();
    for op in &ops.create {
        if seen_create.contains(&op.file_index) {
            violations.push(
                ViolationCode::DuplicateFileIndex,
                format!("file index {} referenced by more than one image create", op.file_index),
            );
        } else {
            seen_create.push(op.file_index);
        }
        if op.file_index >= files_len {
            violations.push(
                ViolationCode::FileIndexOutOfBounds,
                format!("file index {} out of bounds ({} file(s) uploaded)", op.file_index, files_len),
            );
        }
    }

    let mut seen_update: Vec<usize> = Vec::new();
    for op in &ops.update {
        let Some(idx) = op.file_index else { continue };
        if seen_create.contains(&idx) || seen_update.contains(&idx) {
            violations.push(
                ViolationCode::OverlappingFileReference,
                format!("file index {idx} referenced by more than one image operation"),
            );
        } else {
            seen_update.push(idx);
        }
        if idx >= files_len {
            violations.push(
                ViolationCode::FileIndexOutOfBounds,
                format!("file index {idx} out of bounds ({} file(s) uploaded)", files_len),
            );
        }
    }

    violations.into_result()
}

/// Which image ends up carrying the thumbnail flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Winner {
    Create(usize),
    Existing(i64),
}

/// Reconcile an operation set so exactly one resulting image is the
/// thumbnail. Returns the patched copy.
pub fn reconcile_thumbnails(
    current: &[Image],
    ops: &ImageOps,
) -> Result<ImageOps, CatalogViolations> {
    let mut patched = ops.clone();

    let survivors: Vec<&Image> = current
        .iter()
        .filter(|img| !ops.delete.contains(&img.id))
        .collect();

    if survivors.is_empty() && patched.create.is_empty() {
        let mut violations = CatalogViolations::new();
        violations.push(
            ViolationCode::NoImagesRemain,
            "image operations would leave the product without any image",
        );
        return Err(violations);
    }

    let current_thumb: Option<i64> = current.iter().find(|img| img.is_thumbnail).map(|img| img.id);
    let thumb_survives = current_thumb.is_some_and(|id| !ops.delete.contains(&id));
    let thumb_explicitly_unset = current_thumb.is_some_and(|id| {
        ops.update
            .iter()
            .any(|u| u.id == id && u.is_thumbnail == Some(false))
    });

    // Pick the winner by priority; clear every other explicit flag.
    let winner = if let Some(idx) = patched.create.iter().position(|c| c.is_thumbnail) {
        Winner::Create(idx)
    } else if let Some(u) = patched
        .update
        .iter()
        .find(|u| u.is_thumbnail == Some(true) && survivor_id(&survivors, u.id))
    {
        Winner::Existing(u.id)
    } else if thumb_survives && !thumb_explicitly_unset {
        Winner::Existing(current_thumb.unwrap())
    } else {
        // Fallback: first remaining image, preferring one with pending
        // edits; a newly created image only if nothing else remains.
        let unset_id = if thumb_explicitly_unset { current_thumb } else { None };
        let edited = survivors
            .iter()
            .find(|img| Some(img.id) != unset_id && patched.update.iter().any(|u| u.id == img.id));
        let plain = survivors.iter().find(|img| Some(img.id) != unset_id);
        match edited.or(plain).or(survivors.first()) {
            Some(img) => Winner::Existing(img.id),
            None => Winner::Create(0),
        }
    };

    // Clear competing create flags
    for (idx, op) in patched.create.iter_mut().enumerate() {
        op.is_thumbnail = winner == Winner::Create(idx);
    }

    // Clear competing update flags; the winning existing image keeps or
    // gains an explicit Some(true)
    for op in patched.update.iter_mut() {
        if op.is_thumbnail.is_some() || Winner::Existing(op.id) == winner {
            op.is_thumbnail = Some(Winner::Existing(op.id) == winner);
        }
    }

    match winner {
        Winner::Existing(id) => {
            // Synthesize the assignment when no update entry names the winner
            if !patched.update.iter().any(|u| u.id == id) {
                patched.update.push(set_thumbnail_op(id, true));
            }
            // Unset a different surviving previous thumbnail
            if let Some(prev) = current_thumb
                && prev != id
                && !ops.delete.contains(&prev)
                && !patched.update.iter().any(|u| u.id == prev)
            {
                patched.update.push(set_thumbnail_op(prev, false));
            }
        }
        Winner::Create(_) => {
            // A new image takes over: unset the surviving previous thumbnail
            if let Some(prev) = current_thumb
                && !ops.delete.contains(&prev)
                && !patched.update.iter().any(|u| u.id == prev)
            {
                patched.update.push(set_thumbnail_op(prev, false));
            }
        }
    }

    Ok(patched)
}

fn survivor_id(survivors: &[&Image], id: i64) -> bool {
    survivors.iter().any(|img| img.id == id)
}

fn set_thumbnail_op(id: i64, flag: bool) -> ImageOpUpdate {
    ImageOpUpdate {
        id,
        file_index: None,
        alt_text: None,
        is_thumbnail: Some(flag),
        position: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ImageOpCreate;

    fn image(id: i64, is_thumbnail: bool) -> Image {
        Image {
            id,
            product_id: 1,
            thumb_key: format!("img/{id}/thumb"),
            thumb_url: format!("https://cdn.test/img/{id}/thumb"),
            medium_key: format!("img/{id}/medium"),
            medium_url: format!("https://cdn.test/img/{id}/medium"),
            large_key: format!("img/{id}/large"),
            large_url: format!("https://cdn.test/img/{id}/large"),
            alt_text: None,
            is_thumbnail,
            position: id as i32,
        }
    }

    fn create_op(file_index: usize, is_thumbnail: bool) -> ImageOpCreate {
        ImageOpCreate {
            file_index,
            alt_text: None,
            is_thumbnail,
            position: None,
        }
    }

    fn update_op(id: i64, is_thumbnail: Option<bool>) -> ImageOpUpdate {
        ImageOpUpdate {
            id,
            file_index: None,
            alt_text: None,
            is_thumbnail,
            position: None,
        }
    }

    /// Count thumbnails after notionally applying the patched ops.
    fn final_thumbnails(current: &[Image], patched: &ImageOps) -> usize {
        let mut count = 0;
        for img in current {
            if patched.delete.contains(&img.id) {
                continue;
            }
            let flag = patched
                .update
                .iter()
                .find(|u| u.id == img.id)
                .and_then(|u| u.is_thumbnail)
                .unwrap_or(img.is_thumbnail);
            if flag {
                count += 1;
            }
        }
        count + patched.create.iter().filter(|c| c.is_thumbnail).count()
    }

    #[test]
    fn test_first_flagged_create_wins_and_duplicates_cleared() {
        let current = vec![image(1, true), image(2, false)];
        let ops = ImageOps {
            create: vec![create_op(0, true), create_op(1, true)],
            update: vec![update_op(2, Some(true))],
            delete: vec![],
        };
        let patched = reconcile_thumbnails(&current, &ops).unwrap();
        assert!(patched.create[0].is_thumbnail);
        assert!(!patched.create[1].is_thumbnail);
        // Previous thumbnail and the flagged update are both unset
        assert_eq!(final_thumbnails(&current, &patched), 1);
        assert!(patched
            .update
            .iter()
            .any(|u| u.id == 1 && u.is_thumbnail == Some(false)));
    }

    #[test]
    fn test_flagged_update_wins_when_no_create_flagged() {
        let current = vec![image(1, true), image(2, false)];
        let ops = ImageOps {
            create: vec![create_op(0, false)],
            update: vec![update_op(2, Some(true))],
            delete: vec![],
        };
        let patched = reconcile_thumbnails(&current, &ops).unwrap();
        assert_eq!(final_thumbnails(&current, &patched), 1);
        // New assignment patched in an unset for the old thumbnail
        assert!(patched
            .update
            .iter()
            .any(|u| u.id == 1 && u.is_thumbnail == Some(false)));
        assert!(patched
            .update
            .iter()
            .any(|u| u.id == 2 && u.is_thumbnail == Some(true)));
    }

    #[test]
    fn test_current_thumbnail_kept_when_nothing_flagged() {
        let current = vec![image(1, true), image(2, false)];
        let ops = ImageOps::default();
        let patched = reconcile_thumbnails(&current, &ops).unwrap();
        assert_eq!(final_thumbnails(&current, &patched), 1);
    }

    #[test]
    fn test_deleted_thumbnail_falls_back_to_edited_survivor() {
        let current = vec![image(1, true), image(2, false), image(3, false)];
        let ops = ImageOps {
            create: vec![],
            update: vec![update_op(3, None)],
            delete: vec![1],
        };
        let patched = reconcile_thumbnails(&current, &ops).unwrap();
        // Image 3 has pending edits, so it is preferred over image 2
        assert!(patched
            .update
            .iter()
            .any(|u| u.id == 3 && u.is_thumbnail == Some(true)));
        assert_eq!(final_thumbnails(&current, &patched), 1);
    }

    #[test]
    fn test_deleted_thumbnail_falls_back_to_first_survivor() {
        let current = vec![image(1, true), image(2, false)];
        let ops = ImageOps {
            create: vec![],
            update: vec![],
            delete: vec![1],
        };
        let patched = reconcile_thumbnails(&current, &ops).unwrap();
        assert!(patched
            .update
            .iter()
            .any(|u| u.id == 2 && u.is_thumbnail == Some(true)));
        assert_eq!(final_thumbnails(&current, &patched), 1);
    }

    #[test]
    fn test_deleting_every_image_fails() {
        let current = vec![image(1, true), image(2, false)];
        let ops = ImageOps {
            create: vec![],
            update: vec![],
            delete: vec![1, 2],
        };
        let err = reconcile_thumbnails(&current, &ops).unwrap_err();
        assert!(err.contains(ViolationCode::NoImagesRemain));
    }

    #[test]
    fn test_create_on_empty_product_becomes_thumbnail() {
        let ops = ImageOps {
            create: vec![create_op(0, false)],
            update: vec![],
            delete: vec![],
        };
        let patched = reconcile_thumbnails(&[], &ops).unwrap();
        assert!(patched.create[0].is_thumbnail);
    }

    #[test]
    fn test_input_ops_are_not_mutated() {
        let current = vec![image(1, true)];
        let ops = ImageOps {
            create: vec![create_op(0, true)],
            update: vec![],
            delete: vec![],
        };
        let _ = reconcile_thumbnails(&current, &ops).unwrap();
        // Reconciliation returns a copy; the caller's ops are untouched
        assert!(ops.update.is_empty());
    }

    #[test]
    fn test_file_ref_violations_are_aggregated() {
        let ops = ImageOps {
            create: vec![create_op(0, false), create_op(0, false), create_op(7, false)],
            update: vec![ImageOpUpdate {
                id: 1,
                file_index: Some(0),
                alt_text: None,
                is_thumbnail: None,
                position: None,
            }],
            delete: vec![],
        };
        let err = validate_file_refs(&ops, 2).unwrap_err();
        assert!(err.contains(ViolationCode::DuplicateFileIndex));
        assert!(err.contains(ViolationCode::FileIndexOutOfBounds));
        assert!(err.contains(ViolationCode::OverlappingFileReference));
    }

    #[test]
    fn test_file_refs_within_bounds_pass() {
        let ops = ImageOps {
            create: vec![create_op(0, true), create_op(1, false)],
            update: vec![],
            delete: vec![],
        };
        assert!(validate_file_refs(&ops, 2).is_ok());
    }
}
