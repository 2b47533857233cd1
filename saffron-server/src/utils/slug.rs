//! Slug derivation for product URLs
//!
//! Lowercased ASCII with runs of non-alphanumerics collapsed to a single
//! hyphen. Uniqueness is enforced by the product repository, which appends
//! a numeric suffix on collision.

/// Derive a URL slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() { "product".to_string() } else { slug }
}

/// Append a numeric suffix to a base slug (used on collisions).
pub fn with_suffix(base: &str, n: u32) -> String {
    format!("{base}-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(slugify("Smoked Paprika"), "smoked-paprika");
        assert_eq!(slugify("Ceylon Cinnamon (Ground)"), "ceylon-cinnamon-ground");
    }

    #[test]
    fn test_collapses_symbol_runs() {
        assert_eq!(slugify("Chili -- extra hot!!"), "chili-extra-hot");
        assert_eq!(slugify("  Cumin  "), "cumin");
    }

    #[test]
    fn test_non_ascii_falls_back() {
        assert_eq!(slugify("藏红花"), "product");
        assert_eq!(slugify("Sumac 烟熏"), "sumac");
    }

    #[test]
    fn test_suffix() {
        assert_eq!(with_suffix("cumin", 2), "cumin-2");
    }
}
