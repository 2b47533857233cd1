//! Catalog rule violations
//!
//! Validators collect every violation they find and report them together;
//! callers must never see only the first failure of a batch.

use serde::Serialize;

/// Machine-readable violation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// Attribute value id unknown or belonging to another category
    UnknownAttributeValue,
    /// Two values of the same attribute on one variant
    DuplicateAttribute,
    /// More variants than the category schema can distinguish
    CapacityExceeded,
    /// Two variants with an identical attribute-value combination
    DuplicateCombination,
    /// Variant count exceeds the capacity of the target category
    CategoryCapacityExceeded,
    /// Two image creates referencing the same uploaded file
    DuplicateFileIndex,
    /// Image op referencing a file index past the uploaded set
    FileIndexOutOfBounds,
    /// Create and update ops referencing the same uploaded file
    OverlappingFileReference,
    /// Image ops would leave the product with zero images
    NoImagesRemain,
}

/// One violation: code + human message
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
}

impl Violation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Aggregated validation failure
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogViolations {
    pub violations: Vec<Violation>,
}

impl CatalogViolations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: ViolationCode, message: impl Into<String>) {
        self.violations.push(Violation::new(code, message));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Ok(()) when empty, Err(self) otherwise
    pub fn into_result(self) -> Result<(), CatalogViolations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn contains(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }
}

impl std::fmt::Display for CatalogViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msgs: Vec<&str> = self.violations.iter().map(|v| v.message.as_str()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

impl std::error::Error for CatalogViolations {}
