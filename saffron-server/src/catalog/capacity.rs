//! Variant capacity calculator
//!
//! The maximum number of distinguishable variants a category permits is
//! the cartesian product of its attribute value-set sizes. A category
//! with no attributes can distinguish exactly one variant.

/// Compute the maximum number of distinguishable variant combinations.
pub fn max_combinations(value_counts: &[usize]) -> u64 {
    value_counts
        .iter()
        .fold(1u64, |acc, &n| acc.saturating_mul(n as u64))
}
