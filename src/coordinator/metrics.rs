//! Share-of-total metric.

use crate::models::Record;

/// Sum of `value` over `records`; zero for an empty slice.
pub fn sum(records: &[Record]) -> f64 {
    records.iter().map(|r| r.value).sum()
}

/// The records' sum as a percentage of `global_total`.
///
/// Zero when the total is not positive. Not clamped: a partial or stale
/// global total can legitimately put a user above 100%.
pub fn percentage(records: &[Record], global_total: f64) -> f64 {
    if global_total <= 0.0 {
        return 0.0;
    }
    sum(records) / global_total * 100.0
}
