use crate::item::{Record, RecordExt};

/// Non-negative integer column of the first row, 0 when absent.
pub(crate) fn first_count(records: &[Record], key: &str) -> u64 {
    records
        .first()
        .and_then(|r| r.get_i64(key))
        .map(|v| v.max(0) as u64)
        .unwrap_or(0)
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// String values of one column, skipping nulls and empty strings.
pub(crate) fn column_strings(records: &[Record], key: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get_str(key))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
