use crate::error::{GraphError, Result};
use crate::types::{SizeClass, SizeThresholds};

/// Nearest-rank tertile boundaries over `values`.
///
/// Indices are `round((n-1)/3)` and `round(2(n-1)/3)`. Both fractions only
/// have thirds as remainders, so the rounding is exact in integers.
pub fn quantile_thresholds(values: &[u64]) -> Result<SizeThresholds> {
    if values.is_empty() {
        return Err(GraphError::EmptyInput(
            "no closure sizes to compute thresholds from".to_string(),
        ));
    }

    let mut ordered = values.to_vec();
    ordered.sort_unstable();

    let last = ordered.len() - 1;
    let low_index = (last + 1) / 3;
    let high_index = (2 * last + 1) / 3;

    Ok(SizeThresholds {
        low: ordered[low_index],
        high: ordered[high_index],
    })
}

/// Bucket one closure size. Boundary values fall into the lower class.
pub fn class_for_size(size: Option<u64>, thresholds: SizeThresholds) -> SizeClass {
    match size {
        None => SizeClass::Unknown,
        Some(size) if size <= thresholds.low => SizeClass::Small,
        Some(size) if size <= thresholds.high => SizeClass::Medium,
        Some(_) => SizeClass::Large,
    }
}
