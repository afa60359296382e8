use crate::error::{GraphError, Result};
use serde_json::Value;

const SIZE_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Render a byte count with binary units (one decimal above plain bytes).
pub fn human_size(value: Option<u64>) -> String {
    let Some(bytes) = value else {
        return "unknown".to_string();
    };
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", SIZE_UNITS[unit])
}

/// Coerce a JSON size field into bytes.
///
/// Accepts non-negative integers, non-negative floats (truncated) and
/// digit-only strings. `null` means the size is unknown.
pub fn coerce_size(value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                return Ok(Some(n));
            }
            match number.as_f64() {
                // u64::MAX as f64 rounds up to 2^64, which is already out of range.
                Some(f) if f.is_finite() && f >= 0.0 && f < u64::MAX as f64 => {
                    Ok(Some(f.trunc() as u64))
                }
                _ => Err(GraphError::Format(format!("size is not a number: {number}"))),
            }
        }
        Value::String(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            text.parse::<u64>()
                .map(Some)
                .map_err(|e| GraphError::Format(format!("size {text:?} out of range: {e}")))
        }
        other => Err(GraphError::Format(format!("size is not a number: {other}"))),
    }
}
