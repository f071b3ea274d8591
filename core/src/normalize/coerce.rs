use serde_json::Value;

/// Best-effort conversion of an arbitrary JSON value to `f64`.
///
/// Null, blank or unparseable strings, arrays, objects and non-finite
/// results all collapse to `default`. Never fails.
pub fn coerce_f64(value: &Value, default: f64) -> f64 {
    let parsed = match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Renders a scalar as trimmed text. Numbers keep their JSON spelling
/// (numeric ids); anything else is empty.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
