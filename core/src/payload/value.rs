//! Tolerant coercions for values whose wire representation depends on the
//! client that serialised them (string, float or native integer).

use serde_json::Value;

/// Stringify a raw value. Absent and null map to the empty string; integral
/// floats render without a fractional part so `22.0` and `22` agree.
pub fn value_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Coerce a raw value to an integer: native integer first, then a float
/// truncated toward zero, then a numeric string. Anything else is 0.
pub fn value_to_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                i64::MAX
            } else {
                // `as` saturates and maps NaN to 0.
                n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)
            }
        }
        Some(Value::String(s)) => s.parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

pub fn value_to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(_)) => value_to_int(value) != 0,
        _ => false,
    }
}
