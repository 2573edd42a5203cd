//! Layered configuration resolution.
//!
//! The raw input is a loosely typed JSON document. [`resolve`] merges it with
//! the injected preset catalog into an immutable [`ResolvedSpec`], clamping
//! every numeric field and canonicalizing every enum field, and reports each
//! deviation from the literal input as a diagnostics event.

pub mod catalog;
pub mod resolve;
pub mod types;


pub use catalog::PresetCatalog;
pub use resolve::resolve;
pub use types::*;

use serde_json::Value;

/// The raw, loosely typed input document. Must be a JSON object at the top
/// level; everything below that is best-effort.
pub type RawConfig = Value;

/// Loose coercion from a JSON value, shared by every resolved field.
pub trait Coerce: Sized {
    fn coerce(value: &Value) -> Option<Self>;
}

impl Coerce for f64 {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Coerce for i64 {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64)),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
            }
            _ => None,
        }
    }
}

impl Coerce for bool {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Coerce for String {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Coerce an optional JSON value, falling back to `default`.
pub fn coerce_or<T: Coerce>(value: Option<&Value>, default: T) -> T {
    value.and_then(T::coerce).unwrap_or(default)
}

/// Borrow `raw[key]` as an object, treating anything else as absent.
pub fn object<'a>(raw: &'a Value, key: &str) -> Option<&'a serde_json::Map<String, Value>> {
    raw.get(key).and_then(Value::as_object)
}

/// Look up a dotted path in a JSON document.
pub fn get_path<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = raw;
    for key in path.split('.') {
        node = node.get(key)?;
    }
    Some(node)
}
