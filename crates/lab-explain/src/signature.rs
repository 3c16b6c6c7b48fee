//! State signatures used as cache keys
//!
//! A signature must be identical for snapshots the learner would consider the
//! same state. Two ready-made strategies:
//! - [`canonical_signature`]: blake3 over the canonical JSON of the whole snapshot
//! - [`projected`]: readable `key:value|...` over a fixed set of top-level fields

use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

/// Caller-supplied signature function
pub type SignatureFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Canonical JSON encoding: object keys sorted, no insignificant whitespace
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// blake3 hex digest of the canonical JSON encoding
#[must_use]
pub fn canonical_signature(value: &Value) -> String {
    blake3::hash(canonical_json(value).as_bytes())
        .to_hex()
        .to_string()
}

/// Signature over selected top-level fields, in the given order
///
/// Missing fields render as `null`, so adding an unrelated field to the
/// snapshot never changes the key.
#[must_use]
pub fn projected(fields: &[&str]) -> SignatureFn {
    let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
    Arc::new(move |value: &Value| {
        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            let rendered = value.get(field).map_or_else(
                || "null".to_string(),
                |v| match v {
                    Value::String(s) => s.clone(),
                    other => canonical_json(other),
                },
            );
            // Writing into a String cannot fail.
            let _ = write!(out, "{field}:{rendered}");
        }
        out
    })
}

/// Default signature function
#[must_use]
pub fn default_signature() -> SignatureFn {
    Arc::new(canonical_signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = json!({"b": {"y": 1, "x": [true, null]}, "a": "s"});
        assert_eq!(canonical_json(&value), r#"{"a":"s","b":{"x":[true,null],"y":1}}"#);
    }

    #[test]
    fn canonical_signature_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"ph":7,"color":"transparent"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"color":"transparent","ph":7}"#).unwrap();
        assert_eq!(canonical_signature(&a), canonical_signature(&b));
        assert_ne!(canonical_signature(&a), canonical_signature(&json!({"ph": 6})));
    }

    #[test]
    fn projected_signature_ignores_other_fields() {
        let signature = projected(&["experimentMode", "metal"]);
        let a = json!({"experimentMode": "metal_acid", "metal": "zinc", "temperature": 25});
        let b = json!({"experimentMode": "metal_acid", "metal": "zinc", "temperature": 40});
        assert_eq!(signature(&a), "experimentMode:metal_acid|metal:zinc");
        assert_eq!(signature(&a), signature(&b));
        assert_eq!(signature(&json!({})), "experimentMode:null|metal:null");
    }
}
