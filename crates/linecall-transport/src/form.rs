//! Query-form encoding for read-style methods.

use linecall_core::TransportError;
use serde_json::Value;

/// Flatten a JSON object body into query pairs.
///
/// Strings are sent as-is, numbers and booleans as text, nested objects and
/// arrays as compact JSON. `null` members are skipped. An empty body or a
/// `null` document yields no pairs.
pub fn query_pairs(body: &[u8]) -> Result<Vec<(String, String)>, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| TransportError::Encoding(format!("body is not JSON: {e}")))?;
    let map = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(TransportError::Encoding(format!(
                "read-style request body must be a JSON object, found {}",
                kind(&other)
            )))
        }
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
            };
            Some((key, text))
        })
        .collect())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(body: &str) -> Vec<(String, String)> {
        query_pairs(body.as_bytes()).unwrap()
    }

    #[test]
    fn scalars_become_text() {
        let mut got = pairs(r#"{"id":"1","page":2,"active":true}"#);
        got.sort();
        assert_eq!(
            got,
            [
                ("active".to_string(), "true".to_string()),
                ("id".to_string(), "1".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn nested_values_are_compact_json_and_nulls_are_skipped() {
        let mut got = pairs(r#"{"filter":{"a":1},"tags":["x","y"],"gone":null}"#);
        got.sort();
        assert_eq!(
            got,
            [
                ("filter".to_string(), r#"{"a":1}"#.to_string()),
                ("tags".to_string(), r#"["x","y"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn empty_and_null_bodies_have_no_pairs() {
        assert!(pairs("").is_empty());
        assert!(pairs("null").is_empty());
        assert!(pairs("{}").is_empty());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(
            query_pairs(b"[1,2]"),
            Err(TransportError::Encoding(msg)) if msg.contains("array")
        ));
        assert!(matches!(query_pairs(b"{oops"), Err(TransportError::Encoding(_))));
    }
}
