//! Default-value merge.
//!
//! Defaults fill gaps only: a key is filled when the document lacks it or
//! holds `null` or `""`. Values the caller set are never overwritten, arrays
//! are never touched, and nested objects merge recursively. Merging is
//! idempotent.

use serde_json::{Map, Value};

use crate::format::{json_type, FormatError};

/// Merge `defaults` into `document`.
///
/// A `null` document becomes a copy of the defaults. Non-object defaults
/// only replace an empty document.
///
/// # Errors
///
/// Returns [`FormatError::ShapeMismatch`] when the document is a non-null
/// scalar or array and the defaults are an object.
pub fn merge_defaults(document: Value, defaults: &Value) -> Result<Value, FormatError> {
    let Value::Object(default_map) = defaults else {
        return Ok(if is_empty(&document) && !defaults.is_null() {
            defaults.clone()
        } else {
            document
        });
    };

    match document {
        Value::Null => Ok(defaults.clone()),
        Value::Object(mut map) => {
            fill(&mut map, default_map);
            Ok(Value::Object(map))
        }
        other => Err(FormatError::ShapeMismatch {
            path: "(root)".into(),
            expected: "object",
            found: json_type(&other),
        }),
    }
}

fn fill(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match target.get_mut(key) {
            Some(Value::Object(nested)) => {
                if let Value::Object(nested_defaults) = default {
                    fill(nested, nested_defaults);
                }
            }
            Some(value) if !is_empty(value) => {}
            _ => {
                target.insert(key.clone(), default.clone());
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_document_takes_defaults() {
        let defaults = json!({"id": 1});
        assert_eq!(merge_defaults(Value::Null, &defaults).unwrap(), defaults);
    }

    #[test]
    fn empty_object_is_filled() {
        let merged = merge_defaults(json!({}), &json!({"id": 1, "page": {"size": 20}})).unwrap();
        assert_eq!(merged, json!({"id": 1, "page": {"size": 20}}));
    }

    #[test]
    fn caller_values_win() {
        let merged = merge_defaults(
            json!({"id": 7, "flag": false, "count": 0, "tags": []}),
            &json!({"id": 1, "flag": true, "count": 5, "tags": ["a"]}),
        )
        .unwrap();
        assert_eq!(merged, json!({"id": 7, "flag": false, "count": 0, "tags": []}));
    }

    #[test]
    fn null_and_empty_string_count_as_missing() {
        let merged = merge_defaults(
            json!({"name": "", "region": null, "keep": "x"}),
            &json!({"name": "anon", "region": "eu", "keep": "y"}),
        )
        .unwrap();
        assert_eq!(merged, json!({"name": "anon", "region": "eu", "keep": "x"}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let merged = merge_defaults(
            json!({"page": {"number": 3}}),
            &json!({"page": {"number": 1, "size": 20}}),
        )
        .unwrap();
        assert_eq!(merged, json!({"page": {"number": 3, "size": 20}}));
    }

    #[test]
    fn scalar_document_with_object_defaults_is_rejected() {
        let err = merge_defaults(json!([1, 2]), &json!({"id": 1})).unwrap_err();
        assert!(matches!(
            err,
            FormatError::ShapeMismatch { expected: "object", found: "array", .. }
        ));
    }

    #[test]
    fn null_defaults_leave_document_alone() {
        let doc = json!({"id": 2});
        assert_eq!(merge_defaults(doc.clone(), &Value::Null).unwrap(), doc);
        assert_eq!(merge_defaults(Value::Null, &Value::Null).unwrap(), Value::Null);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-e]{1,2}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn json_object() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-e]{1,2}", json_value(), 0..6)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        /// Merging twice is the same as merging once.
        #[test]
        fn merge_is_idempotent(doc in json_object(), defaults in json_object()) {
            let once = merge_defaults(doc, &defaults).unwrap();
            let twice = merge_defaults(once.clone(), &defaults).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Top-level values the caller set survive the merge.
        #[test]
        fn set_values_are_never_overwritten(doc in json_object(), defaults in json_object()) {
            let merged = merge_defaults(doc.clone(), &defaults).unwrap();
            let (Value::Object(before), Value::Object(after)) = (&doc, &merged) else {
                unreachable!("objects in, object out");
            };
            for (key, value) in before {
                if !is_empty(value) && !value.is_object() {
                    prop_assert_eq!(after.get(key), Some(value));
                }
            }
        }

        /// A document that already sets every default key is unchanged.
        #[test]
        fn complete_document_is_unchanged(defaults in json_object()) {
            let Value::Object(map) = &defaults else { unreachable!() };
            let doc: Value = Value::Object(
                map.keys().map(|k| (k.clone(), Value::Bool(true))).collect(),
            );
            prop_assert_eq!(merge_defaults(doc.clone(), &defaults).unwrap(), doc);
        }
    }
}
