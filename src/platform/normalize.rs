//! Canonical shapes for collaborator responses.
//!
//! The platform answers the same question in different shapes depending on
//! version and endpoint: verification procedures reply `true`, `"true"` or a
//! JSON string wrapping `"true"`, and list endpoints reply either a bare array or
//! an object holding the array under some key. All of that drift is absorbed here.

use serde_json::Value;

/// Wrapper keys that are known to carry record lists, in priority order.
const LIST_KEYS: [&str; 3] = ["users", "data", "items"];

/// Nesting depth accepted for string-encoded booleans (`"\"true\""`).
const MAX_STRING_DECODE_DEPTH: u8 = 2;

/// Interpret a verification response body as a boolean.
///
/// Only `true` (as a JSON boolean, the string `"true"`, or a JSON string whose
/// content decodes to one of those) yields `true`. Everything else is `false`.
#[must_use]
pub fn is_truthy(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value_is_true(&value, 0),
        Err(_) => body.trim() == "true",
    }
}

fn value_is_true(value: &Value, depth: u8) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => {
            let text = text.trim();
            if text == "true" {
                return true;
            }
            if depth >= MAX_STRING_DECODE_DEPTH {
                return false;
            }
            serde_json::from_str::<Value>(text)
                .is_ok_and(|inner| value_is_true(&inner, depth + 1))
        }
        _ => false,
    }
}

/// Flatten a list response into its records.
///
/// Accepts a bare array, an object wrapping an array under one of the known
/// keys (or, failing that, its first array-valued field in document order), or
/// a single object that is itself a record (has an `id`). Returned order is the
/// collaborator's.
#[must_use]
pub fn record_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(records) => records,
        Value::Object(mut map) => {
            let wrapper = LIST_KEYS
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_array));
            if let Some(Value::Array(records)) = wrapper.and_then(|key| map.remove(key)) {
                return records;
            }
            if map.contains_key("id") {
                return vec![Value::Object(map)];
            }
            map.into_iter()
                .find_map(|(_, field)| match field {
                    Value::Array(records) => Some(records),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Render a scalar identifier (`"abc"` or `42`) as a string.
#[must_use]
pub fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_accepts_all_true_encodings() {
        assert!(is_truthy("true"));
        assert!(is_truthy("\"true\""));
        assert!(is_truthy("\"\\\"true\\\"\""));
        assert!(is_truthy(" true \n"));
    }

    #[test]
    fn truthy_rejects_everything_else() {
        for body in [
            "false",
            "\"false\"",
            "null",
            "",
            "1",
            "\"TRUE\"",
            "{\"valid\":true}",
            "[true]",
            "yes",
        ] {
            assert!(!is_truthy(body), "{body:?} must not be truthy");
        }
    }

    #[test]
    fn record_list_from_bare_array() {
        let records = record_list(json!([{ "id": "1" }, { "id": "2" }]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "1");
    }

    #[test]
    fn record_list_from_known_wrapper_keys() {
        for key in LIST_KEYS {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(key.to_string(), json!([{ "id": "u1" }]));
            wrapped.insert("aud".to_string(), json!("authenticated"));
            let records = record_list(Value::Object(wrapped));
            assert_eq!(records.len(), 1, "wrapper key {key}");
        }
    }

    #[test]
    fn record_list_prefers_users_over_other_arrays() {
        let records = record_list(json!({
            "data": [{ "id": "from-data" }],
            "users": [{ "id": "from-users" }]
        }));
        assert_eq!(records[0]["id"], "from-users");
    }

    #[test]
    fn record_list_falls_back_to_any_array_field() {
        let records = record_list(json!({ "total": 1, "results": [{ "id": "r1" }] }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "r1");
    }

    #[test]
    fn record_list_fallback_uses_document_order() {
        let records = record_list(
            serde_json::from_str(r#"{"zeta":[{"id":"z"}],"alpha":[{"id":"a"}]}"#)
                .unwrap_or_default(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "z");
    }

    #[test]
    fn record_list_wraps_single_record() {
        let records = record_list(json!({ "id": "solo", "email": "a@b.com" }));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn record_list_of_scalars_is_empty() {
        assert!(record_list(json!(null)).is_empty());
        assert!(record_list(json!("users")).is_empty());
        assert!(record_list(json!({ "total": 0 })).is_empty());
    }

    #[test]
    fn scalar_id_handles_strings_and_numbers() {
        assert_eq!(scalar_id(&json!("room-1")), Some("room-1".to_string()));
        assert_eq!(scalar_id(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_id(&json!("")), None);
        assert_eq!(scalar_id(&json!(null)), None);
    }
}
