//! Tagged records: `{ <tag>: <discriminant>, ...params }`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EngineError, Family, Result};

/// Discriminant field for actions, conditions, selectors and targetings.
pub const TYPE_TAG: &str = "type";

/// Discriminant field for events.
pub const EVENT_TAG: &str = "event_name";

/// Record with a discriminant and no parameters.
#[must_use]
pub fn unit(discriminant: &str) -> Value {
    with_params(discriminant, Map::new())
}

/// Record with a discriminant and explicit parameters.
#[must_use]
pub fn with_params(discriminant: &str, mut params: Map<String, Value>) -> Value {
    params.insert(TYPE_TAG.to_string(), Value::String(discriminant.to_string()));
    Value::Object(params)
}

/// Record whose parameters are the serde serialization of `params`.
///
/// `params` must serialize to a map (a struct with named fields) or to
/// nothing (a unit struct).
pub fn tagged<T: Serialize + ?Sized>(family: Family, discriminant: &str, params: &T) -> Result<Value> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(with_params(discriminant, map)),
        Value::Null => Ok(unit(discriminant)),
        other => Err(EngineError::MalformedRecord {
            family,
            reason: format!("{discriminant} parameters serialized to {other}, expected an object"),
        }),
    }
}

/// The fields of a record that must be an object.
pub fn object(family: Family, record: &Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map.clone()),
        other => Err(EngineError::MalformedRecord {
            family,
            reason: format!("expected an object, found {other}"),
        }),
    }
}

/// Split a record into its raw discriminant and the remaining parameters.
pub fn split(family: Family, tag: &str, record: &Value) -> Result<(String, Map<String, Value>)> {
    let mut params = object(family, record)?;
    match params.remove(tag) {
        Some(Value::String(discriminant)) => Ok((discriminant, params)),
        Some(other) => Err(EngineError::MalformedRecord {
            family,
            reason: format!("`{tag}` must be a string, found {other}"),
        }),
        None => Err(EngineError::MalformedRecord {
            family,
            reason: format!("missing `{tag}`"),
        }),
    }
}

/// Take an optional field, treating `null` as absent.
pub fn take_optional(params: &mut Map<String, Value>, field: &str) -> Option<Value> {
    params.remove(field).filter(|v| !v.is_null())
}

/// Take a required nested record out of `params`.
pub fn take_field(family: Family, params: &mut Map<String, Value>, field: &str) -> Result<Value> {
    params.remove(field).ok_or_else(|| EngineError::MalformedRecord {
        family,
        reason: format!("missing `{field}`"),
    })
}

/// Reject whatever fields are left once a record has been consumed.
pub fn finish(family: Family, discriminant: &str, params: &Map<String, Value>) -> Result<()> {
    match params.keys().next() {
        None => Ok(()),
        Some(field) => Err(EngineError::MalformedRecord {
            family,
            reason: format!("unexpected field `{field}` for {discriminant}"),
        }),
    }
}

/// Registry key for a discriminant.
///
/// Splits on `_`, capitalizes each word (rest lower-cased) and joins
/// without separators, so `change_attack`, `Change_Attack` and
/// `CHANGE_ATTACK` all map to `ChangeAttack`.
///
/// ```
/// use hearth_rules::serialization::normalize_discriminant;
///
/// assert_eq!(normalize_discriminant("change_attack"), "ChangeAttack");
/// assert_eq!(normalize_discriminant("taunt"), "Taunt");
/// ```
#[must_use]
pub fn normalize_discriminant(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Amount {
        amount: i64,
    }

    #[derive(Serialize)]
    struct Marker;

    #[derive(Serialize)]
    struct Bare(i64);

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_discriminant("has_lowest_health"), "HasLowestHealth");
        assert_eq!(normalize_discriminant("IS_SELF"), "IsSelf");
        assert_eq!(normalize_discriminant("focus__or_self"), "FocusOrSelf");
        assert_eq!(normalize_discriminant(""), "");
    }

    #[test]
    fn test_tagged() {
        let value = tagged(Family::Action, "damage", &Amount { amount: 2 }).unwrap();
        assert_eq!(value, json!({"type": "damage", "amount": 2}));

        let value = tagged(Family::Action, "taunt", &Marker).unwrap();
        assert_eq!(value, json!({"type": "taunt"}));

        let err = tagged(Family::Action, "bare", &Bare(1)).unwrap_err();
        assert!(matches!(err, EngineError::MalformedRecord { family: Family::Action, .. }));
    }

    #[test]
    fn test_split() {
        let (discriminant, params) =
            split(Family::Action, TYPE_TAG, &json!({"type": "damage", "amount": 2})).unwrap();
        assert_eq!(discriminant, "damage");
        assert_eq!(params.get("amount"), Some(&json!(2)));
        assert!(!params.contains_key("type"));
    }

    #[test]
    fn test_split_rejects_malformed() {
        for record in [json!(3), json!({"amount": 2}), json!({"type": 7})] {
            let err = split(Family::Action, TYPE_TAG, &record).unwrap_err();
            assert!(matches!(err, EngineError::MalformedRecord { .. }));
        }
    }

    #[test]
    fn test_finish_rejects_leftovers() {
        let (_, params) = split(Family::Action, TYPE_TAG, &json!({"type": "taunt"})).unwrap();
        assert!(finish(Family::Action, "taunt", &params).is_ok());

        let (_, params) = split(Family::Action, TYPE_TAG, &json!({"type": "taunt", "amount": 1})).unwrap();
        let err = finish(Family::Action, "taunt", &params).unwrap_err();
        assert!(matches!(err, EngineError::MalformedRecord { ref reason, .. } if reason.contains("amount")));
    }
}
