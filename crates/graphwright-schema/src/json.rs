//! Conversions between JSON and constant GraphQL values.

use async_graphql_value::{ConstValue, Name, Number};

/// Converts a JSON value (request variables, host defaults) into a constant
/// value. JSON has no enum literals, so strings stay strings.
pub fn json_to_const(json: serde_json::Value) -> ConstValue {
    match json {
        serde_json::Value::Null => ConstValue::Null,
        serde_json::Value::Bool(b) => ConstValue::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ConstValue::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                ConstValue::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Number::from_f64(f).map_or(ConstValue::Null, ConstValue::Number)
            } else {
                ConstValue::Null
            }
        }
        serde_json::Value::String(s) => ConstValue::String(s),
        serde_json::Value::Array(items) => {
            ConstValue::List(items.into_iter().map(json_to_const).collect())
        }
        serde_json::Value::Object(object) => ConstValue::Object(
            object
                .into_iter()
                .map(|(k, v)| (Name::new(k), json_to_const(v)))
                .collect(),
        ),
    }
}

/// Converts a constant value into JSON. Enum values serialize as strings.
pub fn const_to_json(value: &ConstValue) -> serde_json::Value {
    match value {
        ConstValue::Null => serde_json::Value::Null,
        ConstValue::Boolean(b) => serde_json::Value::Bool(*b),
        ConstValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                n.as_f64().map_or(serde_json::Value::Null, serde_json::Value::from)
            }
        }
        ConstValue::String(s) => serde_json::Value::String(s.clone()),
        ConstValue::Enum(name) => serde_json::Value::String(name.to_string()),
        ConstValue::List(items) => serde_json::Value::Array(items.iter().map(const_to_json).collect()),
        ConstValue::Object(object) => serde_json::Value::Object(
            object
                .iter()
                .map(|(k, v)| (k.to_string(), const_to_json(v)))
                .collect(),
        ),
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_const_scalars() {
        assert_eq!(json_to_const(json!(null)), ConstValue::Null);
        assert_eq!(json_to_const(json!(true)), ConstValue::Boolean(true));
        assert_eq!(json_to_const(json!(42)), ConstValue::Number(42.into()));
        assert_eq!(json_to_const(json!("Adam")), ConstValue::String("Adam".into()));
    }

    #[test]
    fn test_json_to_const_object() {
        let value = json_to_const(json!({"first": "Adam", "tags": [1, 2]}));
        let ConstValue::Object(object) = value else {
            panic!("expected an object");
        };
        assert_eq!(
            object.get(&Name::new("first")),
            Some(&ConstValue::String("Adam".into()))
        );
        assert_eq!(
            object.get(&Name::new("tags")),
            Some(&ConstValue::List(vec![
                ConstValue::Number(1.into()),
                ConstValue::Number(2.into()),
            ]))
        );
    }

    #[test]
    fn test_const_to_json_enum_is_string() {
        let value = ConstValue::List(vec![ConstValue::Enum(Name::new("RED")), ConstValue::Null]);
        assert_eq!(const_to_json(&value), json!(["RED", null]));
    }
}
