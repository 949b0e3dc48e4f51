//! Coerced input values.
//!
//! Coercion turns raw input (query literals, variables, host defaults) into
//! [`CoercedValue`]s. Input objects and directive arguments become
//! [`InputObject`]s: generated records laid out after an [`InputShape`],
//! readable by position or by field name.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_graphql_value::{ConstValue, Name, Number};
use indexmap::IndexMap;

/// Internal representation produced by a custom scalar's input coercion.
#[derive(Clone)]
pub struct ScalarValue(Arc<dyn Any + Send + Sync>);

impl ScalarValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the internal representation as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScalarValue(..)")
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A value that passed input coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Null,
    Int(i32),
    Float(f64),
    String(String),
    Boolean(bool),
    Id(String),
    Enum(String),
    Custom(ScalarValue),
    List(Vec<CoercedValue>),
    Object(InputObject),
}

impl CoercedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text of a `String`, `ID` or enum value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Id(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(f64::from(*n)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CoercedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&InputObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrows a custom scalar's internal representation.
    pub fn as_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Converts back into a wire value. Custom scalars have no generic wire
    /// form and yield `None`.
    pub fn to_const(&self) -> Option<ConstValue> {
        Some(match self {
            Self::Null => ConstValue::Null,
            Self::Int(n) => ConstValue::Number(Number::from(*n)),
            Self::Float(f) => ConstValue::Number(Number::from_f64(*f)?),
            Self::String(s) | Self::Id(s) => ConstValue::String(s.clone()),
            Self::Boolean(b) => ConstValue::Boolean(*b),
            Self::Enum(s) => ConstValue::Enum(Name::new(s)),
            Self::Custom(_) => return None,
            Self::List(items) => ConstValue::List(
                items
                    .iter()
                    .map(CoercedValue::to_const)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Object(object) => ConstValue::Object(
                object
                    .iter()
                    .map(|(name, value)| Some((Name::new(name), value.to_const()?)))
                    .collect::<Option<_>>()?,
            ),
        })
    }
}

impl From<&str> for CoercedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CoercedValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for CoercedValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for CoercedValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// One field of an [`InputShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeField {
    pub name: String,
    /// Non-null without a default: must always be supplied.
    pub required: bool,
}

/// Field layout of an input object or of a directive's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputShape {
    type_name: String,
    fields: Vec<ShapeField>,
}

impl InputShape {
    pub fn new(type_name: impl Into<String>, fields: Vec<ShapeField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[ShapeField] {
        &self.fields
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Constructs a record from named values. Unknown names are rejected and
    /// every required field must be present.
    pub fn construct<I, K>(shape: &Arc<Self>, values: I) -> Result<InputObject, Vec<String>>
    where
        I: IntoIterator<Item = (K, CoercedValue)>,
        K: AsRef<str>,
    {
        let mut slots = vec![None; shape.fields.len()];
        let mut errors = Vec::new();
        for (name, value) in values {
            match shape.position(name.as_ref()) {
                Some(index) => slots[index] = Some(value),
                None => errors.push(format!(
                    "No field named `{}` on {}",
                    name.as_ref(),
                    shape.type_name
                )),
            }
        }
        for (field, slot) in shape.fields.iter().zip(&slots) {
            if field.required && slot.as_ref().is_none_or(CoercedValue::is_null) {
                errors.push(format!("No value for required field {}", field.name));
            }
        }
        if errors.is_empty() {
            Ok(InputObject {
                shape: Arc::clone(shape),
                values: slots,
            })
        } else {
            Err(errors)
        }
    }
}

/// A coerced input object or directive argument set.
///
/// Values are stored positionally in declaration order; fields that were
/// absent from the input (and had no default) read as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputObject {
    shape: Arc<InputShape>,
    values: Vec<Option<CoercedValue>>,
}

impl InputObject {
    pub fn type_name(&self) -> &str {
        self.shape.type_name()
    }

    pub fn shape(&self) -> &Arc<InputShape> {
        &self.shape
    }

    /// Value of the named field.
    pub fn get(&self, name: &str) -> Option<&CoercedValue> {
        self.shape
            .position(name)
            .and_then(|index| self.values[index].as_ref())
    }

    /// Value at the given declaration position.
    pub fn at(&self, index: usize) -> Option<&CoercedValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Whether the field was supplied (or defaulted) at all.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Present fields, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoercedValue)> {
        self.shape
            .fields
            .iter()
            .zip(&self.values)
            .filter_map(|(field, value)| value.as_ref().map(|v| (field.name.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coerced field arguments handed to a resolver method, keyed by parameter
/// name (the snake_case form of the argument name).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, CoercedValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, parameter: impl Into<String>, value: CoercedValue) {
        self.values.insert(parameter.into(), value);
    }

    pub fn get(&self, parameter: &str) -> Option<&CoercedValue> {
        self.values.get(parameter)
    }

    /// String argument, if present and textual.
    pub fn str(&self, parameter: &str) -> Option<&str> {
        self.get(parameter).and_then(CoercedValue::as_str)
    }

    pub fn object(&self, parameter: &str) -> Option<&InputObject> {
        self.get(parameter).and_then(CoercedValue::as_object)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoercedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_input() -> Arc<InputShape> {
        Arc::new(InputShape::new(
            "NameInput",
            vec![
                ShapeField {
                    name: "first".into(),
                    required: true,
                },
                ShapeField {
                    name: "last".into(),
                    required: false,
                },
            ],
        ))
    }

    #[test]
    fn test_construct_orders_by_declaration() {
        let object = InputShape::construct(
            &name_input(),
            [("last", "Petro".into()), ("first", "Adam".into())],
        )
        .unwrap();
        assert_eq!(object.at(0).and_then(CoercedValue::as_str), Some("Adam"));
        assert_eq!(object.get("last").and_then(CoercedValue::as_str), Some("Petro"));
        let names: Vec<_> = object.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first", "last"]);
    }

    #[test]
    fn test_construct_rejects_unknown_and_missing() {
        let errors = InputShape::construct(&name_input(), [("middle", CoercedValue::from("J"))])
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "No field named `middle` on NameInput".to_string(),
                "No value for required field first".to_string(),
            ]
        );
    }

    #[test]
    fn test_absent_optional_field_reads_as_none() {
        let object =
            InputShape::construct(&name_input(), [("first", CoercedValue::from("Adam"))]).unwrap();
        assert!(object.get("last").is_none());
        assert!(!object.contains("last"));
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn test_custom_scalar_downcast() {
        let value = CoercedValue::Custom(ScalarValue::new(42u64));
        assert_eq!(value.as_custom::<u64>(), Some(&42));
        assert_eq!(value.as_custom::<i32>(), None);
        assert_eq!(value.to_const(), None);
    }

    #[test]
    fn test_to_const_keeps_enums_symbolic() {
        let value = CoercedValue::List(vec![CoercedValue::Enum("RED".into()), 3.into()]);
        assert_eq!(
            value.to_const(),
            Some(ConstValue::List(vec![
                ConstValue::Enum(Name::new("RED")),
                ConstValue::Number(3.into()),
            ]))
        );
    }
}
