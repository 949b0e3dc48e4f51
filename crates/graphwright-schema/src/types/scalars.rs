//! Builtin scalar types.
//!
//! `Int`, `Float`, `String`, `Boolean` and `ID` are always part of a schema.
//! Input coercion follows the strict rules of the query language: no
//! implicit conversions between kinds, 32-bit signed integers, finite floats.

use async_graphql_value::{ConstValue, Number};

use crate::coercion::Leaf;
use crate::types::value::CoercedValue;

/// The builtin scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinScalar {
    Int,
    Float,
    String,
    Boolean,
    Id,
}

impl BuiltinScalar {
    /// All builtin scalars, in the order they are registered.
    pub const ALL: [BuiltinScalar; 5] = [
        Self::Int,
        Self::Float,
        Self::String,
        Self::Boolean,
        Self::Id,
    ];

    /// Public name of the scalar.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Int => {
                "The `Int` scalar type represents non-fractional signed whole numeric values. Int can represent values between -(2^31) and 2^31 - 1."
            }
            Self::Float => {
                "The `Float` scalar type represents signed double-precision fractional values as specified by [IEEE 754](https://en.wikipedia.org/wiki/IEEE_floating_point)."
            }
            Self::String => {
                "The `String` scalar type represents textual data, represented as UTF-8 character sequences. The String type is most often used by GraphQL to represent free-form human-readable text."
            }
            Self::Boolean => "The `Boolean` scalar type represents `true` or `false`.",
            Self::Id => {
                "The `ID` scalar type represents a unique identifier, often used to refetch an object or as key for a cache. The ID type appears in a JSON response as a String; however, it is not intended to be human-readable. When expected as an input type, any string (such as `\"4\"`) or integer (such as `4`) input value will be accepted as an ID."
            }
        }
    }

    /// Name used in conversion error messages. Host-provided values are
    /// reported against `integer` rather than `Int`.
    fn conversion_target(self, const_input: bool) -> &'static str {
        match self {
            Self::Int if const_input => "integer",
            other => other.name(),
        }
    }

    /// Coerces an input leaf. `const_input` relaxes `String` to also accept
    /// enum (symbolic) values, which only host-provided values can carry.
    pub(crate) fn coerce_input(
        self,
        leaf: &Leaf<'_>,
        const_input: bool,
    ) -> Result<CoercedValue, String> {
        let coerced = match (self, leaf) {
            (Self::Int, Leaf::Int(n)) => match i32::try_from(*n) {
                Ok(n) => Some(CoercedValue::Int(n)),
                Err(_) => return Err("Integer values must fit within 32 bits signed".into()),
            },
            (Self::Float, Leaf::Int(n)) => Some(CoercedValue::Float(*n as f64)),
            (Self::Float, Leaf::Float(f)) => {
                if !f.is_finite() {
                    return Err("Float values must be finite".into());
                }
                Some(CoercedValue::Float(*f))
            }
            (Self::String, Leaf::String(s)) => Some(CoercedValue::String((*s).to_string())),
            (Self::String, Leaf::Enum(s)) if const_input => {
                Some(CoercedValue::String((*s).to_string()))
            }
            (Self::Boolean, Leaf::Boolean(b)) => Some(CoercedValue::Boolean(*b)),
            (Self::Id, Leaf::String(s)) => Some(CoercedValue::Id((*s).to_string())),
            (Self::Id, Leaf::Int(n)) => Some(CoercedValue::Id(n.to_string())),
            _ => None,
        };
        coerced.ok_or_else(|| {
            format!(
                "No implicit conversion of {} to {}",
                leaf.public_name(),
                self.conversion_target(const_input)
            )
        })
    }

    /// Coerces a resolved value into its serialized form.
    pub(crate) fn coerce_result(self, value: &ConstValue) -> Result<ConstValue, String> {
        let coerced = match (self, value) {
            (Self::Int, ConstValue::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| ConstValue::Number(Number::from(n))),
            (Self::Float, ConstValue::Number(n)) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(ConstValue::Number),
            (Self::String, ConstValue::String(s)) => Some(ConstValue::String(s.clone())),
            (Self::String, ConstValue::Enum(name)) => Some(ConstValue::String(name.to_string())),
            (Self::Boolean, ConstValue::Boolean(b)) => Some(ConstValue::Boolean(*b)),
            (Self::Id, ConstValue::String(s)) => Some(ConstValue::String(s.clone())),
            (Self::Id, ConstValue::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(ConstValue::String(n.to_string()))
            }
            _ => None,
        };
        coerced.ok_or_else(|| {
            format!(
                "{} cannot represent value: {}",
                self.name(),
                crate::sdl::print_value(value)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scalar in BuiltinScalar::ALL {
            assert_eq!(BuiltinScalar::from_name(scalar.name()), Some(scalar));
        }
        assert_eq!(BuiltinScalar::from_name("Date"), None);
    }

    #[test]
    fn test_int_bounds() {
        assert_eq!(
            BuiltinScalar::Int.coerce_input(&Leaf::Int(42), false),
            Ok(CoercedValue::Int(42))
        );
        assert_eq!(
            BuiltinScalar::Int.coerce_input(&Leaf::Int(i64::from(i32::MAX) + 1), false),
            Err("Integer values must fit within 32 bits signed".to_string())
        );
        assert_eq!(
            BuiltinScalar::Int.coerce_input(&Leaf::Float(1.5), false),
            Err("No implicit conversion of float to Int".to_string())
        );
        assert_eq!(
            BuiltinScalar::Int.coerce_input(&Leaf::Float(1.5), true),
            Err("No implicit conversion of float to integer".to_string())
        );
    }

    #[test]
    fn test_string_rejects_integer() {
        assert_eq!(
            BuiltinScalar::String.coerce_input(&Leaf::Int(1), false),
            Err("No implicit conversion of integer to String".to_string())
        );
    }

    #[test]
    fn test_string_accepts_symbol_only_for_const_input() {
        assert_eq!(
            BuiltinScalar::String.coerce_input(&Leaf::Enum("a_symbol"), true),
            Ok(CoercedValue::String("a_symbol".into()))
        );
        assert!(
            BuiltinScalar::String
                .coerce_input(&Leaf::Enum("a_symbol"), false)
                .is_err()
        );
    }

    #[test]
    fn test_float_accepts_integer_and_rejects_infinity() {
        assert_eq!(
            BuiltinScalar::Float.coerce_input(&Leaf::Int(2), false),
            Ok(CoercedValue::Float(2.0))
        );
        assert_eq!(
            BuiltinScalar::Float.coerce_input(&Leaf::Float(f64::INFINITY), false),
            Err("Float values must be finite".to_string())
        );
    }

    #[test]
    fn test_id_accepts_integer() {
        assert_eq!(
            BuiltinScalar::Id.coerce_input(&Leaf::Int(4), false),
            Ok(CoercedValue::Id("4".into()))
        );
        assert_eq!(
            BuiltinScalar::Id.coerce_input(&Leaf::Boolean(true), false),
            Err("No implicit conversion of boolean to ID".to_string())
        );
    }

    #[test]
    fn test_result_coercion() {
        assert_eq!(
            BuiltinScalar::Id.coerce_result(&ConstValue::Number(7.into())),
            Ok(ConstValue::String("7".into()))
        );
        assert!(
            BuiltinScalar::Int
                .coerce_result(&ConstValue::String("x".into()))
                .is_err()
        );
    }
}
