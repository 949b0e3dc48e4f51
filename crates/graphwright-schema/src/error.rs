//! Error types for schema construction and request handling.
//!
//! Build-time errors ([`SchemaError`]) are fatal to the schema build that
//! raised them. Request-time errors ([`CoercionError`], [`FieldError`],
//! [`ValidationError`], [`ExecutionError`]) are always returned as values and
//! collected into the response.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Error type raised by host code: member declarations and visibility
/// predicates. It is carried through unchanged so callers can downcast it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort the construction of a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A default value did not coerce against its declared type.
    #[error(
        "Invalid default value `{value}` on input value definition `{name}`. Errors:\n{}",
        join_messages(errors)
    )]
    DefaultValue {
        /// Name of the argument or input field owning the default.
        name: String,
        /// The default value, printed as a literal.
        value: String,
        /// Every coercion error reported for the value.
        errors: Vec<CoercionError>,
    },

    /// Two distinct declarations share a public name.
    #[error(
        "GraphQL {what} name `{name}` is used in multiple classes: {}",
        identities.join(" and ")
    )]
    NonUniqueName {
        /// `type` or `directive`.
        what: &'static str,
        /// The colliding public name.
        name: String,
        /// Identities of the colliding declarations.
        identities: Vec<String>,
    },

    /// A definition was requested again while it was still being built.
    #[error("Definition of `{identity}` was requested recursively while it was being built")]
    BuildCycle {
        /// Identity of the declaration being built.
        identity: String,
    },

    /// An object or interface lists a non-interface type as implemented.
    #[error("`{identity}` implements `{interface}`, which is not an interface type")]
    NotAnInterface {
        /// The implementing declaration.
        identity: String,
        /// The declaration listed as an interface.
        interface: String,
    },

    /// A handle pointed at a declaration of the wrong kind for its position.
    #[error("`{identity}` is used as {expected} but is declared as {found}")]
    WrongKind {
        /// The referenced declaration.
        identity: String,
        /// Kind required at the use site.
        expected: &'static str,
        /// Kind of the declaration.
        found: &'static str,
    },

    /// A directive application carried arguments that do not coerce.
    #[error(
        "Invalid arguments for directive `@{directive}` on {location}. Errors:\n{}",
        join_messages(errors)
    )]
    InvalidDirectiveArguments {
        /// Directive name.
        directive: String,
        /// Schema element carrying the application.
        location: String,
        /// Coercion errors for the arguments.
        errors: Vec<CoercionError>,
    },

    /// A directive was applied to an element its definition does not allow.
    #[error("Directive `@{directive}` may not be used on {location}")]
    MisplacedDirective {
        /// Directive name.
        directive: String,
        /// Schema element carrying the application.
        location: String,
    },

    /// A type declared two members with the same name.
    #[error("`{identity}` declares `{member}` more than once")]
    DuplicateMember {
        /// The declaring type.
        identity: String,
        /// The repeated member name.
        member: String,
    },

    /// A handle was reserved but no declaration was ever installed for it.
    #[error("`{identity}` was reserved but never defined")]
    UndefinedHandle {
        /// Identity given at reservation time.
        identity: String,
    },

    /// A declaration was installed for a handle the registry never reserved.
    #[error("Handle {handle} was not reserved by this registry, which holds {reserved} handles")]
    UnknownHandle {
        /// Index of the offending handle.
        handle: usize,
        /// Number of handles the registry holds.
        reserved: usize,
    },

    /// The configuration failed validation.
    #[error("Invalid schema configuration: {0}")]
    Config(String),

    /// A host member declaration failed. The original error is kept as is.
    #[error(transparent)]
    Declaration(BoxError),

    /// A visibility predicate failed. The original error is kept as is.
    #[error(transparent)]
    Visibility(BoxError),
}

fn join_messages(errors: &[CoercionError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A segment of a path into an input value or a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A named field or argument.
    Field(String),
    /// A list index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Field(value.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// A single input coercion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoercionError {
    /// Human readable description.
    pub message: String,
    /// Location of the offending value inside the coerced input.
    pub path: Vec<PathSegment>,
}

impl CoercionError {
    /// Creates an error at the given path.
    pub fn new(message: impl Into<String>, path: Vec<PathSegment>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }
}

/// Error returned by a resolver method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    /// Message reported in the response.
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<CoercionError> for FieldError {
    fn from(err: CoercionError) -> Self {
        Self::new(err.message)
    }
}

/// Result type for resolver methods.
pub type FieldResult<T> = Result<T, FieldError>;

/// Position in a query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<async_graphql_parser::Pos> for Location {
    fn from(pos: async_graphql_parser::Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// A query validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, locations: Vec<Location>) -> Self {
        Self {
            message: message.into(),
            locations,
        }
    }
}

/// An error in an execution result, shaped like a GraphQL response error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

impl From<ValidationError> for ExecutionError {
    fn from(err: ValidationError) -> Self {
        Self::new(err.message).with_locations(err.locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_message() {
        let err = SchemaError::DefaultValue {
            name: "myArgumentWithInvalidDefaultValue".into(),
            value: "1".into(),
            errors: vec![CoercionError::new(
                "No implicit conversion of integer to String",
                vec![],
            )],
        };
        assert_eq!(
            err.to_string(),
            "Invalid default value `1` on input value definition `myArgumentWithInvalidDefaultValue`. Errors:\nNo implicit conversion of integer to String"
        );
    }

    #[test]
    fn test_non_unique_name_message() {
        let err = SchemaError::NonUniqueName {
            what: "type",
            name: "Int".into(),
            identities: vec!["A".into(), "B".into()],
        };
        assert_eq!(
            err.to_string(),
            "GraphQL type name `Int` is used in multiple classes: A and B"
        );
    }

    #[test]
    fn test_declaration_error_is_transparent() {
        let host: BoxError = "boom".into();
        let err = SchemaError::Declaration(host);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_execution_error_serialization() {
        let err = ExecutionError::new("oops")
            .with_path(vec!["teams".into(), 0.into(), "name".into()])
            .with_locations(vec![Location { line: 1, column: 3 }]);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "oops",
                "locations": [{"line": 1, "column": 3}],
                "path": ["teams", 0, "name"]
            })
        );
    }

    #[test]
    fn test_empty_path_is_omitted() {
        let json = serde_json::to_value(ExecutionError::new("x")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "x"}));
    }
}
