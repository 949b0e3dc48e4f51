//! Introspection types.
//!
//! `__Schema`, `__Type`, `__Field`, `__InputValue`, `__EnumValue`,
//! `__Directive`, `__TypeKind` and `__DirectiveLocation` are registered in
//! every [`TypeRegistry`](crate::TypeRegistry) as ordinary declarations, so
//! they are built lazily, take part in duplicate name detection and are
//! served by ordinary resolvers (see `resolvers::introspection`). The query
//! root receives `__schema` and `__type` fields.

use crate::definition::{
    DirectiveLocation, EnumValueDefinition, FieldDefinition, InputValueDefinition,
};
use crate::registry::{BuiltinHandles, EnumType, ObjectType, TypeDeclaration};
use crate::types::{BuiltinScalar, TypeHandle, TypeRef};

/// Names of the introspection types.
pub const TYPE_NAMES: [&str; 8] = [
    "__Schema",
    "__Type",
    "__Field",
    "__InputValue",
    "__EnumValue",
    "__Directive",
    "__TypeKind",
    "__DirectiveLocation",
];

pub fn is_introspection_type(name: &str) -> bool {
    TYPE_NAMES.contains(&name)
}

/// Introspection kind of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    pub const ALL: [TypeKind; 8] = [
        Self::Scalar,
        Self::Object,
        Self::Interface,
        Self::Union,
        Self::Enum,
        Self::InputObject,
        Self::List,
        Self::NonNull,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
            Self::List => "LIST",
            Self::NonNull => "NON_NULL",
        }
    }
}

fn string() -> TypeRef {
    TypeRef::optional(BuiltinScalar::String)
}

fn required_string() -> TypeRef {
    TypeRef::required(BuiltinScalar::String)
}

fn required_boolean() -> TypeRef {
    TypeRef::required(BuiltinScalar::Boolean)
}

fn list_of_required(handle: TypeHandle, required: bool) -> TypeRef {
    TypeRef::list_of(TypeRef::required(handle), required)
}

fn include_deprecated() -> InputValueDefinition {
    InputValueDefinition::new("includeDeprecated", TypeRef::optional(BuiltinScalar::Boolean))
        .with_default(async_graphql_value::ConstValue::Boolean(false))
}

/// Declarations for every introspection type.
pub(crate) fn declarations(b: &BuiltinHandles) -> Vec<(TypeHandle, TypeDeclaration)> {
    let b = *b;
    vec![
        (
            b.schema,
            ObjectType::new("__Schema")
                .with_description(
                    "A GraphQL Schema defines the capabilities of a GraphQL server. It exposes all available types and directives on the server, as well as the entry points for query, mutation, and subscription operations.",
                )
                .with_fields(move || {
                    Ok(vec![
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("types", list_of_required(b.type_, true))
                            .with_description("A list of all types supported by this server."),
                        FieldDefinition::new("queryType", TypeRef::required(b.type_))
                            .with_description("The type that query operations will be rooted at."),
                        FieldDefinition::new("mutationType", TypeRef::optional(b.type_))
                            .with_description("If this server supports mutation, the type that mutation operations will be rooted at."),
                        FieldDefinition::new("subscriptionType", TypeRef::optional(b.type_))
                            .with_description("If this server support subscription, the type that subscription operations will be rooted at."),
                        FieldDefinition::new("directives", list_of_required(b.directive, true))
                            .with_description("A list of all directives supported by this server."),
                    ])
                })
                .into(),
        ),
        (
            b.type_,
            ObjectType::new("__Type")
                .with_description(
                    "The fundamental unit of any GraphQL Schema is the type. There are many kinds of types in GraphQL as represented by the `__TypeKind` enum.",
                )
                .with_fields(move || {
                    Ok(vec![
                        FieldDefinition::new("kind", TypeRef::required(b.type_kind)),
                        FieldDefinition::new("name", string()),
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("specifiedByURL", string()),
                        FieldDefinition::new("fields", list_of_required(b.field, false))
                            .with_argument(include_deprecated()),
                        FieldDefinition::new("interfaces", list_of_required(b.type_, false)),
                        FieldDefinition::new("possibleTypes", list_of_required(b.type_, false)),
                        FieldDefinition::new("enumValues", list_of_required(b.enum_value, false))
                            .with_argument(include_deprecated()),
                        FieldDefinition::new("inputFields", list_of_required(b.input_value, false))
                            .with_argument(include_deprecated()),
                        FieldDefinition::new("ofType", TypeRef::optional(b.type_)),
                    ])
                })
                .into(),
        ),
        (
            b.field,
            ObjectType::new("__Field")
                .with_description(
                    "Object and Interface types are described by a list of Fields, each of which has a name, potentially a list of arguments, and a return type.",
                )
                .with_fields(move || {
                    Ok(vec![
                        FieldDefinition::new("name", required_string()),
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("args", list_of_required(b.input_value, true))
                            .with_argument(include_deprecated()),
                        FieldDefinition::new("type", TypeRef::required(b.type_)),
                        FieldDefinition::new("isDeprecated", required_boolean()),
                        FieldDefinition::new("deprecationReason", string()),
                    ])
                })
                .into(),
        ),
        (
            b.input_value,
            ObjectType::new("__InputValue")
                .with_description(
                    "Arguments provided to Fields or Directives and the input fields of an InputObject are represented as Input Values which describe their type and optionally a default value.",
                )
                .with_fields(move || {
                    Ok(vec![
                        FieldDefinition::new("name", required_string()),
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("type", TypeRef::required(b.type_)),
                        FieldDefinition::new("defaultValue", string()).with_description(
                            "A GraphQL-formatted string representing the default value for this input value.",
                        ),
                        FieldDefinition::new("isDeprecated", required_boolean()),
                        FieldDefinition::new("deprecationReason", string()),
                    ])
                })
                .into(),
        ),
        (
            b.enum_value,
            ObjectType::new("__EnumValue")
                .with_description(
                    "One possible value for a given Enum. Enum values are unique values, not a placeholder for a string or numeric value. However an Enum value is returned in a JSON response as a string.",
                )
                .with_fields(|| {
                    Ok(vec![
                        FieldDefinition::new("name", required_string()),
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("isDeprecated", required_boolean()),
                        FieldDefinition::new("deprecationReason", string()),
                    ])
                })
                .into(),
        ),
        (
            b.directive,
            ObjectType::new("__Directive")
                .with_description(
                    "A Directive provides a way to describe alternate runtime execution and type validation behavior in a GraphQL document.",
                )
                .with_fields(move || {
                    Ok(vec![
                        FieldDefinition::new("name", required_string()),
                        FieldDefinition::new("description", string()),
                        FieldDefinition::new("isRepeatable", required_boolean()),
                        FieldDefinition::new(
                            "locations",
                            list_of_required(b.directive_location, true),
                        ),
                        FieldDefinition::new("args", list_of_required(b.input_value, true))
                            .with_argument(include_deprecated()),
                    ])
                })
                .into(),
        ),
        (
            b.type_kind,
            EnumType::new("__TypeKind")
                .with_description("An enum describing what kind of type a given `__Type` is.")
                .with_values(|| {
                    Ok(TypeKind::ALL
                        .iter()
                        .map(|kind| EnumValueDefinition::new(kind.as_str()))
                        .collect())
                })
                .into(),
        ),
        (
            b.directive_location,
            EnumType::new("__DirectiveLocation")
                .with_description(
                    "A Directive can be adjacent to many parts of the GraphQL language, a __DirectiveLocation describes one such possible adjacencies.",
                )
                .with_values(|| {
                    Ok(DirectiveLocation::ALL
                        .iter()
                        .map(|location| EnumValueDefinition::new(location.as_str()))
                        .collect())
                })
                .into(),
        ),
    ]
}

/// `__schema` and `__type` fields of the query root.
pub(crate) fn root_fields(b: &BuiltinHandles) -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("__schema", TypeRef::required(b.schema))
            .with_description("Access the current type schema of this server."),
        FieldDefinition::new("__type", TypeRef::optional(b.type_))
            .with_description("Request the type information of a single type.")
            .with_argument(InputValueDefinition::new("name", required_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;

    #[test]
    fn test_every_introspection_type_is_declared() {
        let registry = TypeRegistry::new();
        let names: Vec<_> = registry
            .builtins()
            .introspection_types()
            .iter()
            .filter_map(|h| registry.declaration(*h).map(|d| d.name().to_string()))
            .collect();
        assert_eq!(names, TYPE_NAMES.to_vec());
    }

    #[test]
    fn test_root_fields() {
        let registry = TypeRegistry::new();
        let fields = root_fields(registry.builtins());
        assert_eq!(fields[0].name(), "__schema");
        assert!(fields[0].ty().is_required());
        assert_eq!(fields[1].argument("name").map(|a| a.ty().is_required()), Some(true));
        assert!(fields.iter().all(FieldDefinition::is_meta));
    }
}
