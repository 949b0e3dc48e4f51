//! Owned, name-indexed view of an SDL document.
//!
//! The parser's document keeps definitions in source order with positions.
//! Comparison wants them by name, with extensions folded into the types
//! they extend and deprecations pulled out of the directive lists.

use async_graphql_parser::Positioned;
use async_graphql_parser::types::{
    ConstDirective, DirectiveDefinition, EnumValueDefinition, FieldDefinition,
    InputValueDefinition, ServiceDocument, Type, TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::error::{CompareError, Side};

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

#[derive(Debug, Clone)]
pub(crate) struct SchemaModel {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
    pub types: IndexMap<String, TypeModel>,
    pub directives: IndexMap<String, DirectiveModel>,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeModel {
    pub name: String,
    pub description: Option<String>,
    pub shape: Shape,
}

#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Scalar,
    Object(Composite),
    Interface(Composite),
    Union(Vec<String>),
    Enum(IndexMap<String, EnumValueModel>),
    InputObject(IndexMap<String, InputValueModel>),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object(_) => "object",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::InputObject(_) => "input object",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Composite {
    pub interfaces: Vec<String>,
    pub fields: IndexMap<String, FieldModel>,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldModel {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub arguments: IndexMap<String, InputValueModel>,
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct InputValueModel {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default: Option<ConstValue>,
    pub deprecation: Option<String>,
}

impl InputValueModel {
    /// Non-null without a default: callers must supply it.
    pub fn is_required(&self) -> bool {
        !self.ty.nullable && self.default.is_none()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EnumValueModel {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DirectiveModel {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputValueModel>,
    pub locations: Vec<String>,
    pub repeatable: bool,
}

impl SchemaModel {
    /// Parses `sdl` and indexes its definitions by name.
    pub fn parse(sdl: &str, side: Side) -> Result<Self, CompareError> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|e| CompareError::Parse {
            side,
            message: e.to_string(),
        })?;
        Self::from_document(&document, side)
    }

    fn from_document(document: &ServiceDocument, side: Side) -> Result<Self, CompareError> {
        let mut model = Self {
            query: None,
            mutation: None,
            subscription: None,
            types: IndexMap::new(),
            directives: IndexMap::new(),
        };

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = &schema.node;
                    if let Some(query) = &schema.query {
                        model.query = Some(query.node.to_string());
                    }
                    if let Some(mutation) = &schema.mutation {
                        model.mutation = Some(mutation.node.to_string());
                    }
                    if let Some(subscription) = &schema.subscription {
                        model.subscription = Some(subscription.node.to_string());
                    }
                }
                TypeSystemDefinition::Type(ty) => model.add_type(&ty.node, side)?,
                TypeSystemDefinition::Directive(directive) => {
                    let directive = directive_model(&directive.node);
                    if model.directives.contains_key(&directive.name) {
                        return Err(CompareError::Duplicate {
                            side,
                            name: format!("@{}", directive.name),
                        });
                    }
                    model.directives.insert(directive.name.clone(), directive);
                }
            }
        }

        // Without a schema block the conventional root names apply.
        if model.query.is_none() && model.types.contains_key("Query") {
            model.query = Some("Query".to_string());
        }
        if model.mutation.is_none() && model.types.contains_key("Mutation") {
            model.mutation = Some("Mutation".to_string());
        }
        if model.subscription.is_none() && model.types.contains_key("Subscription") {
            model.subscription = Some("Subscription".to_string());
        }
        Ok(model)
    }

    fn add_type(&mut self, definition: &TypeDefinition, side: Side) -> Result<(), CompareError> {
        let name = definition.name.node.to_string();
        let shape = shape(&definition.kind);

        if definition.extend {
            if let Some(existing) = self.types.get_mut(&name) {
                merge(&mut existing.shape, shape);
                return Ok(());
            }
        } else if self.types.contains_key(&name) {
            return Err(CompareError::Duplicate { side, name });
        }

        self.types.insert(
            name.clone(),
            TypeModel {
                name,
                description: description(&definition.description),
                shape,
            },
        );
        Ok(())
    }
}

/// Folds the members of an extension into the extended type. Extensions of
/// a different kind are ignored.
fn merge(target: &mut Shape, extension: Shape) {
    match (target, extension) {
        (Shape::Object(target), Shape::Object(extension))
        | (Shape::Interface(target), Shape::Interface(extension)) => {
            for interface in extension.interfaces {
                if !target.interfaces.contains(&interface) {
                    target.interfaces.push(interface);
                }
            }
            target.fields.extend(extension.fields);
        }
        (Shape::Union(target), Shape::Union(extension)) => {
            for member in extension {
                if !target.contains(&member) {
                    target.push(member);
                }
            }
        }
        (Shape::Enum(target), Shape::Enum(extension)) => target.extend(extension),
        (Shape::InputObject(target), Shape::InputObject(extension)) => target.extend(extension),
        _ => {}
    }
}

fn shape(kind: &TypeKind) -> Shape {
    match kind {
        TypeKind::Scalar => Shape::Scalar,
        TypeKind::Object(object) => Shape::Object(Composite {
            interfaces: names(&object.implements),
            fields: fields(&object.fields),
        }),
        TypeKind::Interface(interface) => Shape::Interface(Composite {
            interfaces: names(&interface.implements),
            fields: fields(&interface.fields),
        }),
        TypeKind::Union(union) => Shape::Union(names(&union.members)),
        TypeKind::Enum(enum_type) => Shape::Enum(
            enum_type
                .values
                .iter()
                .map(|value| {
                    let value = enum_value_model(&value.node);
                    (value.name.clone(), value)
                })
                .collect(),
        ),
        TypeKind::InputObject(input) => Shape::InputObject(input_values(&input.fields)),
    }
}

fn names(names: &[Positioned<async_graphql_value::Name>]) -> Vec<String> {
    names.iter().map(|name| name.node.to_string()).collect()
}

fn description(description: &Option<Positioned<String>>) -> Option<String> {
    description.as_ref().map(|d| d.node.clone())
}

fn deprecation(directives: &[Positioned<ConstDirective>]) -> Option<String> {
    let directive = directives
        .iter()
        .find(|d| d.node.name.node.as_str() == "deprecated")?;
    let reason = directive
        .node
        .arguments
        .iter()
        .find(|(name, _)| name.node.as_str() == "reason")
        .and_then(|(_, value)| match &value.node {
            ConstValue::String(reason) => Some(reason.clone()),
            _ => None,
        });
    Some(reason.unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string()))
}

fn fields(fields: &[Positioned<FieldDefinition>]) -> IndexMap<String, FieldModel> {
    fields
        .iter()
        .map(|field| {
            let field = &field.node;
            let model = FieldModel {
                name: field.name.node.to_string(),
                description: description(&field.description),
                ty: field.ty.node.clone(),
                arguments: input_values(&field.arguments),
                deprecation: deprecation(&field.directives),
            };
            (model.name.clone(), model)
        })
        .collect()
}

fn input_values(values: &[Positioned<InputValueDefinition>]) -> IndexMap<String, InputValueModel> {
    values
        .iter()
        .map(|value| {
            let value = &value.node;
            let model = InputValueModel {
                name: value.name.node.to_string(),
                description: description(&value.description),
                ty: value.ty.node.clone(),
                default: value.default_value.as_ref().map(|d| d.node.clone()),
                deprecation: deprecation(&value.directives),
            };
            (model.name.clone(), model)
        })
        .collect()
}

fn enum_value_model(value: &EnumValueDefinition) -> EnumValueModel {
    EnumValueModel {
        name: value.value.node.to_string(),
        description: description(&value.description),
        deprecation: deprecation(&value.directives),
    }
}

fn directive_model(directive: &DirectiveDefinition) -> DirectiveModel {
    DirectiveModel {
        name: directive.name.node.to_string(),
        description: description(&directive.description),
        arguments: input_values(&directive.arguments),
        locations: directive
            .locations
            .iter()
            .map(|location| location_name(&location.node))
            .collect(),
        repeatable: directive.is_repeatable,
    }
}

/// `FieldDefinition` -> `FIELD_DEFINITION`.
fn location_name(location: &impl std::fmt::Debug) -> String {
    let debug = format!("{location:?}");
    let mut out = String::with_capacity(debug.len() + 4);
    for (i, c) in debug.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_name() {
        #[derive(Debug)]
        enum Location {
            FieldDefinition,
            Query,
        }
        assert_eq!(location_name(&Location::FieldDefinition), "FIELD_DEFINITION");
        assert_eq!(location_name(&Location::Query), "QUERY");
    }

    #[test]
    fn test_parse_indexes_by_name() {
        let model = SchemaModel::parse(
            r#"
            type Query { teams: [Team!]! }
            type Team { name: String! old: String @deprecated }
            enum Color { RED GREEN @deprecated(reason: "Use RED") }
            directive @tag(name: String!) repeatable on FIELD_DEFINITION | OBJECT
            "#,
            Side::Old,
        )
        .unwrap();

        assert_eq!(model.query.as_deref(), Some("Query"));
        assert!(model.mutation.is_none());

        let Shape::Object(team) = &model.types["Team"].shape else {
            panic!("Team should be an object");
        };
        assert_eq!(team.fields["old"].deprecation.as_deref(), Some("No longer supported"));
        assert_eq!(team.fields["name"].ty.to_string(), "String!");

        let Shape::Enum(values) = &model.types["Color"].shape else {
            panic!("Color should be an enum");
        };
        assert_eq!(values["GREEN"].deprecation.as_deref(), Some("Use RED"));

        let tag = &model.directives["tag"];
        assert!(tag.repeatable);
        assert_eq!(tag.locations, vec!["FIELD_DEFINITION", "OBJECT"]);
        assert!(tag.arguments["name"].is_required());
    }

    #[test]
    fn test_extensions_are_merged() {
        let model = SchemaModel::parse(
            "type Query { a: Int }\nextend type Query { b: Int }",
            Side::New,
        )
        .unwrap();
        let Shape::Object(query) = &model.types["Query"].shape else {
            panic!("Query should be an object");
        };
        assert_eq!(query.fields.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_definitions_are_rejected() {
        let err = SchemaModel::parse("type A { a: Int }\ntype A { b: Int }", Side::Old).unwrap_err();
        assert_eq!(err.to_string(), "The old schema defines `A` more than once");
    }

    #[test]
    fn test_explicit_roots() {
        let model = SchemaModel::parse(
            "schema { query: Root }\ntype Root { a: Int }\ntype Query { b: Int }",
            Side::Old,
        )
        .unwrap();
        assert_eq!(model.query.as_deref(), Some("Root"));
    }
}
