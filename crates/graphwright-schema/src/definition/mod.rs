//! Definition value objects.

mod field;
mod types;

pub use field::{
    DirectiveApplication, EnumValueDefinition, FieldDefinition, InputValueDefinition,
    resolver_method_name, snake_case,
};
pub use types::{
    CustomScalarTypeDefinition, Definition, DefinitionHeader, DefinitionKind,
    DirectiveDefinition, DirectiveLocation, EnumTypeDefinition, InputObjectTypeDefinition,
    InterfaceTypeDefinition, ObjectTypeDefinition, SchemaDeclaration, SchemaDefinition,
    UnionTypeDefinition,
};
