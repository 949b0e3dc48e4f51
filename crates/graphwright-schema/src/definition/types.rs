//! Built type definitions.
//!
//! These are the immutable records produced by the
//! [`DefinitionBuilder`](crate::schema::DefinitionBuilder), one per declared
//! type. Members refer to other types through [`TypeRef`](crate::TypeRef)
//! handles, never through expanded definitions.

use std::fmt;
use std::sync::Arc;

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use super::field::{DirectiveApplication, EnumValueDefinition, FieldDefinition, InputValueDefinition};
use crate::registry::ScalarCoercion;
use crate::schema::contract::CapabilityContract;
use crate::types::{InputShape, ScalarValue, TypeHandle};
use crate::visibility::VisibilityHandle;

/// Kinds of declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Object,
    Interface,
    InputObject,
    Union,
    Enum,
    Scalar,
    Directive,
}

impl DefinitionKind {
    /// Phrase used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Object => "an object type",
            Self::Interface => "an interface type",
            Self::InputObject => "an input object type",
            Self::Union => "a union type",
            Self::Enum => "an enum type",
            Self::Scalar => "a scalar type",
            Self::Directive => "a directive",
        }
    }

    /// Valid as an argument or input field type.
    pub fn is_input(self) -> bool {
        matches!(self, Self::InputObject | Self::Enum | Self::Scalar)
    }

    /// Valid as a field type.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::Object | Self::Interface | Self::Union | Self::Enum | Self::Scalar
        )
    }

    /// Has a selection set.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }
}

/// Common header of every built definition.
#[derive(Debug, Clone)]
pub struct DefinitionHeader {
    pub handle: TypeHandle,
    /// Host identity the declaration was registered under.
    pub identity: String,
    /// Public name.
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveApplication>,
    pub visibility: Option<VisibilityHandle>,
}

#[derive(Debug)]
pub struct ObjectTypeDefinition {
    pub header: DefinitionHeader,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<TypeHandle>,
    pub contract: CapabilityContract,
}

#[derive(Debug)]
pub struct InterfaceTypeDefinition {
    pub header: DefinitionHeader,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<TypeHandle>,
    pub contract: CapabilityContract,
}

#[derive(Debug)]
pub struct InputObjectTypeDefinition {
    pub header: DefinitionHeader,
    pub fields: IndexMap<String, InputValueDefinition>,
    /// Record layout of coerced values of this type.
    pub shape: Arc<InputShape>,
}

#[derive(Debug)]
pub struct UnionTypeDefinition {
    pub header: DefinitionHeader,
    pub members: Vec<TypeHandle>,
}

#[derive(Debug)]
pub struct EnumTypeDefinition {
    pub header: DefinitionHeader,
    pub values: IndexMap<String, EnumValueDefinition>,
}

pub struct CustomScalarTypeDefinition {
    pub header: DefinitionHeader,
    pub specified_by_url: Option<String>,
    pub(crate) coercion: Arc<dyn ScalarCoercion>,
}

impl CustomScalarTypeDefinition {
    /// Runs the scalar's input coercion.
    pub fn coerce_input(&self, value: &ConstValue) -> Result<ScalarValue, String> {
        self.coercion.coerce_input(value)
    }

    /// Runs the scalar's result coercion.
    pub fn coerce_result(&self, value: &ScalarValue) -> Result<ConstValue, String> {
        self.coercion.coerce_result(value)
    }
}

impl fmt::Debug for CustomScalarTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomScalarTypeDefinition")
            .field("header", &self.header)
            .field("specified_by_url", &self.specified_by_url)
            .finish_non_exhaustive()
    }
}

/// Where a directive may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub const ALL: [DirectiveLocation; 19] = [
        Self::Query,
        Self::Mutation,
        Self::Subscription,
        Self::Field,
        Self::FragmentDefinition,
        Self::FragmentSpread,
        Self::InlineFragment,
        Self::VariableDefinition,
        Self::Schema,
        Self::Scalar,
        Self::Object,
        Self::FieldDefinition,
        Self::ArgumentDefinition,
        Self::Interface,
        Self::Union,
        Self::Enum,
        Self::EnumValue,
        Self::InputObject,
        Self::InputFieldDefinition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

#[derive(Debug)]
pub struct DirectiveDefinition {
    pub header: DefinitionHeader,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
    /// Record layout of coerced applications.
    pub shape: Arc<InputShape>,
}

/// A built definition of any kind. Cloning is cheap and preserves identity.
#[derive(Debug, Clone)]
pub enum Definition {
    Object(Arc<ObjectTypeDefinition>),
    Interface(Arc<InterfaceTypeDefinition>),
    InputObject(Arc<InputObjectTypeDefinition>),
    Union(Arc<UnionTypeDefinition>),
    Enum(Arc<EnumTypeDefinition>),
    Scalar(Arc<CustomScalarTypeDefinition>),
    Directive(Arc<DirectiveDefinition>),
}

impl Definition {
    pub fn header(&self) -> &DefinitionHeader {
        match self {
            Self::Object(d) => &d.header,
            Self::Interface(d) => &d.header,
            Self::InputObject(d) => &d.header,
            Self::Union(d) => &d.header,
            Self::Enum(d) => &d.header,
            Self::Scalar(d) => &d.header,
            Self::Directive(d) => &d.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn identity(&self) -> &str {
        &self.header().identity
    }

    pub fn handle(&self) -> TypeHandle {
        self.header().handle
    }

    pub fn kind(&self) -> DefinitionKind {
        match self {
            Self::Object(_) => DefinitionKind::Object,
            Self::Interface(_) => DefinitionKind::Interface,
            Self::InputObject(_) => DefinitionKind::InputObject,
            Self::Union(_) => DefinitionKind::Union,
            Self::Enum(_) => DefinitionKind::Enum,
            Self::Scalar(_) => DefinitionKind::Scalar,
            Self::Directive(_) => DefinitionKind::Directive,
        }
    }

    /// Reference equality: both values are the same built definition.
    pub fn ptr_eq(&self, other: &Definition) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Interface(a), Self::Interface(b)) => Arc::ptr_eq(a, b),
            (Self::InputObject(a), Self::InputObject(b)) => Arc::ptr_eq(a, b),
            (Self::Union(a), Self::Union(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            (Self::Scalar(a), Self::Scalar(b)) => Arc::ptr_eq(a, b),
            (Self::Directive(a), Self::Directive(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Fields of an object or interface.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            Self::Object(d) => Some(&d.fields),
            Self::Interface(d) => Some(&d.fields),
            _ => None,
        }
    }

    /// Interfaces implemented by an object or interface.
    pub fn interfaces(&self) -> &[TypeHandle] {
        match self {
            Self::Object(d) => &d.interfaces,
            Self::Interface(d) => &d.interfaces,
            _ => &[],
        }
    }

    /// Capability contract of an object or interface.
    pub fn contract(&self) -> Option<&CapabilityContract> {
        match self {
            Self::Object(d) => Some(&d.contract),
            Self::Interface(d) => Some(&d.contract),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectTypeDefinition>> {
        match self {
            Self::Object(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&Arc<InputObjectTypeDefinition>> {
        match self {
            Self::InputObject(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumTypeDefinition>> {
        match self {
            Self::Enum(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Arc<DirectiveDefinition>> {
        match self {
            Self::Directive(d) => Some(d),
            _ => None,
        }
    }
}

/// Host declaration of the schema roots.
#[derive(Debug, Clone)]
pub struct SchemaDeclaration {
    pub(crate) query: TypeHandle,
    pub(crate) mutation: Option<TypeHandle>,
    pub(crate) description: Option<String>,
    pub(crate) directives: Vec<DirectiveApplication>,
}

impl SchemaDeclaration {
    pub fn new(query: TypeHandle) -> Self {
        Self {
            query,
            mutation: None,
            description: None,
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mutation(mut self, mutation: TypeHandle) -> Self {
        self.mutation = Some(mutation);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveApplication) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn query(&self) -> TypeHandle {
        self.query
    }

    pub fn mutation(&self) -> Option<TypeHandle> {
        self.mutation
    }
}

/// The built schema root.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub query: Arc<ObjectTypeDefinition>,
    pub mutation: Option<Arc<ObjectTypeDefinition>>,
    pub description: Option<String>,
    pub directives: Vec<DirectiveApplication>,
}
