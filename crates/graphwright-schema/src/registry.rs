//! Declaration registry.
//!
//! Host code declares types in two phases. [`TypeRegistry::reserve`] hands
//! out a [`TypeHandle`] for an identity before anything is known about the
//! type, so mutually recursive declarations can capture each other's
//! handles. [`TypeRegistry::define`] then installs the declaration: a public
//! name plus member-producing closures that run only when the definition is
//! built.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! let team = registry.reserve("Team");
//! let player = registry.reserve("Player");
//!
//! registry.define(team, ObjectType::new("Team").with_fields(move || {
//!     Ok(vec![FieldDefinition::new("players", TypeRef::list_of(TypeRef::required(player), true))])
//! }));
//! registry.define(player, ObjectType::new("Player").with_fields(move || {
//!     Ok(vec![FieldDefinition::new("currentTeam", TypeRef::optional(team))])
//! }));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql_value::ConstValue;

use crate::definition::{
    DefinitionKind, DirectiveApplication, DirectiveLocation, EnumValueDefinition,
    FieldDefinition, InputValueDefinition,
};
use crate::error::{BoxError, SchemaError};
use crate::schema::introspection;
use crate::types::{BuiltinScalar, ScalarValue, TypeHandle, TypeRef};
use crate::visibility::{Visibility, VisibilityHandle};

/// Member-producing closure of a declaration.
pub type Members<T> = Arc<dyn Fn() -> Result<Vec<T>, BoxError> + Send + Sync>;

fn no_members<T>() -> Members<T> {
    Arc::new(|| Ok(Vec::new()))
}

/// Declaration attributes shared by every kind.
#[derive(Debug, Clone, Default)]
pub(crate) struct Common {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveApplication>,
    pub visibility: Option<VisibilityHandle>,
}

impl Common {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

macro_rules! common_builders {
    ($ty:ty) => {
        impl $ty {
            #[must_use]
            pub fn with_description(mut self, description: impl Into<String>) -> Self {
                self.common.description = Some(description.into());
                self
            }

            #[must_use]
            pub fn with_directive(mut self, directive: DirectiveApplication) -> Self {
                self.common.directives.push(directive);
                self
            }

            #[must_use]
            pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
                self.common.visibility = Some(VisibilityHandle::new(visibility));
                self
            }

            /// Public name of the declared type.
            pub fn name(&self) -> &str {
                &self.common.name
            }
        }
    };
}

/// Declaration of an object type.
#[derive(Clone)]
pub struct ObjectType {
    pub(crate) common: Common,
    pub(crate) fields: Members<FieldDefinition>,
    pub(crate) interfaces: Vec<TypeHandle>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            fields: no_members(),
            interfaces: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields<F>(mut self, fields: F) -> Self
    where
        F: Fn() -> Result<Vec<FieldDefinition>, BoxError> + Send + Sync + 'static,
    {
        self.fields = Arc::new(fields);
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: TypeHandle) -> Self {
        self.interfaces.push(interface);
        self
    }
}

common_builders!(ObjectType);

/// Declaration of an interface type.
#[derive(Clone)]
pub struct InterfaceType {
    pub(crate) common: Common,
    pub(crate) fields: Members<FieldDefinition>,
    pub(crate) interfaces: Vec<TypeHandle>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            fields: no_members(),
            interfaces: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields<F>(mut self, fields: F) -> Self
    where
        F: Fn() -> Result<Vec<FieldDefinition>, BoxError> + Send + Sync + 'static,
    {
        self.fields = Arc::new(fields);
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: TypeHandle) -> Self {
        self.interfaces.push(interface);
        self
    }
}

common_builders!(InterfaceType);

/// Declaration of an input object type.
#[derive(Clone)]
pub struct InputObjectType {
    pub(crate) common: Common,
    pub(crate) fields: Members<InputValueDefinition>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            fields: no_members(),
        }
    }

    #[must_use]
    pub fn with_fields<F>(mut self, fields: F) -> Self
    where
        F: Fn() -> Result<Vec<InputValueDefinition>, BoxError> + Send + Sync + 'static,
    {
        self.fields = Arc::new(fields);
        self
    }
}

common_builders!(InputObjectType);

/// Declaration of a union type.
#[derive(Clone)]
pub struct UnionType {
    pub(crate) common: Common,
    pub(crate) members: Members<TypeHandle>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            members: no_members(),
        }
    }

    #[must_use]
    pub fn with_members<F>(mut self, members: F) -> Self
    where
        F: Fn() -> Result<Vec<TypeHandle>, BoxError> + Send + Sync + 'static,
    {
        self.members = Arc::new(members);
        self
    }
}

common_builders!(UnionType);

/// Declaration of an enum type.
#[derive(Clone)]
pub struct EnumType {
    pub(crate) common: Common,
    pub(crate) values: Members<EnumValueDefinition>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            values: no_members(),
        }
    }

    #[must_use]
    pub fn with_values<F>(mut self, values: F) -> Self
    where
        F: Fn() -> Result<Vec<EnumValueDefinition>, BoxError> + Send + Sync + 'static,
    {
        self.values = Arc::new(values);
        self
    }
}

common_builders!(EnumType);

/// Input and result coercion of a custom scalar.
pub trait ScalarCoercion: Send + Sync {
    /// Converts an input value into the internal representation.
    fn coerce_input(&self, value: &ConstValue) -> Result<ScalarValue, String>;

    /// Converts the internal representation into a wire value.
    fn coerce_result(&self, value: &ScalarValue) -> Result<ConstValue, String>;
}

struct TypedCoercion<T, I, R> {
    input: I,
    result: R,
    _marker: PhantomData<fn() -> T>,
}

impl<T, I, R> ScalarCoercion for TypedCoercion<T, I, R>
where
    T: Any + Send + Sync,
    I: Fn(&ConstValue) -> Result<T, String> + Send + Sync,
    R: Fn(&T) -> Result<ConstValue, String> + Send + Sync,
{
    fn coerce_input(&self, value: &ConstValue) -> Result<ScalarValue, String> {
        (self.input)(value).map(ScalarValue::new)
    }

    fn coerce_result(&self, value: &ScalarValue) -> Result<ConstValue, String> {
        match value.downcast_ref::<T>() {
            Some(inner) => (self.result)(inner),
            None => Err(format!(
                "Expected an internal value of type `{}`",
                std::any::type_name::<T>()
            )),
        }
    }
}

/// Declaration of a custom scalar with internal representation `T`.
#[derive(Clone)]
pub struct CustomScalarType {
    pub(crate) common: Common,
    pub(crate) specified_by_url: Option<String>,
    pub(crate) coercion: Arc<dyn ScalarCoercion>,
}

impl CustomScalarType {
    pub fn new<T, I, R>(name: impl Into<String>, coerce_input: I, coerce_result: R) -> Self
    where
        T: Any + Send + Sync,
        I: Fn(&ConstValue) -> Result<T, String> + Send + Sync + 'static,
        R: Fn(&T) -> Result<ConstValue, String> + Send + Sync + 'static,
    {
        Self {
            common: Common::new(name),
            specified_by_url: None,
            coercion: Arc::new(TypedCoercion {
                input: coerce_input,
                result: coerce_result,
                _marker: PhantomData,
            }),
        }
    }

    #[must_use]
    pub fn with_specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }
}

common_builders!(CustomScalarType);

/// Declaration of a directive.
#[derive(Clone)]
pub struct DirectiveType {
    pub(crate) common: Common,
    pub(crate) arguments: Members<InputValueDefinition>,
    pub(crate) locations: Vec<DirectiveLocation>,
    pub(crate) repeatable: bool,
}

impl DirectiveType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: Common::new(name),
            arguments: no_members(),
            locations: Vec::new(),
            repeatable: false,
        }
    }

    #[must_use]
    pub fn with_arguments<F>(mut self, arguments: F) -> Self
    where
        F: Fn() -> Result<Vec<InputValueDefinition>, BoxError> + Send + Sync + 'static,
    {
        self.arguments = Arc::new(arguments);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.common.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }
}

/// A declaration of any kind.
#[derive(Clone)]
pub enum TypeDeclaration {
    Object(ObjectType),
    Interface(InterfaceType),
    InputObject(InputObjectType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(CustomScalarType),
    Directive(DirectiveType),
}

impl TypeDeclaration {
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

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub(crate) fn common(&self) -> &Common {
        match self {
            Self::Object(d) => &d.common,
            Self::Interface(d) => &d.common,
            Self::InputObject(d) => &d.common,
            Self::Union(d) => &d.common,
            Self::Enum(d) => &d.common,
            Self::Scalar(d) => &d.common,
            Self::Directive(d) => &d.common,
        }
    }
}

impl fmt::Debug for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDeclaration")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

macro_rules! declaration_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for TypeDeclaration {
            fn from(declaration: $ty) -> Self {
                Self::$variant(declaration)
            }
        }
    };
}

declaration_from!(Object, ObjectType);
declaration_from!(Interface, InterfaceType);
declaration_from!(InputObject, InputObjectType);
declaration_from!(Union, UnionType);
declaration_from!(Enum, EnumType);
declaration_from!(Scalar, CustomScalarType);
declaration_from!(Directive, DirectiveType);

/// Handles of the declarations every registry starts with.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinHandles {
    pub schema: TypeHandle,
    pub type_: TypeHandle,
    pub field: TypeHandle,
    pub input_value: TypeHandle,
    pub enum_value: TypeHandle,
    pub directive: TypeHandle,
    pub type_kind: TypeHandle,
    pub directive_location: TypeHandle,
    pub skip: TypeHandle,
    pub include: TypeHandle,
    pub deprecated: TypeHandle,
    pub specified_by: TypeHandle,
}

impl BuiltinHandles {
    pub fn introspection_types(&self) -> [TypeHandle; 8] {
        [
            self.schema,
            self.type_,
            self.field,
            self.input_value,
            self.enum_value,
            self.directive,
            self.type_kind,
            self.directive_location,
        ]
    }

    pub fn directives(&self) -> [TypeHandle; 4] {
        [self.skip, self.include, self.deprecated, self.specified_by]
    }
}

struct Entry {
    identity: String,
    declaration: Option<TypeDeclaration>,
}

/// Registry of every declared type and directive, indexed by handle.
pub struct TypeRegistry {
    entries: Vec<Entry>,
    builtins: BuiltinHandles,
}

impl TypeRegistry {
    /// Creates a registry holding the introspection types and the builtin
    /// directives.
    pub fn new() -> Self {
        let mut entries = Vec::new();
        let mut reserve = |identity: &str| {
            entries.push(Entry {
                identity: identity.to_string(),
                declaration: None,
            });
            TypeHandle((entries.len() - 1) as u32)
        };
        let builtins = BuiltinHandles {
            schema: reserve("__Schema"),
            type_: reserve("__Type"),
            field: reserve("__Field"),
            input_value: reserve("__InputValue"),
            enum_value: reserve("__EnumValue"),
            directive: reserve("__Directive"),
            type_kind: reserve("__TypeKind"),
            directive_location: reserve("__DirectiveLocation"),
            skip: reserve("@skip"),
            include: reserve("@include"),
            deprecated: reserve("@deprecated"),
            specified_by: reserve("@specifiedBy"),
        };
        let mut registry = Self { entries, builtins };
        for (handle, declaration) in introspection::declarations(&builtins)
            .into_iter()
            .chain(builtin_directives(&builtins))
        {
            registry.install(handle, declaration);
        }
        registry
    }

    /// Reserves a handle for `identity` without declaring the type yet.
    pub fn reserve(&mut self, identity: impl Into<String>) -> TypeHandle {
        self.entries.push(Entry {
            identity: identity.into(),
            declaration: None,
        });
        TypeHandle((self.entries.len() - 1) as u32)
    }

    /// Installs the declaration for a reserved handle.
    ///
    /// # Errors
    ///
    /// Fails with [`SchemaError::UnknownHandle`] when `handle` was not
    /// reserved by this registry.
    pub fn define(
        &mut self,
        handle: TypeHandle,
        declaration: impl Into<TypeDeclaration>,
    ) -> Result<(), SchemaError> {
        if handle.index() >= self.entries.len() {
            return Err(SchemaError::UnknownHandle {
                handle: handle.index(),
                reserved: self.entries.len(),
            });
        }
        self.install(handle, declaration.into());
        Ok(())
    }

    /// Reserves and defines in one step.
    pub fn declare(
        &mut self,
        identity: impl Into<String>,
        declaration: impl Into<TypeDeclaration>,
    ) -> TypeHandle {
        let handle = self.reserve(identity);
        self.install(handle, declaration.into());
        handle
    }

    fn install(&mut self, handle: TypeHandle, declaration: TypeDeclaration) {
        if let Some(entry) = self.entries.get_mut(handle.index()) {
            entry.declaration = Some(declaration);
        }
    }

    /// Identity a handle was registered under.
    pub fn identity(&self, handle: TypeHandle) -> Option<&str> {
        self.entries.get(handle.index()).map(|e| e.identity.as_str())
    }

    pub fn declaration(&self, handle: TypeHandle) -> Option<&TypeDeclaration> {
        self.entries
            .get(handle.index())
            .and_then(|e| e.declaration.as_ref())
    }

    /// Kind of the declaration behind a handle, without building it.
    pub fn kind_of(&self, handle: TypeHandle) -> Option<DefinitionKind> {
        self.declaration(handle).map(TypeDeclaration::kind)
    }

    pub fn builtins(&self) -> &BuiltinHandles {
        &self.builtins
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn builtin_directives(builtins: &BuiltinHandles) -> Vec<(TypeHandle, TypeDeclaration)> {
    let condition = |description: &'static str| {
        move || {
            Ok(vec![
                InputValueDefinition::new("if", TypeRef::required(BuiltinScalar::Boolean))
                    .with_description(description),
            ])
        }
    };
    vec![
        (
            builtins.skip,
            DirectiveType::new("skip")
                .with_description(
                    "Directs the executor to skip this field or fragment when the `if` argument is true.",
                )
                .with_arguments(condition("Skipped when true."))
                .with_location(DirectiveLocation::Field)
                .with_location(DirectiveLocation::FragmentSpread)
                .with_location(DirectiveLocation::InlineFragment)
                .into(),
        ),
        (
            builtins.include,
            DirectiveType::new("include")
                .with_description(
                    "Directs the executor to include this field or fragment only when the `if` argument is true.",
                )
                .with_arguments(condition("Included when true."))
                .with_location(DirectiveLocation::Field)
                .with_location(DirectiveLocation::FragmentSpread)
                .with_location(DirectiveLocation::InlineFragment)
                .into(),
        ),
        (
            builtins.deprecated,
            DirectiveType::new("deprecated")
                .with_description("Marks an element of a GraphQL schema as no longer supported.")
                .with_arguments(|| {
                    Ok(vec![
                        InputValueDefinition::new("reason", TypeRef::optional(BuiltinScalar::String))
                            .with_default(ConstValue::String("No longer supported".into())),
                    ])
                })
                .with_location(DirectiveLocation::FieldDefinition)
                .with_location(DirectiveLocation::ArgumentDefinition)
                .with_location(DirectiveLocation::InputFieldDefinition)
                .with_location(DirectiveLocation::EnumValue)
                .into(),
        ),
        (
            builtins.specified_by,
            DirectiveType::new("specifiedBy")
                .with_description("Exposes a URL that specifies the behavior of this scalar.")
                .with_arguments(|| {
                    Ok(vec![InputValueDefinition::new(
                        "url",
                        TypeRef::required(BuiltinScalar::String),
                    )])
                })
                .with_location(DirectiveLocation::Scalar)
                .into(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_builtins() {
        let registry = TypeRegistry::new();
        let builtins = *registry.builtins();
        assert_eq!(registry.identity(builtins.schema), Some("__Schema"));
        assert_eq!(registry.kind_of(builtins.type_kind), Some(DefinitionKind::Enum));
        assert_eq!(registry.kind_of(builtins.skip), Some(DefinitionKind::Directive));
        assert_eq!(registry.declaration(builtins.specified_by).map(|d| d.name()), Some("specifiedBy"));
    }

    #[test]
    fn test_reserve_then_define() {
        let mut registry = TypeRegistry::new();
        let team = registry.reserve("Team");
        assert_eq!(registry.identity(team), Some("Team"));
        assert!(registry.declaration(team).is_none());

        registry.define(team, ObjectType::new("Team")).unwrap();
        assert_eq!(registry.kind_of(team), Some(DefinitionKind::Object));
        assert_eq!(registry.declaration(team).map(|d| d.name()), Some("Team"));
    }

    #[test]
    fn test_declare_assigns_distinct_handles() {
        let mut registry = TypeRegistry::new();
        let a = registry.declare("A", EnumType::new("Color"));
        let b = registry.declare("B", EnumType::new("Color"));
        assert_ne!(a, b);
        assert_eq!(registry.identity(b), Some("B"));
    }

    #[test]
    fn test_define_rejects_foreign_handle() {
        let mut other = TypeRegistry::new();
        let foreign = other.reserve("Team");

        let mut registry = TypeRegistry::new();
        let err = registry.define(foreign, ObjectType::new("Team")).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownHandle { .. }));
        assert_eq!(
            err.to_string(),
            format!(
                "Handle {} was not reserved by this registry, which holds {} handles",
                foreign.index(),
                registry.len()
            )
        );
        assert!(registry.declaration(foreign).is_none());
    }
}
