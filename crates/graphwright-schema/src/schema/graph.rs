//! The compiled schema graph.
//!
//! A [`SchemaGraph`] is the immutable result of a successful build: every
//! type reachable from the schema roots (plus builtin scalars, introspection
//! types and directives), indexed by public name, with the interface and
//! union membership resolved. It needs no synchronization once built; the
//! only interior state is the SDL cache.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;

use super::definitions::DefinitionBuilder;
use super::introspection::{self, TypeKind};
use crate::config::SchemaConfig;
use crate::definition::{Definition, DirectiveDefinition, SchemaDefinition};
use crate::types::{BaseType, BuiltinScalar, TypeHandle, TypeRef};
use crate::visibility::VisibilityHandle;

/// A named type of the graph.
#[derive(Debug, Clone)]
pub enum NamedType {
    Builtin(BuiltinScalar),
    Declared(Definition),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(scalar) => scalar.name(),
            Self::Declared(definition) => definition.name(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Builtin(scalar) => Some(scalar.description()),
            Self::Declared(definition) => definition.header().description.as_deref(),
        }
    }

    pub fn definition(&self) -> Option<&Definition> {
        match self {
            Self::Builtin(_) => None,
            Self::Declared(definition) => Some(definition),
        }
    }

    /// Introspection kind.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Builtin(_) | Self::Declared(Definition::Scalar(_)) => TypeKind::Scalar,
            Self::Declared(Definition::Object(_)) => TypeKind::Object,
            Self::Declared(Definition::Interface(_)) => TypeKind::Interface,
            Self::Declared(Definition::Union(_)) => TypeKind::Union,
            Self::Declared(Definition::Enum(_)) => TypeKind::Enum,
            Self::Declared(Definition::InputObject(_)) => TypeKind::InputObject,
            Self::Declared(Definition::Directive(_)) => TypeKind::Scalar,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind(), TypeKind::Scalar | TypeKind::Enum)
    }
}

/// Immutable, validated schema.
pub struct SchemaGraph {
    pub(crate) builder: Arc<DefinitionBuilder>,
    pub(crate) definition: SchemaDefinition,
    pub(crate) types: IndexMap<String, NamedType>,
    pub(crate) names: HashMap<TypeHandle, String>,
    pub(crate) directives: IndexMap<String, Arc<DirectiveDefinition>>,
    pub(crate) builtin_directives: Vec<String>,
    pub(crate) possible_types: HashMap<String, Vec<String>>,
    pub(crate) visibilities: IndexMap<String, VisibilityHandle>,
    pub(crate) config: SchemaConfig,
    pub(crate) sdl_cache: DashMap<String, Arc<str>>,
}

impl SchemaGraph {
    pub fn schema_definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub(crate) fn builder(&self) -> &DefinitionBuilder {
        &self.builder
    }

    /// All reachable named types, in discovery order.
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn type_by_name(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// The named type a base refers to.
    pub fn named(&self, base: BaseType) -> Option<&NamedType> {
        self.name_of(base).and_then(|name| self.types.get(name))
    }

    pub fn name_of(&self, base: BaseType) -> Option<&str> {
        match base {
            BaseType::Builtin(scalar) => Some(scalar.name()),
            BaseType::Declared(handle) => self.names.get(&handle).map(String::as_str),
        }
    }

    /// SDL notation of a type reference.
    pub fn render(&self, ty: &TypeRef) -> String {
        ty.display_with(&|base| self.name_of(base).unwrap_or("?").to_string())
    }

    pub fn directives(&self) -> &IndexMap<String, Arc<DirectiveDefinition>> {
        &self.directives
    }

    pub fn directive(&self, name: &str) -> Option<&Arc<DirectiveDefinition>> {
        self.directives.get(name)
    }

    pub fn is_builtin_directive(&self, name: &str) -> bool {
        self.builtin_directives.iter().any(|n| n == name)
    }

    pub fn is_introspection_type(&self, name: &str) -> bool {
        introspection::is_introspection_type(name)
    }

    /// Object types implementing an interface, or members of a union.
    pub fn possible_types(&self, name: &str) -> &[String] {
        self.possible_types
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct visibility predicates, keyed by cache key.
    pub fn visibilities(&self) -> &IndexMap<String, VisibilityHandle> {
        &self.visibilities
    }

    /// Name of the query root type.
    pub fn query_type(&self) -> &str {
        &self.definition.query.header.name
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.definition
            .mutation
            .as_ref()
            .map(|m| m.header.name.as_str())
    }
}

impl std::fmt::Debug for SchemaGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGraph")
            .field("query", &self.query_type())
            .field("types", &self.types.len())
            .field("directives", &self.directives.len())
            .finish_non_exhaustive()
    }
}
