//! Schema building and lazy loading.
//!
//! ## Components
//!
//! - [`DefinitionBuilder`] - Memoized, cycle-aware construction of one
//!   definition per declared handle
//! - [`LazySchema`] - Thread-safe holder that runs the build pass on first use
//! - [`SchemaGraph`] - The validated graph of everything reachable from the
//!   roots
//! - [`Schema`] - Host-facing entry point: execute, validate, dump SDL
//!
//! ## Architecture
//!
//! 1. Host code registers declarations in a [`TypeRegistry`]
//! 2. The first request triggers the build pass from the schema roots
//! 3. Definitions are built lazily and memoized; cycles are resolved through
//!    handles
//! 4. The built graph is cached; a failed build is retried on the next call

mod builder;
pub(crate) mod contract;
mod defaults;
mod definitions;
pub(crate) mod graph;
pub(crate) mod introspection;
mod lazy;
mod names;

use std::sync::Arc;

use async_graphql_parser::parse_query;

pub use contract::{CapabilityContract, ContractViolation, MethodSignature, Parameter};
pub use defaults::validate_default;
pub use definitions::DefinitionBuilder;
pub use graph::{NamedType, SchemaGraph};
pub use introspection::TypeKind;
pub use lazy::{LazySchema, SchemaState};

use crate::config::SchemaConfig;
use crate::context::RequestContext;
use crate::definition::{Definition, SchemaDeclaration};
use crate::error::{Location, SchemaError, ValidationError};
use crate::execution::{self, ExecutionResult, Request};
use crate::registry::TypeRegistry;
use crate::resolvers::RootValue;
use crate::sdl::print_schema;
use crate::types::TypeHandle;
use crate::visibility::ScopedSchema;

/// A declared schema.
///
/// Nothing is built until the first call that needs the graph. Every call
/// that takes a request context evaluates the visibility predicates against
/// it first; a predicate error aborts the call with
/// [`SchemaError::Visibility`].
pub struct Schema {
    lazy: LazySchema,
}

impl Schema {
    pub fn new(registry: impl Into<Arc<TypeRegistry>>, declaration: SchemaDeclaration) -> Self {
        Self::with_config(registry, declaration, SchemaConfig::default())
    }

    pub fn with_config(
        registry: impl Into<Arc<TypeRegistry>>,
        declaration: SchemaDeclaration,
        config: SchemaConfig,
    ) -> Self {
        let query_root = config.introspection.then_some(declaration.query());
        let builder = Arc::new(DefinitionBuilder::new(registry.into(), query_root));
        Self {
            lazy: LazySchema::new(builder, declaration, config),
        }
    }

    /// The definition of a declared handle, built on first access.
    ///
    /// # Errors
    ///
    /// Fails with the build error of the definition (or of the declaration
    /// closure that produced its members).
    pub fn definition_of(&self, handle: TypeHandle) -> Result<Definition, SchemaError> {
        self.lazy.builder().definition_of(handle)
    }

    /// The built graph, running the build pass if needed.
    pub fn graph(&self) -> Result<Arc<SchemaGraph>, SchemaError> {
        self.lazy.get_or_build()
    }

    pub fn state(&self) -> SchemaState {
        self.lazy.state()
    }

    pub fn config(&self) -> &SchemaConfig {
        self.lazy.config()
    }

    /// Executes a query document.
    ///
    /// # Errors
    ///
    /// Only build and visibility failures are returned as errors. Parse,
    /// validation, coercion and resolver failures are part of the result.
    pub async fn execute(
        &self,
        request: impl Into<Request>,
        root: &RootValue,
    ) -> Result<ExecutionResult, SchemaError> {
        let graph = self.graph()?;
        execution::execute(&graph, request.into(), root).await
    }

    /// Validates a query document without executing it.
    ///
    /// # Errors
    ///
    /// Returns build and visibility failures; validation failures are the
    /// `Ok` value.
    pub fn validate(
        &self,
        query: &str,
        context: Option<&RequestContext>,
    ) -> Result<Vec<ValidationError>, SchemaError> {
        let graph = self.graph()?;
        let empty = RequestContext::new();
        let scope = ScopedSchema::new(&graph, context.unwrap_or(&empty));
        let errors = match parse_query(query) {
            Ok(document) => execution::validate_document(&scope, &document),
            Err(err) => vec![ValidationError::new(
                err.to_string(),
                err.positions().map(Location::from).collect(),
            )],
        };
        scope.check()?;
        Ok(errors)
    }

    /// Dumps the schema as visible to `context` in SDL.
    ///
    /// # Errors
    ///
    /// Returns build and visibility failures.
    pub fn to_sdl(&self, context: Option<&RequestContext>) -> Result<String, SchemaError> {
        let graph = self.graph()?;
        let empty = RequestContext::new();
        let scope = ScopedSchema::new(&graph, context.unwrap_or(&empty));

        if !graph.config().sdl_cache {
            let sdl = print_schema(&scope);
            scope.check()?;
            return Ok(sdl);
        }
        let cache_key = scope.cache_key();
        scope.check()?;
        if let Some(cached) = graph.sdl_cache.get(&cache_key) {
            return Ok(cached.value().to_string());
        }
        let sdl = print_schema(&scope);
        scope.check()?;
        graph.sdl_cache.insert(cache_key, Arc::from(sdl.as_str()));
        Ok(sdl)
    }

    /// The capability contract of an object or interface type.
    pub fn contract(&self, type_name: &str) -> Result<Option<CapabilityContract>, SchemaError> {
        let graph = self.graph()?;
        Ok(graph
            .type_by_name(type_name)
            .and_then(NamedType::definition)
            .and_then(Definition::contract)
            .cloned())
    }

    /// The capability contract of a type rendered as a Rust trait.
    pub fn render_contract(&self, type_name: &str) -> Result<Option<String>, SchemaError> {
        let graph = self.graph()?;
        Ok(self
            .contract(type_name)?
            .map(|contract| contract.render_trait(&graph)))
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
