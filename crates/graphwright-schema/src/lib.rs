//! # graphwright-schema
//!
//! Declarative GraphQL type definitions compiled lazily into a validated,
//! introspectable schema graph.
//!
//! Host code registers type declarations (objects, interfaces, unions,
//! enums, input objects, custom scalars and directives) in a
//! [`TypeRegistry`], binds a query root and an optional mutation root in a
//! [`SchemaDeclaration`], and hands both to a [`Schema`]. Nothing is built
//! until the schema is first used; the build pass then walks every type
//! reachable from the roots, materializes each definition exactly once,
//! and validates names, member kinds, default values and directive
//! applications.
//!
//! ## Overview
//!
//! - [`Schema::execute`] runs a query document against host
//!   [`Resolver`]s
//! - [`Schema::validate`] checks a document without running it
//! - [`Schema::to_sdl`] dumps the schema as a given request may see it
//! - [`Schema::contract`] lists the resolver methods an object type needs
//!
//! ## Configuration
//!
//! ```toml
//! [schema]
//! introspection = true
//! max_depth = 15
//! sdl_cache = true
//! implicit_list_coercion = true
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - Declaration surface and handles
//! - [`definition`] - Built definition value objects
//! - [`schema`] - Build pass, lazy loading, the [`Schema`] entry point
//! - [`coercion`] - Input coercion for literals, variables and defaults
//! - [`resolvers`] - Resolver capability surface
//! - [`visibility`] - Per-request visibility predicates
//! - [`sdl`] - SDL printing
//! - [`error`] - Error types

pub mod coercion;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod execution;
pub mod json;
pub mod registry;
pub mod resolvers;
pub mod schema;
pub mod sdl;
pub mod types;
pub mod visibility;

pub use coercion::{Coercer, Input, Variables};
pub use config::SchemaConfig;
pub use context::{RequestContext, ResolverContext};
pub use definition::{
    Definition, DefinitionKind, DirectiveApplication, DirectiveLocation, EnumValueDefinition,
    FieldDefinition, InputValueDefinition, SchemaDeclaration,
};
pub use error::{
    BoxError, CoercionError, ExecutionError, FieldError, FieldResult, Location, PathSegment,
    SchemaError, ValidationError,
};
pub use execution::{ExecutionResult, Request};
pub use registry::{
    CustomScalarType, DirectiveType, EnumType, InputObjectType, InterfaceType, ObjectType,
    TypeDeclaration, TypeRegistry, UnionType,
};
pub use resolvers::{Resolved, Resolver, ResolverObject, RootValue};
pub use schema::{
    CapabilityContract, ContractViolation, DefinitionBuilder, LazySchema, NamedType, Schema,
    SchemaGraph, SchemaState,
};
pub use types::{
    Arguments, BaseType, BuiltinScalar, CoercedValue, InputObject, ScalarValue, TypeHandle,
    TypeRef,
};
pub use visibility::{FnVisibility, ScopedSchema, Visibility, VisibilityHandle};
