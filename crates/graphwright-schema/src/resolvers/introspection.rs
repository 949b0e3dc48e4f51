//! Resolvers for the introspection types.
//!
//! They hold names and cloned member definitions only and read everything
//! else from the request's [`ScopedSchema`](crate::ScopedSchema), so an
//! introspection response shows exactly what the request may see.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Resolved, Resolver};
use crate::context::ResolverContext;
use crate::definition::{
    Definition, DirectiveDefinition, EnumValueDefinition, FieldDefinition, InputValueDefinition,
};
use crate::error::{FieldError, FieldResult};
use crate::schema::graph::{NamedType, SchemaGraph};
use crate::sdl::default_literal;
use crate::types::{Arguments, BaseType, TypeRef};

fn include_deprecated(args: &Arguments) -> bool {
    args.get("include_deprecated")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn unknown(typename: &str, method: &str) -> FieldError {
    FieldError::new(format!("`{typename}` resolver does not implement `{method}`"))
}

fn deprecation(reason: Option<&str>, method: &str) -> Option<Resolved> {
    match method {
        "resolve_is_deprecated" => Some(reason.is_some().into()),
        "resolve_deprecation_reason" => Some(reason.into()),
        _ => None,
    }
}

/// A type as introspection sees it: a named type or a wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeView {
    Named(String),
    List(Box<TypeView>),
    NonNull(Box<TypeView>),
}

impl TypeView {
    pub(crate) fn of(graph: &SchemaGraph, ty: &TypeRef) -> Self {
        Self::of_with(ty, &|base| graph.name_of(base).unwrap_or_default().to_string())
    }

    fn of_with(ty: &TypeRef, name_of: &dyn Fn(BaseType) -> String) -> Self {
        let inner = match ty {
            TypeRef::Named { base, .. } => Self::Named(name_of(*base)),
            TypeRef::List { inner, .. } => Self::List(Box::new(Self::of_with(inner, name_of))),
        };
        if ty.is_required() {
            Self::NonNull(Box::new(inner))
        } else {
            inner
        }
    }
}

/// Serves `__Schema`.
pub(crate) struct SchemaResolver;

const SCHEMA_METHODS: [&str; 6] = [
    "resolve_description",
    "resolve_types",
    "resolve_query_type",
    "resolve_mutation_type",
    "resolve_subscription_type",
    "resolve_directives",
];

#[async_trait]
impl Resolver for SchemaResolver {
    fn typename(&self) -> Option<&str> {
        Some("__Schema")
    }

    fn responds_to(&self, method: &str) -> bool {
        SCHEMA_METHODS.contains(&method)
    }

    async fn call(
        &self,
        method: &str,
        _args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        let scope = ctx.schema;
        let graph = scope.graph();
        Ok(match method {
            "resolve_description" => graph.schema_definition().description.clone().into(),
            "resolve_types" => Resolved::list(
                scope
                    .types()
                    .map(|ty| TypeResolver::named(ty.name()))
                    .collect::<Vec<_>>(),
            ),
            "resolve_query_type" => TypeResolver::named(graph.query_type()),
            "resolve_mutation_type" => graph
                .mutation_type()
                .filter(|name| scope.type_by_name(name).is_some())
                .map_or(Resolved::Null, TypeResolver::named),
            "resolve_subscription_type" => Resolved::Null,
            "resolve_directives" => Resolved::list(
                graph
                    .directives()
                    .values()
                    .filter(|d| scope.allows(d.header.visibility.as_ref()))
                    .map(|d| Resolved::object(DirectiveResolver(Arc::clone(d))))
                    .collect::<Vec<_>>(),
            ),
            other => return Err(unknown("__Schema", other)),
        })
    }
}

/// Serves `__Type`.
pub(crate) struct TypeResolver(pub(crate) TypeView);

impl TypeResolver {
    pub(crate) fn named(name: &str) -> Resolved {
        Resolved::object(Self(TypeView::Named(name.to_string())))
    }

    fn view(view: TypeView) -> Resolved {
        Resolved::object(Self(view))
    }
}

const TYPE_METHODS: [&str; 10] = [
    "resolve_kind",
    "resolve_name",
    "resolve_description",
    "resolve_specified_by_url",
    "resolve_fields",
    "resolve_interfaces",
    "resolve_possible_types",
    "resolve_enum_values",
    "resolve_input_fields",
    "resolve_of_type",
];

#[async_trait]
impl Resolver for TypeResolver {
    fn typename(&self) -> Option<&str> {
        Some("__Type")
    }

    fn responds_to(&self, method: &str) -> bool {
        TYPE_METHODS.contains(&method)
    }

    async fn call(
        &self,
        method: &str,
        args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        if !self.responds_to(method) {
            return Err(unknown("__Type", method));
        }
        let name = match &self.0 {
            TypeView::Named(name) => name,
            TypeView::List(inner) | TypeView::NonNull(inner) => {
                return Ok(match method {
                    "resolve_kind" => Resolved::enum_value(if matches!(self.0, TypeView::List(_)) {
                        "LIST"
                    } else {
                        "NON_NULL"
                    }),
                    "resolve_of_type" => Self::view((**inner).clone()),
                    _ => Resolved::Null,
                });
            }
        };

        let scope = ctx.schema;
        let Some(ty) = scope.type_by_name(name) else {
            return Ok(Resolved::Null);
        };
        let with_deprecated = include_deprecated(args);
        Ok(match (method, ty) {
            ("resolve_kind", _) => Resolved::enum_value(ty.kind().as_str()),
            ("resolve_name", _) => ty.name().into(),
            ("resolve_description", _) => ty.description().into(),
            ("resolve_specified_by_url", NamedType::Declared(Definition::Scalar(scalar))) => {
                scalar.specified_by_url.clone().into()
            }
            ("resolve_fields", NamedType::Declared(definition)) if definition.fields().is_some() => {
                Resolved::list(
                    scope
                        .fields(definition)
                        .filter(|f| !f.is_meta())
                        .filter(|f| with_deprecated || !f.is_deprecated())
                        .map(|f| Resolved::object(FieldResolver(f.clone())))
                        .collect::<Vec<_>>(),
                )
            }
            ("resolve_interfaces", NamedType::Declared(definition)) if definition.fields().is_some() => {
                Resolved::list(
                    scope
                        .interfaces(definition)
                        .into_iter()
                        .map(TypeResolver::named)
                        .collect::<Vec<_>>(),
                )
            }
            (
                "resolve_possible_types",
                NamedType::Declared(Definition::Interface(_) | Definition::Union(_)),
            ) => Resolved::list(
                scope
                    .possible_types(name)
                    .into_iter()
                    .map(TypeResolver::named)
                    .collect::<Vec<_>>(),
            ),
            ("resolve_enum_values", NamedType::Declared(Definition::Enum(enum_type))) => {
                Resolved::list(
                    enum_type
                        .values
                        .values()
                        .filter(|v| scope.enum_value_visible(v))
                        .filter(|v| with_deprecated || !v.is_deprecated())
                        .map(|v| Resolved::object(EnumValueResolver(v.clone())))
                        .collect::<Vec<_>>(),
                )
            }
            ("resolve_input_fields", NamedType::Declared(Definition::InputObject(input))) => {
                Resolved::list(
                    input
                        .fields
                        .values()
                        .filter(|f| scope.input_value_visible(f))
                        .filter(|f| with_deprecated || f.deprecation_reason().is_none())
                        .map(|f| Resolved::object(InputValueResolver(f.clone())))
                        .collect::<Vec<_>>(),
                )
            }
            _ => Resolved::Null,
        })
    }
}

fn input_values<'a>(
    ctx: &ResolverContext<'_>,
    values: impl Iterator<Item = &'a InputValueDefinition>,
    with_deprecated: bool,
) -> Resolved {
    Resolved::list(
        values
            .filter(|v| ctx.schema.input_value_visible(v))
            .filter(|v| with_deprecated || v.deprecation_reason().is_none())
            .map(|v| Resolved::object(InputValueResolver(v.clone())))
            .collect::<Vec<_>>(),
    )
}

/// Serves `__Field`.
pub(crate) struct FieldResolver(FieldDefinition);

#[async_trait]
impl Resolver for FieldResolver {
    fn typename(&self) -> Option<&str> {
        Some("__Field")
    }

    fn responds_to(&self, method: &str) -> bool {
        matches!(
            method,
            "resolve_name"
                | "resolve_description"
                | "resolve_args"
                | "resolve_type"
                | "resolve_is_deprecated"
                | "resolve_deprecation_reason"
        )
    }

    async fn call(
        &self,
        method: &str,
        args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        let field = &self.0;
        if let Some(value) = deprecation(field.deprecation_reason(), method) {
            return Ok(value);
        }
        Ok(match method {
            "resolve_name" => field.name().into(),
            "resolve_description" => field.description().into(),
            "resolve_args" => input_values(ctx, field.arguments().iter(), include_deprecated(args)),
            "resolve_type" => TypeResolver::view(TypeView::of(ctx.schema.graph(), field.ty())),
            other => return Err(unknown("__Field", other)),
        })
    }
}

/// Serves `__InputValue`.
pub(crate) struct InputValueResolver(InputValueDefinition);

#[async_trait]
impl Resolver for InputValueResolver {
    fn typename(&self) -> Option<&str> {
        Some("__InputValue")
    }

    fn responds_to(&self, method: &str) -> bool {
        matches!(
            method,
            "resolve_name"
                | "resolve_description"
                | "resolve_type"
                | "resolve_default_value"
                | "resolve_is_deprecated"
                | "resolve_deprecation_reason"
        )
    }

    async fn call(
        &self,
        method: &str,
        _args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        let value = &self.0;
        if let Some(resolved) = deprecation(value.deprecation_reason(), method) {
            return Ok(resolved);
        }
        let graph = ctx.schema.graph();
        Ok(match method {
            "resolve_name" => value.name().into(),
            "resolve_description" => value.description().into(),
            "resolve_type" => TypeResolver::view(TypeView::of(graph, value.ty())),
            "resolve_default_value" => default_literal(graph, value).into(),
            other => return Err(unknown("__InputValue", other)),
        })
    }
}

/// Serves `__EnumValue`.
pub(crate) struct EnumValueResolver(EnumValueDefinition);

#[async_trait]
impl Resolver for EnumValueResolver {
    fn typename(&self) -> Option<&str> {
        Some("__EnumValue")
    }

    fn responds_to(&self, method: &str) -> bool {
        matches!(
            method,
            "resolve_name" | "resolve_description" | "resolve_is_deprecated" | "resolve_deprecation_reason"
        )
    }

    async fn call(
        &self,
        method: &str,
        _args: &Arguments,
        _ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        let value = &self.0;
        if let Some(resolved) = deprecation(value.deprecation_reason(), method) {
            return Ok(resolved);
        }
        Ok(match method {
            "resolve_name" => value.name().into(),
            "resolve_description" => value.description().into(),
            other => return Err(unknown("__EnumValue", other)),
        })
    }
}

/// Serves `__Directive`.
pub(crate) struct DirectiveResolver(Arc<DirectiveDefinition>);

#[async_trait]
impl Resolver for DirectiveResolver {
    fn typename(&self) -> Option<&str> {
        Some("__Directive")
    }

    fn responds_to(&self, method: &str) -> bool {
        matches!(
            method,
            "resolve_name"
                | "resolve_description"
                | "resolve_is_repeatable"
                | "resolve_locations"
                | "resolve_args"
        )
    }

    async fn call(
        &self,
        method: &str,
        args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        let directive = &self.0;
        Ok(match method {
            "resolve_name" => directive.header.name.as_str().into(),
            "resolve_description" => directive.header.description.as_deref().into(),
            "resolve_is_repeatable" => directive.repeatable.into(),
            "resolve_locations" => Resolved::list(
                directive
                    .locations
                    .iter()
                    .map(|l| Resolved::enum_value(l.as_str()))
                    .collect::<Vec<_>>(),
            ),
            "resolve_args" => {
                input_values(ctx, directive.arguments.values(), include_deprecated(args))
            }
            other => return Err(unknown("__Directive", other)),
        })
    }
}
