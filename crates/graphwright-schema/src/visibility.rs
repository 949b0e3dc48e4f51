//! Visibility policy.
//!
//! A [`Visibility`] can be attached to any type, field, argument, input
//! field or enum value. A request sees the schema through a
//! [`ScopedSchema`], which evaluates a predicate the first time the request
//! reaches an element carrying it and remembers the outcome by cache key
//! for the rest of the request. Two requests whose predicates give the same
//! outcomes share a scope cache key, which is what the SDL cache is keyed
//! by.
//!
//! Predicate errors are never treated as "invisible": the first one is
//! kept, and the operation that reached it fails with
//! [`SchemaError::Visibility`] carrying the original error.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::context::RequestContext;
use crate::definition::{
    Definition, EnumValueDefinition, FieldDefinition, InputValueDefinition,
};
use crate::error::{BoxError, SchemaError};
use crate::schema::graph::{NamedType, SchemaGraph};
use crate::types::TypeRef;

/// A per-request inclusion predicate.
pub trait Visibility: Send + Sync {
    /// Identifies the predicate. Predicates with equal keys are assumed to
    /// give equal outcomes for the same context.
    fn cache_key(&self) -> String;

    /// Whether the element is visible to the request.
    fn is_visible(&self, context: &RequestContext) -> Result<bool, BoxError>;
}

/// A [`Visibility`] backed by a closure.
pub struct FnVisibility<F> {
    cache_key: String,
    predicate: F,
}

impl<F> FnVisibility<F>
where
    F: Fn(&RequestContext) -> Result<bool, BoxError> + Send + Sync,
{
    pub fn new(cache_key: impl Into<String>, predicate: F) -> Self {
        Self {
            cache_key: cache_key.into(),
            predicate,
        }
    }
}

impl<F> Visibility for FnVisibility<F>
where
    F: Fn(&RequestContext) -> Result<bool, BoxError> + Send + Sync,
{
    fn cache_key(&self) -> String {
        self.cache_key.clone()
    }

    fn is_visible(&self, context: &RequestContext) -> Result<bool, BoxError> {
        (self.predicate)(context)
    }
}

/// Shared handle to a visibility predicate.
#[derive(Clone)]
pub struct VisibilityHandle(Arc<dyn Visibility>);

impl VisibilityHandle {
    pub fn new(visibility: impl Visibility + 'static) -> Self {
        Self(Arc::new(visibility))
    }

    pub fn cache_key(&self) -> String {
        self.0.cache_key()
    }

    pub fn is_visible(&self, context: &RequestContext) -> Result<bool, BoxError> {
        self.0.is_visible(context)
    }
}

impl fmt::Debug for VisibilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VisibilityHandle")
            .field(&self.0.cache_key())
            .finish()
    }
}

/// The schema as visible to one request.
pub struct ScopedSchema<'g> {
    graph: &'g SchemaGraph,
    context: &'g RequestContext,
    outcomes: Mutex<HashMap<String, bool>>,
    failure: Mutex<Option<BoxError>>,
    visible_types: OnceLock<HashSet<&'g str>>,
}

impl<'g> ScopedSchema<'g> {
    /// Scopes `graph` to `context`. No predicate runs until an element
    /// carrying it is reached.
    pub(crate) fn new(graph: &'g SchemaGraph, context: &'g RequestContext) -> Self {
        Self {
            graph,
            context,
            outcomes: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            visible_types: OnceLock::new(),
        }
    }

    pub fn graph(&self) -> &'g SchemaGraph {
        self.graph
    }

    pub fn context(&self) -> &'g RequestContext {
        self.context
    }

    /// Fails with the first predicate error raised so far in this scope.
    pub(crate) fn check(&self) -> Result<(), SchemaError> {
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(SchemaError::Visibility(err)),
            None => Ok(()),
        }
    }

    /// Key identifying the visibility outcome of this scope. Evaluates every
    /// predicate of the graph.
    pub fn cache_key(&self) -> String {
        self.graph
            .visibilities()
            .iter()
            .map(|(key, visibility)| {
                let flag = if self.allows(Some(visibility)) { 1 } else { 0 };
                format!("{key}={flag}")
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Whether an element carrying `visibility` is visible. A predicate that
    /// fails hides the element and is reported by [`check`](Self::check).
    pub fn allows(&self, visibility: Option<&VisibilityHandle>) -> bool {
        let Some(visibility) = visibility else {
            return true;
        };
        let key = visibility.cache_key();
        if let Some(visible) = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return *visible;
        }
        let visible = match visibility.is_visible(self.context) {
            Ok(visible) => visible,
            Err(err) => {
                debug!(cache_key = %key, error = %err, "Visibility predicate failed");
                self.failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(err);
                false
            }
        };
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, visible);
        visible
    }

    fn type_allowed(&self, ty: &NamedType) -> bool {
        match ty {
            NamedType::Builtin(_) => true,
            NamedType::Declared(definition) => self.allows(definition.header().visibility.as_ref()),
        }
    }

    fn ref_allowed(&self, ty: &TypeRef) -> bool {
        self.graph
            .named(ty.base())
            .is_some_and(|named| self.type_allowed(named))
    }

    fn name_allowed(&self, name: &str) -> bool {
        self.graph
            .type_by_name(name)
            .is_some_and(|ty| self.type_allowed(ty))
    }

    fn collect_visible_types(&self) -> HashSet<&'g str> {
        let graph = self.graph;
        let mut queue: VecDeque<&'g NamedType> = VecDeque::new();
        for ty in graph.types() {
            if matches!(ty, NamedType::Builtin(_)) || graph.is_introspection_type(ty.name()) {
                queue.push_back(ty);
            }
        }
        let schema = graph.schema_definition();
        for root in std::iter::once(&schema.query).chain(schema.mutation.as_ref()) {
            if let Some(ty) = graph.type_by_name(&root.header.name) {
                queue.push_back(ty);
            }
        }
        for directive in graph.directives().values() {
            for argument in directive.arguments.values() {
                if let Some(ty) = graph.named(argument.ty().base()) {
                    queue.push_back(ty);
                }
            }
        }

        let mut visible = HashSet::new();
        while let Some(ty) = queue.pop_front() {
            if !self.type_allowed(ty) || !visible.insert(ty.name()) {
                continue;
            }
            let NamedType::Declared(definition) = ty else {
                continue;
            };
            let mut next: Vec<&'g NamedType> = Vec::new();
            match definition {
                Definition::Object(_) | Definition::Interface(_) => {
                    for field in self.fields(definition) {
                        next.extend(graph.named(field.ty().base()));
                        for argument in self.arguments(field) {
                            next.extend(graph.named(argument.ty().base()));
                        }
                    }
                    for interface in definition.interfaces() {
                        next.extend(graph.named((*interface).into()));
                    }
                    for name in graph.possible_types(definition.name()) {
                        next.extend(graph.type_by_name(name));
                    }
                }
                Definition::Union(_) => {
                    for name in graph.possible_types(definition.name()) {
                        next.extend(graph.type_by_name(name));
                    }
                }
                Definition::InputObject(input) => {
                    for field in input.fields.values() {
                        if self.input_value_visible(field) {
                            next.extend(graph.named(field.ty().base()));
                        }
                    }
                }
                _ => {}
            }
            queue.extend(next);
        }
        visible
    }

    /// A named type, if its own predicate allows it.
    pub fn type_by_name(&self, name: &str) -> Option<&'g NamedType> {
        self.graph
            .type_by_name(name)
            .filter(|ty| self.type_allowed(ty))
    }

    /// Types reachable from the roots through visible elements, in schema
    /// order. Evaluates the predicate of everything reachable.
    pub fn types(&self) -> impl Iterator<Item = &'g NamedType> + '_ {
        let visible = self
            .visible_types
            .get_or_init(|| self.collect_visible_types());
        self.graph
            .types()
            .filter(move |ty| visible.contains(ty.name()))
    }

    pub fn field_visible(&self, field: &FieldDefinition) -> bool {
        self.allows(field.visibility()) && self.ref_allowed(field.ty())
    }

    pub fn input_value_visible(&self, value: &InputValueDefinition) -> bool {
        self.allows(value.visibility()) && self.ref_allowed(value.ty())
    }

    pub fn enum_value_visible(&self, value: &EnumValueDefinition) -> bool {
        self.allows(value.visibility())
    }

    /// Visible fields of an object or interface.
    pub fn fields(&self, definition: &'g Definition) -> impl Iterator<Item = &'g FieldDefinition> + '_ {
        definition
            .fields()
            .into_iter()
            .flat_map(|fields| fields.values())
            .filter(|field| self.field_visible(field))
    }

    /// A visible field of a visible type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&'g FieldDefinition> {
        let NamedType::Declared(definition) = self.type_by_name(type_name)? else {
            return None;
        };
        definition
            .fields()?
            .get(field_name)
            .filter(|field| self.field_visible(field))
    }

    /// Visible arguments of a field.
    pub fn arguments<'f>(
        &'f self,
        field: &'g FieldDefinition,
    ) -> impl Iterator<Item = &'g InputValueDefinition> + 'f {
        field
            .arguments()
            .iter()
            .filter(|argument| self.input_value_visible(argument))
    }

    /// Visible interfaces of an object or interface.
    pub fn interfaces(&self, definition: &'g Definition) -> Vec<&'g str> {
        definition
            .interfaces()
            .iter()
            .filter_map(|handle| self.graph.name_of((*handle).into()))
            .filter(|name| self.name_allowed(name))
            .collect()
    }

    /// Visible object types that may appear where `name` is expected.
    pub fn possible_types(&self, name: &str) -> Vec<&'g str> {
        match self.type_by_name(name) {
            Some(NamedType::Declared(Definition::Object(object))) => vec![object.header.name.as_str()],
            Some(_) => self
                .graph
                .possible_types(name)
                .iter()
                .map(String::as_str)
                .filter(|n| self.name_allowed(n))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        self.possible_types(abstract_type).contains(&object_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flags(Vec<&'static str>);

    #[test]
    fn test_fn_visibility_reads_context() {
        let visibility = VisibilityHandle::new(FnVisibility::new(
            "flag:beta",
            |ctx: &RequestContext| -> Result<bool, BoxError> {
                Ok(ctx
                    .data::<Flags>()
                    .is_some_and(|flags| flags.0.contains(&"beta")))
            },
        ));
        assert_eq!(visibility.cache_key(), "flag:beta");
        let with_flag = RequestContext::new().with_data(Flags(vec!["beta"]));
        assert!(visibility.is_visible(&with_flag).unwrap());
        assert!(!visibility.is_visible(&RequestContext::new()).unwrap());
    }

    #[test]
    fn test_fn_visibility_error_passes_through() {
        let visibility = VisibilityHandle::new(FnVisibility::new(
            "broken",
            |_: &RequestContext| -> Result<bool, BoxError> { Err("predicate exploded".into()) },
        ));
        let err = visibility.is_visible(&RequestContext::new()).unwrap_err();
        assert_eq!(err.to_string(), "predicate exploded");
    }
}
