//! Resolver capability surface.
//!
//! A [`Resolver`] is the host object behind one value of an object type. The
//! engine calls one method per selected field, using the field's resolver
//! method name, and never asks what the object is beyond that. A resolver
//! satisfies a type's [`CapabilityContract`](crate::CapabilityContract) when
//! it responds to every method the contract lists.

pub(crate) mod introspection;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_graphql_value::ConstValue;
use async_trait::async_trait;

use crate::context::ResolverContext;
use crate::error::{FieldError, FieldResult};
use crate::types::{Arguments, ScalarValue};

/// Host object serving the fields of one value.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Concrete object type name, used when the value is returned for an
    /// interface or union field.
    fn typename(&self) -> Option<&str> {
        None
    }

    /// Whether the resolver implements `method`.
    fn responds_to(&self, method: &str) -> bool;

    /// Calls `method` with the coerced field arguments.
    async fn call(
        &self,
        method: &str,
        args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved>;
}

/// Value returned by a resolver method, completed by the engine against the
/// field's declared type.
#[derive(Clone)]
pub enum Resolved {
    Null,
    /// A leaf value.
    Value(ConstValue),
    /// Internal representation of a custom scalar.
    Scalar(ScalarValue),
    /// A nested object.
    Object(Arc<dyn Resolver>),
    List(Vec<Resolved>),
}

impl Resolved {
    pub fn object(resolver: impl Resolver + 'static) -> Self {
        Self::Object(Arc::new(resolver))
    }

    /// A custom scalar value in its internal representation.
    pub fn scalar<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Self::Scalar(ScalarValue::new(value))
    }

    /// An enum member.
    pub fn enum_value(name: &str) -> Self {
        Self::Value(ConstValue::Enum(async_graphql_value::Name::new(name)))
    }

    pub fn list<T: Into<Resolved>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::Object(object) => f
                .debug_tuple("Object")
                .field(&object.typename().unwrap_or("?"))
                .finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl From<ConstValue> for Resolved {
    fn from(value: ConstValue) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Resolved {
    fn from(value: String) -> Self {
        Self::Value(ConstValue::String(value))
    }
}

impl From<&str> for Resolved {
    fn from(value: &str) -> Self {
        Self::Value(ConstValue::String(value.to_string()))
    }
}

impl From<i32> for Resolved {
    fn from(value: i32) -> Self {
        Self::Value(ConstValue::Number(value.into()))
    }
}

impl From<f64> for Resolved {
    fn from(value: f64) -> Self {
        async_graphql_value::Number::from_f64(value)
            .map_or(Self::Null, |n| Self::Value(ConstValue::Number(n)))
    }
}

impl From<bool> for Resolved {
    fn from(value: bool) -> Self {
        Self::Value(ConstValue::Boolean(value))
    }
}

impl<T: Into<Resolved>> From<Option<T>> for Resolved {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Resolved>> From<Vec<T>> for Resolved {
    fn from(value: Vec<T>) -> Self {
        Self::list(value)
    }
}

impl From<Arc<dyn Resolver>> for Resolved {
    fn from(value: Arc<dyn Resolver>) -> Self {
        Self::Object(value)
    }
}

type Method =
    Arc<dyn Fn(&Arguments, &ResolverContext<'_>) -> FieldResult<Resolved> + Send + Sync>;

/// A resolver assembled from closures, one per method.
///
/// # Example
///
/// ```ignore
/// let root = ResolverObject::new()
///     .with_method("resolve_hello", |args, _ctx| {
///         let name = args.object("name").ok_or("name is required")?;
///         Ok(format!("Hello, {}!", name.get("first").and_then(CoercedValue::as_str).unwrap_or("")).into())
///     });
/// ```
#[derive(Clone, Default)]
pub struct ResolverObject {
    typename: Option<String>,
    methods: HashMap<String, Method>,
}

impl ResolverObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concrete type name reported for abstract fields.
    #[must_use]
    pub fn with_typename(mut self, typename: impl Into<String>) -> Self {
        self.typename = Some(typename.into());
        self
    }

    #[must_use]
    pub fn with_method<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Arguments, &ResolverContext<'_>) -> FieldResult<Resolved> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), Arc::new(f));
        self
    }

    /// A method that always returns `value`.
    #[must_use]
    pub fn with_value(self, method: impl Into<String>, value: impl Into<Resolved>) -> Self {
        let value = value.into();
        self.with_method(method, move |_, _| Ok(value.clone()))
    }
}

#[async_trait]
impl Resolver for ResolverObject {
    fn typename(&self) -> Option<&str> {
        self.typename.as_deref()
    }

    fn responds_to(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    async fn call(
        &self,
        method: &str,
        args: &Arguments,
        ctx: &ResolverContext<'_>,
    ) -> FieldResult<Resolved> {
        match self.methods.get(method) {
            Some(f) => f(args, ctx),
            None => Err(FieldError::new(format!("No method `{method}`"))),
        }
    }
}

impl fmt::Debug for ResolverObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ResolverObject")
            .field("typename", &self.typename)
            .field("methods", &methods)
            .finish()
    }
}

/// Root resolvers of one request.
#[derive(Clone)]
pub struct RootValue {
    pub(crate) query: Arc<dyn Resolver>,
    pub(crate) mutation: Option<Arc<dyn Resolver>>,
}

impl RootValue {
    pub fn new(query: impl Resolver + 'static) -> Self {
        Self {
            query: Arc::new(query),
            mutation: None,
        }
    }

    #[must_use]
    pub fn with_mutation(mut self, mutation: impl Resolver + 'static) -> Self {
        self.mutation = Some(Arc::new(mutation));
        self
    }

    pub fn query(&self) -> &Arc<dyn Resolver> {
        &self.query
    }

    pub fn mutation(&self) -> Option<&Arc<dyn Resolver>> {
        self.mutation.as_ref()
    }
}

impl fmt::Debug for RootValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootValue")
            .field("mutation", &self.mutation.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responds_to_registered_methods_only() {
        let object = ResolverObject::new()
            .with_value("resolve_name", "Adam")
            .with_method("resolve_age", |_, _| Ok(31.into()));
        assert!(object.responds_to("resolve_name"));
        assert!(object.responds_to("resolve_age"));
        assert!(!object.responds_to("resolve_email"));
    }

    #[test]
    fn test_conversions() {
        assert!(Resolved::from(None::<String>).is_null());
        assert!(matches!(
            Resolved::from(vec![1, 2]),
            Resolved::List(ref items) if items.len() == 2
        ));
        assert!(matches!(
            Resolved::enum_value("RED"),
            Resolved::Value(ConstValue::Enum(ref name)) if name.as_str() == "RED"
        ));
        assert!(Resolved::from(f64::NAN).is_null());
    }

    #[test]
    fn test_typename() {
        let object = ResolverObject::new().with_typename("Person");
        assert_eq!(object.typename(), Some("Person"));
        assert_eq!(ResolverObject::new().typename(), None);
    }
}
