//! Request and resolver contexts.
//!
//! A [`RequestContext`] carries host data for one request (feature flags,
//! the current user, loaders). Visibility predicates and resolvers read it by
//! type.
//!
//! # Example
//!
//! ```ignore
//! struct Flags(Vec<&'static str>);
//!
//! let context = RequestContext::new().with_data(Flags(vec!["visible"]));
//! let flags = context.data::<Flags>();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::visibility::ScopedSchema;

/// Host data attached to a single request.
#[derive(Clone, Default)]
pub struct RequestContext {
    data: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a value, replacing any earlier value of the same type.
    #[must_use]
    pub fn with_data<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.data.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("entries", &self.data.len())
            .finish()
    }
}

/// Context passed to every resolver method call.
pub struct ResolverContext<'a> {
    /// The request's host data.
    pub request: &'a RequestContext,
    /// The schema as visible to this request.
    pub schema: &'a ScopedSchema<'a>,
}

impl<'a> ResolverContext<'a> {
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&'a T> {
        self.request.data::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flags(Vec<&'static str>);
    struct UserId(u64);

    #[test]
    fn test_data_by_type() {
        let context = RequestContext::new()
            .with_data(Flags(vec!["visible"]))
            .with_data(UserId(7));
        assert_eq!(context.data::<Flags>().map(|f| f.0.clone()), Some(vec!["visible"]));
        assert_eq!(context.data::<UserId>().map(|u| u.0), Some(7));
        assert!(context.data::<String>().is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut context = RequestContext::new().with_data(UserId(1));
        context.insert(UserId(2));
        assert_eq!(context.data::<UserId>().map(|u| u.0), Some(2));
    }
}
