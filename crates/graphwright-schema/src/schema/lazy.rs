//! Lazy schema loading.
//!
//! [`LazySchema`] defers the build pass until the schema graph is first
//! needed. Concurrent first callers wait for a single build. A failed build
//! leaves the holder in [`SchemaState::Failed`] and the next call retries;
//! definitions that did build are kept by the shared
//! [`DefinitionBuilder`] and are not rebuilt.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use super::builder::build_graph;
use super::definitions::DefinitionBuilder;
use super::graph::SchemaGraph;
use crate::config::SchemaConfig;
use crate::definition::SchemaDeclaration;
use crate::error::SchemaError;

/// State of the lazy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Schema has not been built yet.
    Uninitialized,
    /// Schema is currently being built.
    Building,
    /// Schema is ready for use.
    Ready,
    /// The last build failed; the next access retries.
    Failed,
}

/// Thread-safe lazy schema holder.
pub struct LazySchema {
    graph: RwLock<Option<Arc<SchemaGraph>>>,

    /// Held for the whole build so only one runs at a time.
    build_lock: Mutex<()>,

    state: RwLock<SchemaState>,

    builder: Arc<DefinitionBuilder>,
    declaration: SchemaDeclaration,
    config: SchemaConfig,

    /// Last build error message (for diagnostics).
    last_error: RwLock<Option<String>>,
}

impl LazySchema {
    #[must_use]
    pub fn new(
        builder: Arc<DefinitionBuilder>,
        declaration: SchemaDeclaration,
        config: SchemaConfig,
    ) -> Self {
        Self {
            graph: RwLock::new(None),
            build_lock: Mutex::new(()),
            state: RwLock::new(SchemaState::Uninitialized),
            builder,
            declaration,
            config,
            last_error: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SchemaState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SchemaState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn builder(&self) -> &Arc<DefinitionBuilder> {
        &self.builder
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Gets the graph, building it if necessary. Waits for a build already
    /// running on another thread.
    ///
    /// # Errors
    ///
    /// Returns the error of the build pass unchanged.
    pub fn get_or_build(&self) -> Result<Arc<SchemaGraph>, SchemaError> {
        if let Some(graph) = self.get() {
            return Ok(graph);
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring lock
        if let Some(graph) = self.get() {
            return Ok(graph);
        }

        let retry = self.state() == SchemaState::Failed;
        self.set_state(SchemaState::Building);
        info!(retry, "Building schema...");

        match build_graph(Arc::clone(&self.builder), &self.declaration, &self.config) {
            Ok(graph) => {
                let graph = Arc::new(graph);
                *self.graph.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::clone(&graph));
                *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = None;
                self.set_state(SchemaState::Ready);
                info!("Schema built successfully");
                Ok(graph)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!(error = %error_msg, "Failed to build schema");
                *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = Some(error_msg);
                self.set_state(SchemaState::Failed);
                Err(e)
            }
        }
    }

    /// Gets the graph if it is already built, without triggering a build.
    pub fn get(&self) -> Option<Arc<SchemaGraph>> {
        self.graph
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the last build error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SchemaState::Ready
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::definition::FieldDefinition;
    use crate::error::BoxError;
    use crate::registry::{ObjectType, TypeRegistry};
    use crate::types::{BuiltinScalar, TypeRef};

    fn lazy_with(fields_calls: Arc<AtomicUsize>, fail_first: bool) -> LazySchema {
        let mut registry = TypeRegistry::new();
        let query = registry.declare(
            "Query",
            ObjectType::new("Query").with_fields(move || {
                if fields_calls.fetch_add(1, Ordering::SeqCst) == 0 && fail_first {
                    return Err::<_, BoxError>("database unavailable".into());
                }
                Ok(vec![FieldDefinition::new(
                    "ping",
                    TypeRef::required(BuiltinScalar::String),
                )])
            }),
        );
        let builder = Arc::new(DefinitionBuilder::new(Arc::new(registry), Some(query)));
        LazySchema::new(builder, SchemaDeclaration::new(query), SchemaConfig::default())
    }

    #[test]
    fn test_schema_state_enum() {
        assert_ne!(SchemaState::Uninitialized, SchemaState::Building);
        assert_ne!(SchemaState::Building, SchemaState::Ready);
        assert_ne!(SchemaState::Ready, SchemaState::Failed);
    }

    #[test]
    fn test_builds_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = lazy_with(Arc::clone(&calls), false);
        assert_eq!(lazy.state(), SchemaState::Uninitialized);
        assert!(lazy.get().is_none());

        let first = lazy.get_or_build().unwrap();
        let second = lazy.get_or_build().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(lazy.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_build_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = lazy_with(Arc::clone(&calls), true);

        let err = lazy.get_or_build().unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");
        assert_eq!(lazy.state(), SchemaState::Failed);
        assert_eq!(lazy.last_error().as_deref(), Some("database unavailable"));

        assert!(lazy.get_or_build().is_ok());
        assert!(lazy.is_ready());
        assert_eq!(lazy.last_error(), None);
    }
}
