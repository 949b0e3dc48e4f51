//! # graphwright-compare
//!
//! Structural comparison of two GraphQL SDL documents.
//!
//! Both documents are parsed and indexed by name, then walked element by
//! element. Every difference becomes a [`Change`] classified by how it
//! affects clients already written against the old schema:
//!
//! - [`Criticality::Breaking`] - existing operations may stop validating
//! - [`Criticality::Dangerous`] - operations keep validating but may see
//!   different results
//! - [`Criticality::NonBreaking`] - safe for every existing client
//!
//! ```
//! let old = "type Query { team: String }";
//! let new = "type Query { team: String! players: [String] }";
//!
//! let comparison = graphwright_compare::compare(old, new).unwrap();
//! assert!(!comparison.is_breaking());
//! assert_eq!(comparison.len(), 2);
//! ```

pub mod change;
mod diff;
pub mod error;
mod model;

pub use change::{Change, ChangeKind, Criticality};
pub use error::{CompareError, Side};

use serde::Serialize;
use tracing::debug;

use model::SchemaModel;

/// The changes between two schemas, most severe first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Comparison {
    changes: Vec<Change>,
}

impl Comparison {
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when at least one change breaks existing clients.
    pub fn is_breaking(&self) -> bool {
        self.changes.iter().any(Change::is_breaking)
    }

    pub fn breaking(&self) -> impl Iterator<Item = &Change> {
        self.with(Criticality::Breaking)
    }

    pub fn dangerous(&self) -> impl Iterator<Item = &Change> {
        self.with(Criticality::Dangerous)
    }

    pub fn non_breaking(&self) -> impl Iterator<Item = &Change> {
        self.with(Criticality::NonBreaking)
    }

    fn with(&self, criticality: Criticality) -> impl Iterator<Item = &Change> {
        self.changes
            .iter()
            .filter(move |c| c.criticality == criticality)
    }
}

/// Compares the `old` SDL document against the `new` one.
pub fn compare(old: &str, new: &str) -> Result<Comparison, CompareError> {
    let old = SchemaModel::parse(old, Side::Old)?;
    let new = SchemaModel::parse(new, Side::New)?;

    let mut changes = diff::diff(&old, &new);
    changes.sort_by_key(|c| c.criticality);

    debug!(
        changes = changes.len(),
        breaking = changes.iter().filter(|c| c.is_breaking()).count(),
        "Compared schemas"
    );

    Ok(Comparison { changes })
}
