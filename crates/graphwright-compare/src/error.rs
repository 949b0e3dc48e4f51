//! Error types for SDL comparison.

use thiserror::Error;

/// Which of the two compared documents an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Errors that prevent a comparison.
#[derive(Debug, Error)]
pub enum CompareError {
    /// A document is not valid SDL.
    #[error("Failed to parse {side} schema: {message}")]
    Parse { side: Side, message: String },

    /// A document declares the same type or directive twice.
    #[error("The {side} schema defines `{name}` more than once")]
    Duplicate { side: Side, name: String },
}
