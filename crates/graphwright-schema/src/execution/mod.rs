//! Request handling: validation and execution of query documents.

mod engine;
mod request;
mod validation;

pub(crate) use engine::execute;
pub use request::{ExecutionResult, Request};
pub(crate) use validation::validate_document;
