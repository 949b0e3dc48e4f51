//! Request and response shapes.

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::ExecutionError;

/// A query request.
///
/// Deserializes from the usual JSON request body
/// (`{"query", "operationName", "variables"}`); the context is attached by
/// the host afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    /// The query document.
    pub query: String,

    /// Operation to run when the document holds several.
    #[serde(rename = "operationName", default)]
    pub operation_name: Option<String>,

    /// Raw variable values, by name.
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,

    #[serde(skip)]
    pub context: RequestContext,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the variables from a JSON object. Anything else is ignored.
    #[must_use]
    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = variables {
            self.variables = map;
        }
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

impl From<&str> for Request {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

/// Outcome of executing a request.
///
/// `data` is `null` when the request failed before execution (parse,
/// validation or variable errors) or when a non-null root field failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub data: serde_json::Value,
    pub errors: Vec<ExecutionError>,
}

impl ExecutionResult {
    pub(crate) fn failed(errors: Vec<ExecutionError>) -> Self {
        Self {
            data: serde_json::Value::Null,
            errors,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_deserializes_from_body() {
        let request: Request = serde_json::from_value(json!({
            "query": "query Q($n: Int) { a(n: $n) }",
            "operationName": "Q",
            "variables": {"n": 3}
        }))
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables.get("n"), Some(&json!(3)));
    }

    #[test]
    fn test_request_defaults() {
        let request: Request = serde_json::from_value(json!({"query": "{ a }"})).unwrap();
        assert!(request.operation_name.is_none());
        assert!(request.variables.is_empty());
    }

    #[test]
    fn test_result_shape() {
        let result = ExecutionResult {
            data: json!({"hello": "world"}),
            errors: vec![],
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"data": {"hello": "world"}, "errors": []})
        );
        assert!(result.is_ok());
    }
}
