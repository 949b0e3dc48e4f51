//! Member definitions: fields, input values, enum values and directive
//! applications.

use std::sync::{Arc, OnceLock};

use async_graphql_value::ConstValue;

use crate::types::{InputObject, TypeHandle, TypeRef};
use crate::visibility::{Visibility, VisibilityHandle};

/// Converts a public member name into a parameter or method name:
/// `firstName` becomes `first_name`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Default resolver method name for a field.
pub fn resolver_method_name(field_name: &str) -> String {
    format!("resolve_{}", snake_case(field_name))
}

/// A field of an object or interface type.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    name: String,
    ty: TypeRef,
    arguments: Vec<InputValueDefinition>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    directives: Vec<DirectiveApplication>,
    resolver_method_name: String,
    visibility: Option<VisibilityHandle>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            resolver_method_name: resolver_method_name(&name),
            name,
            ty,
            arguments: Vec::new(),
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            visibility: None,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_deprecation(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveApplication) -> Self {
        self.directives.push(directive);
        self
    }

    /// Overrides the resolver method name derived from the field name.
    #[must_use]
    pub fn with_resolver_method(mut self, method: impl Into<String>) -> Self {
        self.resolver_method_name = method.into();
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Some(VisibilityHandle::new(visibility));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn arguments(&self) -> &[InputValueDefinition] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deprecation_reason(&self) -> Option<&str> {
        self.deprecation_reason.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }

    pub fn directives(&self) -> &[DirectiveApplication] {
        &self.directives
    }

    pub fn resolver_method_name(&self) -> &str {
        &self.resolver_method_name
    }

    pub fn visibility(&self) -> Option<&VisibilityHandle> {
        self.visibility.as_ref()
    }

    /// Fields resolved by the engine itself (`__schema`, `__type`).
    pub fn is_meta(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// An argument, input field or directive argument.
#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    name: String,
    ty: TypeRef,
    default_value: Option<ConstValue>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    directives: Vec<DirectiveApplication>,
    visibility: Option<VisibilityHandle>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            visibility: None,
        }
    }

    /// Sets the default value. Any host value expressible as a constant is
    /// accepted, including enum (symbolic) values; it is coerced against the
    /// declared type when the schema is built.
    #[must_use]
    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the default value from JSON.
    #[must_use]
    pub fn with_default_json(self, value: serde_json::Value) -> Self {
        self.with_default(crate::json::json_to_const(value))
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_deprecation(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveApplication) -> Self {
        self.directives.push(directive);
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Some(VisibilityHandle::new(visibility));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter name used by resolver methods.
    pub fn parameter_name(&self) -> String {
        snake_case(&self.name)
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&ConstValue> {
        self.default_value.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deprecation_reason(&self) -> Option<&str> {
        self.deprecation_reason.as_deref()
    }

    pub fn directives(&self) -> &[DirectiveApplication] {
        &self.directives
    }

    pub fn visibility(&self) -> Option<&VisibilityHandle> {
        self.visibility.as_ref()
    }

    /// Must always be supplied: non-null and without a default.
    pub fn is_required(&self) -> bool {
        self.ty.is_required() && self.default_value.is_none()
    }
}

/// A member of an enum type.
#[derive(Debug, Clone)]
pub struct EnumValueDefinition {
    name: String,
    description: Option<String>,
    deprecation_reason: Option<String>,
    directives: Vec<DirectiveApplication>,
    visibility: Option<VisibilityHandle>,
}

impl EnumValueDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            visibility: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_deprecation(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveApplication) -> Self {
        self.directives.push(directive);
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Some(VisibilityHandle::new(visibility));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deprecation_reason(&self) -> Option<&str> {
        self.deprecation_reason.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }

    pub fn directives(&self) -> &[DirectiveApplication] {
        &self.directives
    }

    pub fn visibility(&self) -> Option<&VisibilityHandle> {
        self.visibility.as_ref()
    }
}

/// A directive applied to a schema element, e.g. `@tag(name: "public")`.
///
/// The raw arguments are coerced against the directive's definition when the
/// schema is built; afterwards [`arguments`](Self::arguments) exposes them as
/// an [`InputObject`].
#[derive(Debug, Clone)]
pub struct DirectiveApplication {
    directive: TypeHandle,
    raw_arguments: Vec<(String, ConstValue)>,
    coerced: Arc<OnceLock<InputObject>>,
}

impl DirectiveApplication {
    pub fn new(directive: TypeHandle) -> Self {
        Self {
            directive,
            raw_arguments: Vec::new(),
            coerced: Arc::new(OnceLock::new()),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.raw_arguments.push((name.into(), value));
        self
    }

    pub fn directive(&self) -> TypeHandle {
        self.directive
    }

    pub fn raw_arguments(&self) -> &[(String, ConstValue)] {
        &self.raw_arguments
    }

    /// Coerced arguments; available once the owning schema has been built.
    pub fn arguments(&self) -> Option<&InputObject> {
        self.coerced.get()
    }

    pub(crate) fn set_arguments(&self, arguments: InputObject) {
        // Already coerced by an earlier build pass over the same declaration.
        let _ = self.coerced.set(arguments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuiltinScalar;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("name"), "name");
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("currentTeam"), "current_team");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("address2Line"), "address2_line");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_default_resolver_method_name() {
        let field = FieldDefinition::new("currentTeam", TypeRef::optional(BuiltinScalar::String));
        assert_eq!(field.resolver_method_name(), "resolve_current_team");
        let field = field.with_resolver_method("team");
        assert_eq!(field.resolver_method_name(), "team");
    }

    #[test]
    fn test_input_value_requiredness() {
        let required = InputValueDefinition::new("id", TypeRef::required(BuiltinScalar::Id));
        assert!(required.is_required());
        let defaulted = InputValueDefinition::new("first", TypeRef::required(BuiltinScalar::Int))
            .with_default(ConstValue::Number(10.into()));
        assert!(!defaulted.is_required());
        assert_eq!(defaulted.parameter_name(), "first");
    }
}
