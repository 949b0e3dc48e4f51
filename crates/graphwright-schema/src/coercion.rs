//! Input coercion.
//!
//! One pipeline serves query literals, request variables and the default
//! values declared by the host. Constant input (variables, defaults) is a
//! little more lenient than query literals: an enum type accepts a string
//! naming one of its members, and `String` accepts a symbolic enum value.
//! Every failure is reported with the path of the offending value, and all
//! failures of one value are collected rather than stopping at the first.

use async_graphql_value::{ConstValue, Name, Value};
use indexmap::IndexMap;

use crate::definition::Definition;
use crate::error::{CoercionError, PathSegment};
use crate::schema::DefinitionBuilder;
use crate::types::{BaseType, CoercedValue, InputShape, TypeRef};

/// Raw input to coerce.
#[derive(Debug, Clone, Copy)]
pub enum Input<'v> {
    /// A constant: a variable value or a host default.
    Const(&'v ConstValue),
    /// A query literal, possibly containing variable references.
    Literal(&'v Value),
}

/// Shallow view of an input value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Leaf<'v> {
    Null,
    Int(i64),
    Float(f64),
    String(&'v str),
    Boolean(bool),
    Enum(&'v str),
    List,
    Object,
    Other,
}

impl Leaf<'_> {
    /// Name of the value's kind used in error messages.
    pub(crate) fn public_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Enum(_) => "enum",
            Self::List => "list",
            Self::Object => "object",
            Self::Other => "binary",
        }
    }
}

fn number_leaf<'v>(n: &async_graphql_value::Number) -> Leaf<'v> {
    match n.as_i64() {
        Some(i) => Leaf::Int(i),
        None => Leaf::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

impl<'v> Input<'v> {
    fn leaf(self) -> Leaf<'v> {
        match self {
            Self::Const(value) => match value {
                ConstValue::Null => Leaf::Null,
                ConstValue::Number(n) => number_leaf(n),
                ConstValue::String(s) => Leaf::String(s),
                ConstValue::Boolean(b) => Leaf::Boolean(*b),
                ConstValue::Enum(name) => Leaf::Enum(name.as_str()),
                ConstValue::List(_) => Leaf::List,
                ConstValue::Object(_) => Leaf::Object,
                _ => Leaf::Other,
            },
            Self::Literal(value) => match value {
                Value::Null | Value::Variable(_) => Leaf::Null,
                Value::Number(n) => number_leaf(n),
                Value::String(s) => Leaf::String(s),
                Value::Boolean(b) => Leaf::Boolean(*b),
                Value::Enum(name) => Leaf::Enum(name.as_str()),
                Value::List(_) => Leaf::List,
                Value::Object(_) => Leaf::Object,
                _ => Leaf::Other,
            },
        }
    }

    fn is_const(self) -> bool {
        matches!(self, Self::Const(_))
    }

    fn variable(self) -> Option<&'v Name> {
        match self {
            Self::Literal(Value::Variable(name)) => Some(name),
            _ => None,
        }
    }

    fn items(self) -> Vec<Input<'v>> {
        match self {
            Self::Const(ConstValue::List(items)) => items.iter().map(Input::Const).collect(),
            Self::Literal(Value::List(items)) => items.iter().map(Input::Literal).collect(),
            _ => Vec::new(),
        }
    }

    fn entries(self) -> Vec<(&'v str, Input<'v>)> {
        match self {
            Self::Const(ConstValue::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.as_str(), Input::Const(v)))
                .collect(),
            Self::Literal(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.as_str(), Input::Literal(v)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Constant form of the input, for custom scalars. Literals containing
    /// variables have none.
    fn to_const(self) -> Option<ConstValue> {
        match self {
            Self::Const(value) => Some(value.clone()),
            Self::Literal(value) => literal_to_const(value),
        }
    }
}

/// Converts a literal without variable references into a constant.
pub fn literal_to_const(value: &Value) -> Option<ConstValue> {
    Some(match value {
        Value::Variable(_) => return None,
        Value::Null => ConstValue::Null,
        Value::Number(n) => ConstValue::Number(n.clone()),
        Value::String(s) => ConstValue::String(s.clone()),
        Value::Boolean(b) => ConstValue::Boolean(*b),
        Value::Enum(name) => ConstValue::Enum(name.clone()),
        Value::List(items) => ConstValue::List(
            items
                .iter()
                .map(literal_to_const)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Object(map) => ConstValue::Object(
            map.iter()
                .map(|(k, v)| Some((k.clone(), literal_to_const(v)?)))
                .collect::<Option<_>>()?,
        ),
        _ => return None,
    })
}

/// Coerced request variables, by name.
pub type Variables = IndexMap<String, CoercedValue>;

/// Coerces raw input against type references.
pub struct Coercer<'a> {
    definitions: &'a DefinitionBuilder,
    variables: Option<&'a Variables>,
    implicit_list: bool,
    deferred_variables: bool,
}

impl<'a> Coercer<'a> {
    pub fn new(definitions: &'a DefinitionBuilder) -> Self {
        Self {
            definitions,
            variables: None,
            implicit_list: true,
            deferred_variables: false,
        }
    }

    /// Resolves variable references in literals against `variables`.
    #[must_use]
    pub fn with_variables(mut self, variables: &'a Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Whether a single value is accepted where a list is expected.
    #[must_use]
    pub fn with_implicit_list(mut self, enabled: bool) -> Self {
        self.implicit_list = enabled;
        self
    }

    /// Checks literals without variable values: every variable reference is
    /// accepted as-is and only the constant parts are coerced.
    #[must_use]
    pub fn with_deferred_variables(mut self) -> Self {
        self.deferred_variables = true;
        self
    }

    /// Whether a literal refers to a variable the request did not provide.
    /// Such an argument or input field counts as absent.
    pub fn is_absent(&self, input: Input<'_>) -> bool {
        if self.deferred_variables {
            return false;
        }
        input
            .variable()
            .is_some_and(|name| !self.variables.is_some_and(|vars| vars.contains_key(name.as_str())))
    }

    /// Coerces `input` against `ty`.
    ///
    /// # Errors
    ///
    /// Returns every coercion error found in the value.
    pub fn coerce(&self, input: Input<'_>, ty: &TypeRef) -> Result<CoercedValue, Vec<CoercionError>> {
        self.coerce_at(input, ty, Vec::new())
    }

    /// Like [`coerce`](Self::coerce), reporting paths below `path`.
    pub fn coerce_at(
        &self,
        input: Input<'_>,
        ty: &TypeRef,
        path: Vec<PathSegment>,
    ) -> Result<CoercedValue, Vec<CoercionError>> {
        let mut errors = Vec::new();
        let mut path = path;
        let value = self.coerce_value(input, ty, true, &mut path, &mut errors);
        match value {
            Some(value) if errors.is_empty() => Ok(value),
            _ => Err(errors),
        }
    }

    /// Coerces a set of named values (field arguments or directive
    /// arguments) against their definitions, producing a record.
    pub fn coerce_arguments<'v>(
        &self,
        shape: &std::sync::Arc<InputShape>,
        definitions: impl IntoIterator<Item = &'v crate::definition::InputValueDefinition>,
        provided: &[(&str, Input<'_>)],
    ) -> Result<crate::types::InputObject, Vec<CoercionError>> {
        let mut errors = Vec::new();
        let mut values = Vec::new();
        let definitions: Vec<_> = definitions.into_iter().collect();
        for (name, _) in provided {
            if !definitions.iter().any(|d| d.name() == *name) {
                errors.push(CoercionError::new(
                    format!("No field named `{}` on {}", name, shape.type_name()),
                    vec![PathSegment::Field((*name).to_string())],
                ));
            }
        }
        for definition in definitions {
            let mut path = vec![PathSegment::Field(definition.name().to_string())];
            let supplied = provided
                .iter()
                .find(|(name, input)| *name == definition.name() && !self.is_absent(*input));
            if let Some(value) =
                self.coerce_member(supplied.map(|(_, input)| *input), definition, &mut path, &mut errors)
            {
                values.push((definition.name().to_string(), value));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        InputShape::construct(shape, values)
            .map_err(|messages| messages.into_iter().map(|m| CoercionError::new(m, Vec::new())).collect())
    }

    /// One argument or input field: the supplied value, else the default,
    /// else an error when required. `None` means absent.
    fn coerce_member(
        &self,
        supplied: Option<Input<'_>>,
        definition: &crate::definition::InputValueDefinition,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<CoercionError>,
    ) -> Option<CoercedValue> {
        match (supplied, definition.default_value()) {
            (Some(input), _) => self.coerce_value(input, definition.ty(), true, path, errors),
            (None, Some(default)) => {
                self.coerce_value(Input::Const(default), definition.ty(), true, path, errors)
            }
            (None, None) => {
                if definition.ty().is_required() {
                    let mut parent = path.clone();
                    parent.pop();
                    errors.push(CoercionError::new(
                        format!("No value for required field {}", definition.name()),
                        parent,
                    ));
                }
                None
            }
        }
    }

    fn coerce_value(
        &self,
        input: Input<'_>,
        ty: &TypeRef,
        allow_implicit_list: bool,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<CoercionError>,
    ) -> Option<CoercedValue> {
        if let Some(name) = input.variable() {
            if self.deferred_variables {
                return Some(CoercedValue::Null);
            }
            let value = self
                .variables
                .and_then(|vars| vars.get(name.as_str()))
                .cloned()
                .unwrap_or(CoercedValue::Null);
            if value.is_null() && ty.is_required() {
                errors.push(CoercionError::new(
                    "Got null when a non-null value was expected",
                    path.clone(),
                ));
                return None;
            }
            return Some(value);
        }

        let leaf = input.leaf();
        if leaf == Leaf::Null {
            if ty.is_required() {
                errors.push(CoercionError::new(
                    "Got null when a non-null value was expected",
                    path.clone(),
                ));
                return None;
            }
            return Some(CoercedValue::Null);
        }

        match ty {
            TypeRef::List { inner, .. } => {
                if leaf == Leaf::List {
                    let mut items = Vec::new();
                    let mut failed = false;
                    for (index, item) in input.items().into_iter().enumerate() {
                        path.push(PathSegment::Index(index));
                        let value = if self.is_absent(item) {
                            self.coerce_value(
                                Input::Const(&ConstValue::Null),
                                inner,
                                false,
                                path,
                                errors,
                            )
                        } else {
                            self.coerce_value(item, inner, false, path, errors)
                        };
                        path.pop();
                        match value {
                            Some(value) => items.push(value),
                            None => failed = true,
                        }
                    }
                    (!failed).then_some(CoercedValue::List(items))
                } else if self.implicit_list && allow_implicit_list {
                    self.coerce_value(input, inner, true, path, errors)
                        .map(|value| CoercedValue::List(vec![value]))
                } else {
                    errors.push(CoercionError::new(
                        format!(
                            "No implicit conversion of {} to {}",
                            leaf.public_name(),
                            self.render(ty)
                        ),
                        path.clone(),
                    ));
                    None
                }
            }
            TypeRef::Named { base, .. } => self.coerce_named(input, &leaf, *base, path, errors),
        }
    }

    fn render(&self, ty: &TypeRef) -> String {
        let registry = self.definitions.registry();
        ty.display_with(&|base| match base {
            BaseType::Builtin(scalar) => scalar.name().to_string(),
            BaseType::Declared(handle) => registry
                .declaration(handle)
                .map_or_else(|| "?".to_string(), |d| d.name().to_string()),
        })
    }

    fn coerce_named(
        &self,
        input: Input<'_>,
        leaf: &Leaf<'_>,
        base: BaseType,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<CoercionError>,
    ) -> Option<CoercedValue> {
        let handle = match base {
            BaseType::Builtin(scalar) => {
                return match scalar.coerce_input(leaf, input.is_const()) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        errors.push(CoercionError::new(message, path.clone()));
                        None
                    }
                };
            }
            BaseType::Declared(handle) => handle,
        };
        let definition = match self.definitions.definition_of(handle) {
            Ok(definition) => definition,
            Err(err) => {
                errors.push(CoercionError::new(err.to_string(), path.clone()));
                return None;
            }
        };

        match &definition {
            Definition::Enum(enum_type) => {
                let member = match leaf {
                    Leaf::Enum(name) => Some(*name),
                    Leaf::String(name) if input.is_const() => Some(*name),
                    _ => None,
                };
                match member {
                    Some(name) if enum_type.values.contains_key(name) => {
                        Some(CoercedValue::Enum(name.to_string()))
                    }
                    Some(name) => {
                        errors.push(CoercionError::new(
                            format!("No member `{}` on {}", name, enum_type.header.name),
                            path.clone(),
                        ));
                        None
                    }
                    None => {
                        errors.push(CoercionError::new(
                            format!(
                                "No implicit conversion of {} to {}",
                                leaf.public_name(),
                                enum_type.header.name
                            ),
                            path.clone(),
                        ));
                        None
                    }
                }
            }
            Definition::InputObject(input_type) => {
                if *leaf != Leaf::Object {
                    errors.push(CoercionError::new(
                        format!(
                            "No implicit conversion of {} to {}",
                            leaf.public_name(),
                            input_type.header.name
                        ),
                        path.clone(),
                    ));
                    return None;
                }
                let entries = input.entries();
                let before = errors.len();
                for (name, _) in &entries {
                    if !input_type.fields.contains_key(*name) {
                        errors.push(CoercionError::new(
                            format!("No field named `{}` on {}", name, input_type.header.name),
                            path.clone(),
                        ));
                    }
                }
                let mut values = Vec::new();
                for field in input_type.fields.values() {
                    let supplied = entries
                        .iter()
                        .find(|(name, value)| *name == field.name() && !self.is_absent(*value))
                        .map(|(_, value)| *value);
                    path.push(PathSegment::Field(field.name().to_string()));
                    let value = self.coerce_member(supplied, field, path, errors);
                    path.pop();
                    if let Some(value) = value {
                        values.push((field.name().to_string(), value));
                    }
                }
                if errors.len() > before {
                    return None;
                }
                if self.deferred_variables {
                    return Some(CoercedValue::Null);
                }
                match InputShape::construct(&input_type.shape, values) {
                    Ok(object) => Some(CoercedValue::Object(object)),
                    Err(messages) => {
                        errors.extend(
                            messages
                                .into_iter()
                                .map(|m| CoercionError::new(m, path.clone())),
                        );
                        None
                    }
                }
            }
            Definition::Scalar(scalar) => {
                let Some(value) = input.to_const() else {
                    if self.deferred_variables {
                        return Some(CoercedValue::Null);
                    }
                    errors.push(CoercionError::new(
                        format!(
                            "Variables cannot be used inside a literal of custom scalar {}",
                            scalar.header.name
                        ),
                        path.clone(),
                    ));
                    return None;
                };
                match scalar.coerce_input(&value) {
                    Ok(value) => Some(CoercedValue::Custom(value)),
                    Err(message) => {
                        errors.push(CoercionError::new(message, path.clone()));
                        None
                    }
                }
            }
            other => {
                errors.push(CoercionError::new(
                    format!("`{}` is not an input type", other.name()),
                    path.clone(),
                ));
                None
            }
        }
    }
}
