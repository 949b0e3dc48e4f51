//! Serial query execution.
//!
//! Fields are resolved one after another in document order. Every resolved
//! value is completed against the field's declared type: leaves are coerced
//! to their serialized form, objects recurse into their sub-selection and
//! abstract types are narrowed through the resolver's reported type name.
//! A failure at a non-null position turns the nearest nullable ancestor into
//! `null`; errors are collected with their response path and never abort the
//! request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_graphql_parser::types::{
    Directive, ExecutableDocument, Field, OperationDefinition, OperationType, Selection,
    SelectionSet,
};
use async_graphql_parser::{Pos, Positioned, parse_query};
use async_graphql_value::{ConstValue, Name, Value};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use tracing::debug;

use super::request::{ExecutionResult, Request};
use super::validation::{input_type, select_operation, validate_document};
use crate::coercion::{Coercer, Input, Variables};
use crate::context::ResolverContext;
use crate::definition::{Definition, FieldDefinition};
use crate::error::{CoercionError, ExecutionError, Location, PathSegment, SchemaError};
use crate::json::{const_to_json, json_to_const};
use crate::resolvers::introspection::{SchemaResolver, TypeResolver};
use crate::resolvers::{Resolved, Resolver, RootValue};
use crate::schema::graph::{NamedType, SchemaGraph};
use crate::types::{Arguments, CoercedValue, TypeRef};
use crate::visibility::ScopedSchema;

/// A position became `null` because of an error that was already recorded.
#[derive(Debug)]
struct Bubble;

type Completion = Result<ConstValue, Bubble>;

/// Runs `request` against `graph`.
///
/// Only a failing visibility predicate reached by the request is returned as
/// an error; everything else ends up in the result's error list.
pub(crate) async fn execute(
    graph: &SchemaGraph,
    request: Request,
    root: &RootValue,
) -> Result<ExecutionResult, SchemaError> {
    let scope = ScopedSchema::new(graph, &request.context);

    let document = match parse_query(&request.query) {
        Ok(document) => document,
        Err(err) => {
            let locations = err.positions().map(Location::from).collect();
            return Ok(ExecutionResult::failed(vec![
                ExecutionError::new(err.to_string()).with_locations(locations),
            ]));
        }
    };

    let errors = validate_document(&scope, &document);
    scope.check()?;
    if !errors.is_empty() {
        debug!(count = errors.len(), "Query failed validation");
        return Ok(ExecutionResult::failed(
            errors.into_iter().map(ExecutionError::from).collect(),
        ));
    }

    let operation = match select_operation(&document, request.operation_name.as_deref()) {
        Ok(operation) => operation,
        Err(err) => return Ok(ExecutionResult::failed(vec![err.into()])),
    };

    let variables = coerce_variables(&scope, &operation.node, &request.variables);
    scope.check()?;
    let variables = match variables {
        Ok(variables) => variables,
        Err(errors) => return Ok(ExecutionResult::failed(errors)),
    };

    let (resolver, root_type) = match operation.node.ty {
        OperationType::Mutation => match (root.mutation(), graph.mutation_type()) {
            (Some(resolver), Some(name)) => (Arc::clone(resolver), name),
            _ => {
                return Ok(ExecutionResult::failed(vec![ExecutionError::new(
                    "No mutation root value was provided",
                )]));
            }
        },
        _ => (Arc::clone(root.query()), graph.query_type()),
    };
    debug!(
        operation = request.operation_name.as_deref().unwrap_or("<anonymous>"),
        root = root_type,
        "Executing operation"
    );

    let executor = Executor {
        scope: &scope,
        document: &document,
        variables,
        context: ResolverContext {
            request: &request.context,
            schema: &scope,
        },
        errors: Mutex::new(Vec::new()),
    };
    let data = executor
        .complete_object(
            resolver,
            root_type,
            vec![&operation.node.selection_set.node],
            Vec::new(),
        )
        .await
        .unwrap_or(ConstValue::Null);

    scope.check()?;
    let errors = executor
        .errors
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    Ok(ExecutionResult {
        data: const_to_json(&data),
        errors,
    })
}

/// Coerces the raw request variables against the operation's declarations.
fn coerce_variables(
    scope: &ScopedSchema<'_>,
    operation: &OperationDefinition,
    raw: &serde_json::Map<String, serde_json::Value>,
) -> Result<Variables, Vec<ExecutionError>> {
    let graph = scope.graph();
    let coercer =
        Coercer::new(graph.builder()).with_implicit_list(graph.config().implicit_list_coercion);
    let mut variables = Variables::new();
    let mut errors = Vec::new();

    for definition in &operation.variable_definitions {
        let name = definition.node.name.node.as_str();
        let location = vec![Location::from(definition.pos)];
        let Ok(ty) = input_type(scope, &definition.node.var_type.node) else {
            continue;
        };
        let value = match (raw.get(name), &definition.node.default_value) {
            (None, Some(default)) => default.node.clone(),
            (Some(serde_json::Value::Null) | None, _) if ty.is_required() => {
                errors.push(
                    ExecutionError::new(format!(
                        "Received `null` for ${name}, which is invalid for {}",
                        graph.render(&ty)
                    ))
                    .with_locations(location),
                );
                continue;
            }
            (Some(value), _) => json_to_const(value.clone()),
            (None, None) => continue,
        };
        match coercer.coerce(Input::Const(&value), &ty) {
            Ok(coerced) => {
                variables.insert(name.to_string(), coerced);
            }
            Err(failures) => errors.extend(failures.into_iter().map(|failure| {
                let mut path = vec![PathSegment::Field(name.to_string())];
                path.extend(failure.path);
                ExecutionError::new(failure.message)
                    .with_locations(location.clone())
                    .with_path(path)
            })),
        }
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

/// Null for a field that failed, bubbling when the field is non-null.
fn null_for(definition: &FieldDefinition) -> Completion {
    if definition.ty().is_required() {
        Err(Bubble)
    } else {
        Ok(ConstValue::Null)
    }
}

fn field_path(path: &[PathSegment], key: &str) -> Vec<PathSegment> {
    let mut path = path.to_vec();
    path.push(PathSegment::Field(key.to_string()));
    path
}

struct Executor<'e> {
    scope: &'e ScopedSchema<'e>,
    document: &'e ExecutableDocument,
    variables: Variables,
    context: ResolverContext<'e>,
    errors: Mutex<Vec<ExecutionError>>,
}

impl<'e> Executor<'e> {
    fn record(&self, message: impl Into<String>, path: Vec<PathSegment>, pos: Pos) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(
                ExecutionError::new(message)
                    .with_path(path)
                    .with_locations(vec![pos.into()]),
            );
    }

    /// Evaluates `@skip` and `@include`.
    fn included(&self, directives: &[Positioned<Directive>]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .node
                .arguments
                .iter()
                .find(|(name, _)| name.node.as_str() == "if")
                .and_then(|(_, value)| match &value.node {
                    Value::Boolean(b) => Some(*b),
                    Value::Variable(name) => self
                        .variables
                        .get(name.as_str())
                        .and_then(CoercedValue::as_bool),
                    _ => None,
                });
            match directive.node.name.node.as_str() {
                "skip" => condition != Some(true),
                "include" => condition == Some(true),
                _ => true,
            }
        })
    }

    fn fragment_applies(&self, condition: &str, object_type: &str) -> bool {
        condition == object_type || self.scope.is_possible_type(condition, object_type)
    }

    /// Groups the fields selected on `object_type` by response key.
    fn collect_fields<'a>(
        &'a self,
        object_type: &str,
        set: &'a SelectionSet,
        fields: &mut IndexMap<String, Vec<&'a Positioned<Field>>>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in &set.items {
            match &selection.node {
                Selection::Field(field) => {
                    if !self.included(&field.node.directives) {
                        continue;
                    }
                    let key = field
                        .node
                        .alias
                        .as_ref()
                        .unwrap_or(&field.node.name)
                        .node
                        .to_string();
                    fields.entry(key).or_default().push(field);
                }
                Selection::FragmentSpread(spread) => {
                    if !self.included(&spread.node.directives) {
                        continue;
                    }
                    let name = spread.node.fragment_name.node.as_str();
                    let Some((key, fragment)) = self.document.fragments.get_key_value(name) else {
                        continue;
                    };
                    if !visited.insert(key.as_str()) {
                        continue;
                    }
                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    if self.fragment_applies(condition, object_type) {
                        self.collect_fields(
                            object_type,
                            &fragment.node.selection_set.node,
                            fields,
                            visited,
                        );
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !self.included(&inline.node.directives) {
                        continue;
                    }
                    let applies = inline.node.type_condition.as_ref().is_none_or(|condition| {
                        self.fragment_applies(condition.node.on.node.as_str(), object_type)
                    });
                    if applies {
                        self.collect_fields(
                            object_type,
                            &inline.node.selection_set.node,
                            fields,
                            visited,
                        );
                    }
                }
            }
        }
    }

    fn complete_object<'a>(
        &'a self,
        resolver: Arc<dyn Resolver>,
        object_type: &'a str,
        selections: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Completion> {
        async move {
            let mut grouped = IndexMap::new();
            let mut visited = HashSet::new();
            for set in selections {
                self.collect_fields(object_type, set, &mut grouped, &mut visited);
            }

            let mut object = IndexMap::new();
            for (key, fields) in grouped {
                let value = self
                    .execute_field(&resolver, object_type, &key, &fields, &path)
                    .await?;
                object.insert(Name::new(&key), value);
            }
            Ok(ConstValue::Object(object))
        }
        .boxed()
    }

    async fn execute_field<'a>(
        &'a self,
        resolver: &Arc<dyn Resolver>,
        object_type: &'a str,
        key: &str,
        fields: &[&'a Positioned<Field>],
        path: &[PathSegment],
    ) -> Completion {
        let Some(first) = fields.first() else {
            return Ok(ConstValue::Null);
        };
        let name = first.node.name.node.as_str();
        let path = field_path(path, key);
        if name == "__typename" {
            return Ok(ConstValue::String(object_type.to_string()));
        }

        let Some(definition) = self.scope.field(object_type, name) else {
            self.record(
                format!("Cannot query field \"{name}\" on type \"{object_type}\"."),
                path,
                first.pos,
            );
            return Ok(ConstValue::Null);
        };
        let label = format!("{object_type}.{name}");

        let resolved = match self.arguments(definition, &first.node.arguments) {
            Ok(arguments) => self.resolve(resolver, object_type, definition, &arguments).await,
            Err(failures) => {
                for failure in failures {
                    self.record(failure.message, path.clone(), first.pos);
                }
                return null_for(definition);
            }
        };
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(message) => {
                self.record(message, path, first.pos);
                return null_for(definition);
            }
        };

        let selections: Vec<&'a SelectionSet> =
            fields.iter().map(|f| &f.node.selection_set.node).collect();
        self.complete_value(definition.ty(), resolved, selections, path, &label, first.pos)
            .await
    }

    /// Coerces a field's literal arguments, keyed by parameter name.
    fn arguments(
        &self,
        definition: &FieldDefinition,
        provided: &[(Positioned<Name>, Positioned<Value>)],
    ) -> Result<Arguments, Vec<CoercionError>> {
        let graph = self.scope.graph();
        let coercer = Coercer::new(graph.builder())
            .with_implicit_list(graph.config().implicit_list_coercion)
            .with_variables(&self.variables);
        let mut arguments = Arguments::new();
        let mut errors = Vec::new();
        for argument in definition.arguments() {
            if !self.scope.input_value_visible(argument) {
                continue;
            }
            let supplied = provided
                .iter()
                .find(|(name, _)| name.node.as_str() == argument.name())
                .map(|(_, value)| Input::Literal(&value.node))
                .filter(|input| !coercer.is_absent(*input));
            let input = match (supplied, argument.default_value()) {
                (Some(input), _) => input,
                (None, Some(default)) => Input::Const(default),
                (None, None) => continue,
            };
            let path = vec![PathSegment::Field(argument.name().to_string())];
            match coercer.coerce_at(input, argument.ty(), path) {
                Ok(value) => arguments.insert(argument.parameter_name(), value),
                Err(failures) => errors.extend(failures),
            }
        }
        if errors.is_empty() {
            Ok(arguments)
        } else {
            Err(errors)
        }
    }

    async fn resolve(
        &self,
        resolver: &Arc<dyn Resolver>,
        object_type: &str,
        definition: &FieldDefinition,
        arguments: &Arguments,
    ) -> Result<Resolved, String> {
        if definition.is_meta() {
            return Ok(match definition.name() {
                "__schema" => Resolved::object(SchemaResolver),
                _ => arguments
                    .str("name")
                    .and_then(|name| self.scope.type_by_name(name))
                    .map_or(Resolved::Null, |ty| TypeResolver::named(ty.name())),
            });
        }
        let method = definition.resolver_method_name();
        if !resolver.responds_to(method) {
            return Err(format!(
                "`{object_type}` resolver does not implement `{method}`"
            ));
        }
        resolver
            .call(method, arguments, &self.context)
            .await
            .map_err(|err| err.message)
    }

    /// Completes `resolved` against `ty`, applying the non-null rule of the
    /// outermost level.
    fn complete_value<'a>(
        &'a self,
        ty: &'a TypeRef,
        resolved: Resolved,
        selections: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
        label: &'a str,
        pos: Pos,
    ) -> BoxFuture<'a, Completion> {
        async move {
            let result = self
                .complete_inner(ty, resolved, selections, path.clone(), label, pos)
                .await;
            if ty.is_required() {
                if matches!(result, Ok(ConstValue::Null)) {
                    self.record(
                        format!("Cannot return null for non-nullable field {label}."),
                        path,
                        pos,
                    );
                    return Err(Bubble);
                }
                result
            } else {
                Ok(result.unwrap_or(ConstValue::Null))
            }
        }
        .boxed()
    }

    async fn complete_inner<'a>(
        &'a self,
        ty: &'a TypeRef,
        resolved: Resolved,
        selections: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
        label: &'a str,
        pos: Pos,
    ) -> Completion {
        if resolved.is_null() {
            return Ok(ConstValue::Null);
        }
        let base = match ty {
            TypeRef::List { inner, .. } => {
                let Resolved::List(items) = resolved else {
                    self.record(format!("Expected a list for field {label}"), path, pos);
                    return Err(Bubble);
                };
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::Index(index));
                    let value = self
                        .complete_value(inner, item, selections.clone(), item_path, label, pos)
                        .await?;
                    values.push(value);
                }
                return Ok(ConstValue::List(values));
            }
            TypeRef::Named { base, .. } => *base,
        };

        let graph = self.scope.graph();
        let Some(named) = graph.named(base) else {
            self.record(format!("Unknown type for field {label}"), path, pos);
            return Err(Bubble);
        };
        let leaf = match named {
            NamedType::Builtin(scalar) => match resolved {
                Resolved::Value(value) => scalar.coerce_result(&value),
                other => Err(format!("{} cannot represent value: {other:?}", scalar.name())),
            },
            NamedType::Declared(Definition::Enum(enum_type)) => {
                let member = match &resolved {
                    Resolved::Value(ConstValue::Enum(name)) => Some(name.as_str()),
                    Resolved::Value(ConstValue::String(name)) => Some(name.as_str()),
                    _ => None,
                };
                match member.and_then(|m| enum_type.values.get(m)) {
                    Some(value) if self.scope.enum_value_visible(value) => {
                        Ok(ConstValue::Enum(Name::new(value.name())))
                    }
                    _ => Err(format!(
                        "Enum \"{}\" cannot represent value: {resolved:?}",
                        enum_type.header.name
                    )),
                }
            }
            NamedType::Declared(Definition::Scalar(scalar)) => match &resolved {
                Resolved::Scalar(value) => scalar.coerce_result(value),
                Resolved::Value(value) => scalar
                    .coerce_input(value)
                    .and_then(|internal| scalar.coerce_result(&internal)),
                other => Err(format!(
                    "{} cannot represent value: {other:?}",
                    scalar.header.name
                )),
            },
            NamedType::Declared(Definition::Object(object)) => {
                let Resolved::Object(resolver) = resolved else {
                    self.record(format!("Expected an object for field {label}"), path, pos);
                    return Err(Bubble);
                };
                return self
                    .complete_object(resolver, &object.header.name, selections, path)
                    .await;
            }
            NamedType::Declared(
                definition @ (Definition::Interface(_) | Definition::Union(_)),
            ) => {
                let Resolved::Object(resolver) = resolved else {
                    self.record(format!("Expected an object for field {label}"), path, pos);
                    return Err(Bubble);
                };
                let abstract_type = definition.name();
                let concrete = match resolver.typename() {
                    Some(name) => name.to_string(),
                    None => {
                        self.record(
                            format!(
                                "Abstract type \"{abstract_type}\" must resolve to an Object type at runtime for field {label}. The resolver did not report a type name."
                            ),
                            path,
                            pos,
                        );
                        return Err(Bubble);
                    }
                };
                let Some(object_type) = self
                    .scope
                    .possible_types(abstract_type)
                    .into_iter()
                    .find(|name| *name == concrete)
                else {
                    self.record(
                        format!(
                            "Runtime Object type \"{concrete}\" is not a possible type for \"{abstract_type}\"."
                        ),
                        path,
                        pos,
                    );
                    return Err(Bubble);
                };
                return self
                    .complete_object(resolver, object_type, selections, path)
                    .await;
            }
            NamedType::Declared(other) => Err(format!(
                "`{}` cannot be used as an output type",
                other.name()
            )),
        };

        leaf.map_err(|message| {
            self.record(message, path, pos);
            Bubble
        })
    }
}
