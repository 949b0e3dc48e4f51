//! Query document validation.
//!
//! Rules run against the schema as visible to the request, so a field hidden
//! by a visibility predicate is reported as unknown exactly like a field that
//! was never declared. Messages follow the wording common to GraphQL
//! servers.

use std::collections::HashSet;

use async_graphql_parser::types::{
    BaseType as ParsedBaseType, Directive, ExecutableDocument, FragmentDefinition,
    OperationDefinition, OperationType, Selection, SelectionSet, Type,
};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::{Name, Value};

use crate::coercion::{Coercer, Input};
use crate::definition::{DirectiveLocation, InputValueDefinition};
use crate::error::{Location, PathSegment, ValidationError};
use crate::schema::graph::NamedType;
use crate::types::{BaseType, TypeRef};
use crate::visibility::ScopedSchema;

/// Why a variable's declared type could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeLookup {
    Unknown(String),
    NotInput(String),
}

/// Resolves a variable's declared type to an input type reference.
pub(crate) fn input_type(scope: &ScopedSchema<'_>, ty: &Type) -> Result<TypeRef, TypeLookup> {
    let required = !ty.nullable;
    match &ty.base {
        ParsedBaseType::List(inner) => Ok(TypeRef::list_of(input_type(scope, inner)?, required)),
        ParsedBaseType::Named(name) => {
            let named = scope
                .type_by_name(name.as_str())
                .ok_or_else(|| TypeLookup::Unknown(name.to_string()))?;
            if !named.is_input() {
                return Err(TypeLookup::NotInput(name.to_string()));
            }
            let base = match named {
                NamedType::Builtin(scalar) => BaseType::Builtin(*scalar),
                NamedType::Declared(definition) => BaseType::Declared(definition.handle()),
            };
            Ok(TypeRef::Named { base, required })
        }
    }
}

/// Picks the operation to run.
pub(crate) fn select_operation<'d>(
    document: &'d ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'d Positioned<OperationDefinition>, ValidationError> {
    match operation_name {
        Some(wanted) => document
            .operations
            .iter()
            .find(|(name, _)| name.is_some_and(|n| n.as_str() == wanted))
            .map(|(_, operation)| operation)
            .ok_or_else(|| {
                ValidationError::new(format!("Unknown operation named \"{wanted}\"."), Vec::new())
            }),
        None => {
            let mut operations = document.operations.iter();
            match (operations.next(), operations.next()) {
                (Some((_, operation)), None) => Ok(operation),
                (None, _) => Err(ValidationError::new("Must provide an operation.", Vec::new())),
                (Some(_), Some(_)) => Err(ValidationError::new(
                    "Must provide operation name if query contains multiple operations.",
                    Vec::new(),
                )),
            }
        }
    }
}

/// Validates every operation and fragment of `document`.
pub(crate) fn validate_document(
    scope: &ScopedSchema<'_>,
    document: &ExecutableDocument,
) -> Vec<ValidationError> {
    let mut validator = Validator {
        scope,
        document,
        errors: Vec::new(),
        seen: HashSet::new(),
    };
    for (_, operation) in document.operations.iter() {
        validator.operation(operation);
    }
    validator.fragments();
    validator.errors
}

fn locations(pos: Pos) -> Vec<Location> {
    vec![pos.into()]
}

fn collect_variables<'v>(value: &'v Value, pos: Pos, out: &mut Vec<(&'v Name, Pos)>) {
    match value {
        Value::Variable(name) => out.push((name, pos)),
        Value::List(items) => {
            for item in items {
                collect_variables(item, pos, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_variables(item, pos, out);
            }
        }
        _ => {}
    }
}

/// Per-operation walk state.
#[derive(Default)]
struct Walk<'d> {
    used_variables: Vec<(&'d Name, Pos)>,
    fragment_stack: Vec<&'d str>,
    max_depth: usize,
}

struct Validator<'s, 'g, 'd> {
    scope: &'s ScopedSchema<'g>,
    document: &'d ExecutableDocument,
    errors: Vec<ValidationError>,
    seen: HashSet<(String, Vec<Location>, Vec<PathSegment>)>,
}

impl<'s, 'g, 'd> Validator<'s, 'g, 'd> {
    fn report(&mut self, message: impl Into<String>, locations: Vec<Location>) {
        self.report_at(message, locations, Vec::new());
    }

    /// Reports once per message, location and input path.
    fn report_at(
        &mut self,
        message: impl Into<String>,
        locations: Vec<Location>,
        path: Vec<PathSegment>,
    ) {
        let message = message.into();
        if self.seen.insert((message.clone(), locations.clone(), path)) {
            self.errors.push(ValidationError::new(message, locations));
        }
    }

    fn coercer(&self) -> Coercer<'g> {
        let graph = self.scope.graph();
        Coercer::new(graph.builder())
            .with_implicit_list(graph.config().implicit_list_coercion)
            .with_deferred_variables()
    }

    fn operation(&mut self, operation: &'d Positioned<OperationDefinition>) {
        let definition = &operation.node;
        let graph = self.scope.graph();
        let (root, location) = match definition.ty {
            OperationType::Query => (Some(graph.query_type()), DirectiveLocation::Query),
            OperationType::Mutation => (graph.mutation_type(), DirectiveLocation::Mutation),
            OperationType::Subscription => {
                self.report("Subscriptions are not supported.", locations(operation.pos));
                return;
            }
        };
        let Some(root) = root.filter(|name| self.scope.type_by_name(name).is_some()) else {
            self.report("Schema is not configured for mutations.", locations(operation.pos));
            return;
        };

        let mut walk = Walk::default();
        self.directives(&definition.directives, location, &mut walk);

        let mut declared = HashSet::new();
        for variable in &definition.variable_definitions {
            let name = variable.node.name.node.as_str();
            declared.insert(name);
            match input_type(self.scope, &variable.node.var_type.node) {
                Ok(_) => {}
                Err(TypeLookup::Unknown(ty)) => {
                    self.report(format!("Unknown type \"{ty}\"."), locations(variable.node.var_type.pos));
                }
                Err(TypeLookup::NotInput(_)) => {
                    self.report(
                        format!(
                            "Variable \"${name}\" cannot be non-input type \"{}\".",
                            variable.node.var_type.node
                        ),
                        locations(variable.pos),
                    );
                }
            }
        }

        self.selection_set(&definition.selection_set, root, 0, true, &mut walk);

        let max_depth = graph.config().max_depth;
        if walk.max_depth > max_depth {
            self.report(
                format!(
                    "Query has depth of {}, which exceeds max depth of {max_depth}",
                    walk.max_depth
                ),
                locations(operation.pos),
            );
        }

        let mut used = HashSet::new();
        for (name, pos) in walk.used_variables {
            used.insert(name.as_str());
            if !declared.contains(name.as_str()) {
                self.report(format!("Variable \"${name}\" is not defined."), locations(pos));
            }
        }
        for variable in &definition.variable_definitions {
            let name = variable.node.name.node.as_str();
            if !used.contains(name) {
                self.report(format!("Variable \"${name}\" is never used."), locations(variable.pos));
            }
        }
    }

    /// `depth` is the depth of the enclosing field. Fields below `__schema`
    /// and `__type` do not count towards it.
    fn selection_set(
        &mut self,
        set: &'d Positioned<SelectionSet>,
        parent: &str,
        depth: usize,
        counting: bool,
        walk: &mut Walk<'d>,
    ) {
        for selection in &set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    let node = &field.node;
                    let name = node.name.node.as_str();
                    let counting = counting && name != "__schema" && name != "__type";
                    let depth = if counting { depth + 1 } else { depth };
                    walk.max_depth = walk.max_depth.max(depth);
                    self.directives(&node.directives, DirectiveLocation::Field, walk);
                    for (_, value) in &node.arguments {
                        collect_variables(&value.node, value.pos, &mut walk.used_variables);
                    }

                    if name == "__typename" {
                        if !node.selection_set.node.items.is_empty() {
                            self.report(
                                format!("Field \"{name}\" must not have a selection since type \"String!\" has no subfields."),
                                locations(field.pos),
                            );
                        }
                        continue;
                    }
                    let Some(definition) = self.scope.field(parent, name) else {
                        self.report(
                            format!("Cannot query field \"{name}\" on type \"{parent}\"."),
                            locations(field.pos),
                        );
                        continue;
                    };

                    let arguments: Vec<&InputValueDefinition> =
                        self.scope.arguments(definition).collect();
                    self.arguments(
                        &format!("field \"{parent}.{name}\""),
                        &format!("Field \"{name}\""),
                        &arguments,
                        &node.arguments,
                        field.pos,
                    );

                    let graph = self.scope.graph();
                    let Some(field_type) = graph.named(definition.ty().base()) else {
                        continue;
                    };
                    let has_selection = !node.selection_set.node.items.is_empty();
                    if field_type.is_leaf() && has_selection {
                        self.report(
                            format!(
                                "Field \"{name}\" must not have a selection since type \"{}\" has no subfields.",
                                graph.render(definition.ty())
                            ),
                            locations(field.pos),
                        );
                    } else if field_type.is_composite() {
                        if has_selection {
                            self.selection_set(
                                &node.selection_set,
                                field_type.name(),
                                depth,
                                counting,
                                walk,
                            );
                        } else {
                            self.report(
                                format!(
                                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                                    graph.render(definition.ty())
                                ),
                                locations(field.pos),
                            );
                        }
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    self.directives(&spread.node.directives, DirectiveLocation::FragmentSpread, walk);
                    let Some((key, fragment)) = self.document.fragments.get_key_value(name) else {
                        self.report(format!("Unknown fragment \"{name}\"."), locations(spread.pos));
                        continue;
                    };
                    if walk.fragment_stack.contains(&name) {
                        continue;
                    }
                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    let Some(target) = self.composite(condition) else {
                        continue;
                    };
                    walk.fragment_stack.push(key.as_str());
                    self.selection_set(&fragment.node.selection_set, target, depth, counting, walk);
                    walk.fragment_stack.pop();
                }
                Selection::InlineFragment(inline) => {
                    self.directives(&inline.node.directives, DirectiveLocation::InlineFragment, walk);
                    let target = match &inline.node.type_condition {
                        Some(condition) => {
                            let on = condition.node.on.node.as_str();
                            match self.composite(on) {
                                Some(target) => target,
                                None => {
                                    self.condition_error(on, condition.pos);
                                    continue;
                                }
                            }
                        }
                        None => parent,
                    };
                    self.selection_set(&inline.node.selection_set, target, depth, counting, walk);
                }
            }
        }
    }

    /// The name of a visible composite type.
    fn composite(&self, name: &str) -> Option<&'g str> {
        self.scope
            .type_by_name(name)
            .filter(|ty| ty.is_composite())
            .map(NamedType::name)
    }

    fn condition_error(&mut self, name: &str, pos: Pos) {
        if self.scope.type_by_name(name).is_some() {
            self.report(
                format!("Fragment cannot condition on non composite type \"{name}\"."),
                locations(pos),
            );
        } else {
            self.report(format!("Unknown type \"{name}\"."), locations(pos));
        }
    }

    /// Known, required and well-typed arguments of a field or directive.
    fn arguments(
        &mut self,
        owner: &str,
        subject: &str,
        definitions: &[&InputValueDefinition],
        provided: &[(Positioned<Name>, Positioned<Value>)],
        pos: Pos,
    ) {
        let graph = self.scope.graph();
        let coercer = self.coercer();
        for (name, value) in provided {
            let name = name.node.as_str();
            let Some(definition) = definitions.iter().find(|d| d.name() == name) else {
                self.report(format!("Unknown argument \"{name}\" on {owner}."), locations(value.pos));
                continue;
            };
            if let Err(errors) = coercer.coerce(Input::Literal(&value.node), definition.ty()) {
                for error in errors {
                    self.report_at(error.message, locations(value.pos), error.path);
                }
            }
        }
        for definition in definitions {
            let supplied = provided.iter().any(|(name, _)| name.node.as_str() == definition.name());
            if !supplied && definition.is_required() {
                self.report(
                    format!(
                        "{subject} argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        definition.name(),
                        graph.render(definition.ty())
                    ),
                    locations(pos),
                );
            }
        }
    }

    fn directives(
        &mut self,
        directives: &'d [Positioned<Directive>],
        location: DirectiveLocation,
        walk: &mut Walk<'d>,
    ) {
        for directive in directives {
            let name = directive.node.name.node.as_str();
            for (_, value) in &directive.node.arguments {
                collect_variables(&value.node, value.pos, &mut walk.used_variables);
            }
            let definition = self
                .scope
                .graph()
                .directive(name)
                .filter(|d| self.scope.allows(d.header.visibility.as_ref()));
            let Some(definition) = definition else {
                self.report(format!("Unknown directive \"@{name}\"."), locations(directive.pos));
                continue;
            };
            if !definition.locations.contains(&location) {
                self.report(
                    format!("Directive \"@{name}\" may not be used on {}.", location.as_str()),
                    locations(directive.pos),
                );
                continue;
            }
            let arguments: Vec<&InputValueDefinition> = definition
                .arguments
                .values()
                .filter(|a| self.scope.input_value_visible(a))
                .collect();
            self.arguments(
                &format!("directive \"@{name}\""),
                &format!("Directive \"@{name}\""),
                &arguments,
                &directive.node.arguments,
                directive.pos,
            );
        }
    }

    fn fragments(&mut self) {
        let mut spread_anywhere = HashSet::new();
        for (_, operation) in self.document.operations.iter() {
            spreads(&operation.node.selection_set.node, &mut spread_anywhere);
        }

        let mut nested = HashSet::new();
        for fragment in self.document.fragments.values() {
            spreads(&fragment.node.selection_set.node, &mut nested);
        }

        let mut names: Vec<&'d Name> = self.document.fragments.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for name in names {
            let Some(fragment) = self.document.fragments.get(name) else {
                continue;
            };
            let condition = &fragment.node.type_condition;
            let on = condition.node.on.node.as_str();
            if self.composite(on).is_none() {
                self.condition_error(on, condition.pos);
            }
            if self.reaches(name.as_str(), &fragment.node) {
                self.report(
                    format!("Cannot spread fragment \"{name}\" within itself."),
                    locations(fragment.pos),
                );
            }
            if !spread_anywhere.contains(name.as_str()) && !nested.contains(name.as_str()) {
                self.report(format!("Fragment \"{name}\" is never used."), locations(fragment.pos));
            }
        }
    }

    /// Whether spreading `fragment` eventually spreads `target` again.
    fn reaches(&self, target: &str, fragment: &FragmentDefinition) -> bool {
        let mut visited = HashSet::new();
        let mut pending = HashSet::new();
        spreads(&fragment.selection_set.node, &mut pending);
        while let Some(next) = pending.iter().next().cloned() {
            pending.remove(&next);
            if next == target {
                return true;
            }
            if !visited.insert(next.clone()) {
                continue;
            }
            if let Some(definition) = self.document.fragments.get(next.as_str()) {
                spreads(&definition.node.selection_set.node, &mut pending);
            }
        }
        false
    }
}

/// Names of the fragments spread directly in `set` (including inside inline
/// fragments and sub-selections).
fn spreads(set: &SelectionSet, out: &mut HashSet<String>) {
    for selection in &set.items {
        match &selection.node {
            Selection::Field(field) => spreads(&field.node.selection_set.node, out),
            Selection::FragmentSpread(spread) => {
                out.insert(spread.node.fragment_name.node.to_string());
            }
            Selection::InlineFragment(inline) => spreads(&inline.node.selection_set.node, out),
        }
    }
}
