//! The schema build pass.
//!
//! Walks every declaration reachable from the schema roots, the builtin
//! directives and (with introspection enabled) the introspection types,
//! building each definition through the shared [`DefinitionBuilder`]. On the
//! way it checks public name uniqueness, member kinds, default values and
//! directive applications. Declarations that are never reached are neither
//! built nor validated.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::defaults::check_default;
use super::definitions::DefinitionBuilder;
use super::graph::{NamedType, SchemaGraph};
use super::names::NameIndex;
use crate::coercion::{Coercer, Input};
use crate::config::SchemaConfig;
use crate::definition::{
    Definition, DefinitionKind, DirectiveApplication, DirectiveLocation, FieldDefinition,
    InputValueDefinition, ObjectTypeDefinition, SchemaDeclaration, SchemaDefinition,
};
use crate::error::SchemaError;
use crate::types::{BaseType, BuiltinScalar, TypeHandle, TypeRef};
use crate::visibility::VisibilityHandle;

/// Builds and validates the schema graph for `declaration`.
pub(crate) fn build_graph(
    builder: Arc<DefinitionBuilder>,
    declaration: &SchemaDeclaration,
    config: &SchemaConfig,
) -> Result<SchemaGraph, SchemaError> {
    config.validate().map_err(SchemaError::Config)?;
    debug!("Starting schema build");

    let query = root_object(&builder, declaration.query())?;
    let mutation = declaration
        .mutation()
        .map(|handle| root_object(&builder, handle))
        .transpose()?;

    let reachable = Reachable::walk(&builder, declaration, config)?;
    debug!(
        types = reachable.types.len(),
        directives = reachable.directives.len(),
        "Collected reachable declarations"
    );

    let mut type_names = NameIndex::new("type");
    let mut directive_names = NameIndex::new("directive");
    for scalar in &reachable.scalars {
        type_names.insert(
            scalar.name(),
            BaseType::Builtin(*scalar),
            &format!("builtin {}", scalar.name()),
        );
    }
    for definition in &reachable.types {
        type_names.insert(
            definition.name(),
            BaseType::Declared(definition.handle()),
            definition.identity(),
        );
    }
    for definition in &reachable.directives {
        directive_names.insert(
            definition.name(),
            BaseType::Declared(definition.handle()),
            definition.identity(),
        );
    }
    type_names.check_unique_names()?;
    directive_names.check_unique_names()?;

    let registry = builder.registry();
    let mut types = IndexMap::new();
    let mut names = HashMap::new();
    for scalar in &reachable.scalars {
        types.insert(scalar.name().to_string(), NamedType::Builtin(*scalar));
    }
    for definition in &reachable.types {
        names.insert(definition.handle(), definition.name().to_string());
        types.insert(
            definition.name().to_string(),
            NamedType::Declared(definition.clone()),
        );
    }
    let mut directives = IndexMap::new();
    for definition in &reachable.directives {
        names.insert(definition.handle(), definition.name().to_string());
        if let Definition::Directive(directive) = definition {
            directives.insert(directive.header.name.clone(), Arc::clone(directive));
        }
    }
    let builtin_directives = registry
        .builtins()
        .directives()
        .iter()
        .filter_map(|handle| names.get(handle).cloned())
        .collect();

    let mut possible_types: HashMap<String, Vec<String>> = HashMap::new();
    for definition in &reachable.types {
        match definition {
            Definition::Object(object) => {
                for interface in &object.interfaces {
                    if let Some(name) = names.get(interface) {
                        possible_types
                            .entry(name.clone())
                            .or_default()
                            .push(object.header.name.clone());
                    }
                }
            }
            Definition::Union(union) => {
                let members = possible_types.entry(union.header.name.clone()).or_default();
                for member in &union.members {
                    if let Some(name) = names.get(member) {
                        members.push(name.clone());
                    }
                }
            }
            _ => {}
        }
    }

    let coercer =
        Coercer::new(&builder).with_implicit_list(config.implicit_list_coercion);
    let mut checker = Checker {
        builder: &builder,
        coercer: &coercer,
        visibilities: IndexMap::new(),
    };
    checker.check_applications(&declaration.directives, DirectiveLocation::Schema, "schema")?;
    for definition in reachable.types.iter().chain(&reachable.directives) {
        checker.check_definition(definition)?;
    }
    let visibilities = checker.visibilities;

    let definition = SchemaDefinition {
        query,
        mutation,
        description: declaration.description.clone(),
        directives: declaration.directives.clone(),
    };

    info!(
        query = %definition.query.header.name,
        types = types.len(),
        directives = directives.len(),
        visibilities = visibilities.len(),
        "Schema graph built"
    );

    Ok(SchemaGraph {
        builder,
        definition,
        types,
        names,
        directives,
        builtin_directives,
        possible_types,
        visibilities,
        config: config.clone(),
        sdl_cache: DashMap::new(),
    })
}

fn root_object(
    builder: &DefinitionBuilder,
    handle: TypeHandle,
) -> Result<Arc<ObjectTypeDefinition>, SchemaError> {
    match builder.definition_of(handle)? {
        Definition::Object(object) => Ok(object),
        other => Err(SchemaError::WrongKind {
            identity: other.identity().to_string(),
            expected: DefinitionKind::Object.describe(),
            found: other.kind().describe(),
        }),
    }
}

/// Declarations reachable from the schema, in discovery order.
struct Reachable {
    scalars: Vec<BuiltinScalar>,
    types: Vec<Definition>,
    directives: Vec<Definition>,
}

impl Reachable {
    fn walk(
        builder: &DefinitionBuilder,
        declaration: &SchemaDeclaration,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let builtins = *builder.registry().builtins();
        let mut queue: VecDeque<TypeHandle> = VecDeque::new();
        queue.push_back(declaration.query());
        queue.extend(declaration.mutation());
        if config.introspection {
            queue.extend(builtins.introspection_types());
        }
        queue.extend(builtins.directives());
        queue.extend(declaration.directives.iter().map(DirectiveApplication::directive));

        let mut seen = HashSet::new();
        let mut scalars = Vec::new();
        let mut types = Vec::new();
        let mut directives = Vec::new();
        while let Some(handle) = queue.pop_front() {
            if !seen.insert(handle) {
                continue;
            }
            let definition = builder.definition_of(handle)?;
            let mut refs = References::default();
            refs.collect(&definition);
            for scalar in refs.scalars {
                if !scalars.contains(&scalar) {
                    scalars.push(scalar);
                }
            }
            queue.extend(refs.handles);
            match definition {
                Definition::Directive(_) => directives.push(definition),
                _ => types.push(definition),
            }
        }
        scalars.sort();
        Ok(Self {
            scalars,
            types,
            directives,
        })
    }
}

/// Handles and builtin scalars one definition refers to.
#[derive(Default)]
struct References {
    handles: Vec<TypeHandle>,
    scalars: Vec<BuiltinScalar>,
}

impl References {
    fn base(&mut self, ty: &TypeRef) {
        match ty.base() {
            BaseType::Builtin(scalar) => self.scalars.push(scalar),
            BaseType::Declared(handle) => self.handles.push(handle),
        }
    }

    fn applications(&mut self, directives: &[DirectiveApplication]) {
        self.handles
            .extend(directives.iter().map(DirectiveApplication::directive));
    }

    fn input_value(&mut self, value: &InputValueDefinition) {
        self.base(value.ty());
        self.applications(value.directives());
    }

    fn field(&mut self, field: &FieldDefinition) {
        self.base(field.ty());
        self.applications(field.directives());
        for argument in field.arguments() {
            self.input_value(argument);
        }
    }

    fn collect(&mut self, definition: &Definition) {
        self.applications(&definition.header().directives);
        match definition {
            Definition::Object(_) | Definition::Interface(_) => {
                for field in definition.fields().into_iter().flat_map(|fields| fields.values()) {
                    self.field(field);
                }
                self.handles.extend_from_slice(definition.interfaces());
            }
            Definition::Union(union) => self.handles.extend_from_slice(&union.members),
            Definition::InputObject(input) => {
                for field in input.fields.values() {
                    self.input_value(field);
                }
            }
            Definition::Enum(enum_type) => {
                for value in enum_type.values.values() {
                    self.applications(value.directives());
                }
            }
            Definition::Directive(directive) => {
                for argument in directive.arguments.values() {
                    self.input_value(argument);
                }
            }
            Definition::Scalar(_) => {}
        }
    }
}

/// Per-element checks over the reachable definitions.
struct Checker<'a> {
    builder: &'a DefinitionBuilder,
    coercer: &'a Coercer<'a>,
    visibilities: IndexMap<String, VisibilityHandle>,
}

impl Checker<'_> {
    fn visibility(&mut self, visibility: Option<&VisibilityHandle>) {
        if let Some(visibility) = visibility {
            self.visibilities
                .entry(visibility.cache_key())
                .or_insert_with(|| visibility.clone());
        }
    }

    fn expect_kind(
        &self,
        ty: &TypeRef,
        accept: fn(DefinitionKind) -> bool,
        expected: &'static str,
    ) -> Result<(), SchemaError> {
        let BaseType::Declared(handle) = ty.base() else {
            return Ok(());
        };
        let registry = self.builder.registry();
        match registry.kind_of(handle) {
            Some(kind) if accept(kind) => Ok(()),
            Some(kind) => Err(SchemaError::WrongKind {
                identity: registry.identity(handle).unwrap_or_default().to_string(),
                expected,
                found: kind.describe(),
            }),
            None => Err(SchemaError::UndefinedHandle {
                identity: registry.identity(handle).unwrap_or_default().to_string(),
            }),
        }
    }

    fn check_applications(
        &mut self,
        applications: &[DirectiveApplication],
        location: DirectiveLocation,
        element: &str,
    ) -> Result<(), SchemaError> {
        for application in applications {
            let directive = match self.builder.definition_of(application.directive())? {
                Definition::Directive(directive) => directive,
                other => {
                    return Err(SchemaError::WrongKind {
                        identity: other.identity().to_string(),
                        expected: DefinitionKind::Directive.describe(),
                        found: other.kind().describe(),
                    });
                }
            };
            let name = directive.header.name.clone();
            if !directive.locations.contains(&location) {
                return Err(SchemaError::MisplacedDirective {
                    directive: name,
                    location: element.to_string(),
                });
            }
            let provided: Vec<(&str, Input<'_>)> = application
                .raw_arguments()
                .iter()
                .map(|(name, value)| (name.as_str(), Input::Const(value)))
                .collect();
            let arguments = self
                .coercer
                .coerce_arguments(&directive.shape, directive.arguments.values(), &provided)
                .map_err(|errors| SchemaError::InvalidDirectiveArguments {
                    directive: name,
                    location: element.to_string(),
                    errors,
                })?;
            application.set_arguments(arguments);
        }
        Ok(())
    }

    fn check_input_value(
        &mut self,
        value: &InputValueDefinition,
        location: DirectiveLocation,
        element: &str,
    ) -> Result<(), SchemaError> {
        self.expect_kind(value.ty(), DefinitionKind::is_input, "an input type")?;
        check_default(self.coercer, value)?;
        self.visibility(value.visibility());
        self.check_applications(value.directives(), location, element)
    }

    fn check_field(&mut self, owner: &str, field: &FieldDefinition) -> Result<(), SchemaError> {
        let element = format!("field `{owner}.{}`", field.name());
        self.expect_kind(field.ty(), DefinitionKind::is_output, "an output type")?;
        self.visibility(field.visibility());
        self.check_applications(field.directives(), DirectiveLocation::FieldDefinition, &element)?;
        for argument in field.arguments() {
            let element = format!("argument `{owner}.{}({}:)`", field.name(), argument.name());
            self.check_input_value(argument, DirectiveLocation::ArgumentDefinition, &element)?;
        }
        Ok(())
    }

    fn check_definition(&mut self, definition: &Definition) -> Result<(), SchemaError> {
        let header = definition.header();
        let name = header.name.as_str();
        self.visibility(header.visibility.as_ref());
        let location = match definition {
            Definition::Object(_) => Some(DirectiveLocation::Object),
            Definition::Interface(_) => Some(DirectiveLocation::Interface),
            Definition::InputObject(_) => Some(DirectiveLocation::InputObject),
            Definition::Union(_) => Some(DirectiveLocation::Union),
            Definition::Enum(_) => Some(DirectiveLocation::Enum),
            Definition::Scalar(_) => Some(DirectiveLocation::Scalar),
            Definition::Directive(_) => None,
        };
        if let Some(location) = location {
            self.check_applications(&header.directives, location, &format!("type `{name}`"))?;
        }

        match definition {
            Definition::Object(_) | Definition::Interface(_) => {
                for field in definition.fields().into_iter().flat_map(|fields| fields.values()) {
                    self.check_field(name, field)?;
                }
            }
            Definition::InputObject(input) => {
                for field in input.fields.values() {
                    let element = format!("input field `{name}.{}`", field.name());
                    self.check_input_value(
                        field,
                        DirectiveLocation::InputFieldDefinition,
                        &element,
                    )?;
                }
            }
            Definition::Union(union) => {
                let registry = self.builder.registry();
                for member in &union.members {
                    match registry.kind_of(*member) {
                        Some(DefinitionKind::Object) => {}
                        Some(kind) => {
                            return Err(SchemaError::WrongKind {
                                identity: registry.identity(*member).unwrap_or_default().to_string(),
                                expected: DefinitionKind::Object.describe(),
                                found: kind.describe(),
                            });
                        }
                        None => {
                            return Err(SchemaError::UndefinedHandle {
                                identity: registry.identity(*member).unwrap_or_default().to_string(),
                            });
                        }
                    }
                }
            }
            Definition::Enum(enum_type) => {
                for value in enum_type.values.values() {
                    self.visibility(value.visibility());
                    let element = format!("enum value `{name}.{}`", value.name());
                    self.check_applications(value.directives(), DirectiveLocation::EnumValue, &element)?;
                }
            }
            Definition::Directive(directive) => {
                for argument in directive.arguments.values() {
                    let element = format!("argument `@{name}({}:)`", argument.name());
                    self.check_input_value(
                        argument,
                        DirectiveLocation::ArgumentDefinition,
                        &element,
                    )?;
                }
            }
            Definition::Scalar(_) => {}
        }
        Ok(())
    }
}
