//! The structural diff of two schema models.
//!
//! Elements are matched by name. Every element present on one side only is
//! an addition or a removal; elements present on both sides are compared
//! member by member.

use async_graphql_parser::types::{BaseType, Type};
use indexmap::IndexMap;

use crate::change::{Change, ChangeKind, Criticality};
use crate::model::{
    Composite, DirectiveModel, EnumValueModel, FieldModel, InputValueModel, SchemaModel, Shape,
    TypeModel,
};

/// Change kinds reported for one family of input values.
struct InputKinds {
    noun: &'static str,
    added: ChangeKind,
    removed: ChangeKind,
    type_changed: ChangeKind,
    default_changed: ChangeKind,
    description_changed: Option<ChangeKind>,
}

const FIELD_ARGUMENTS: InputKinds = InputKinds {
    noun: "Argument",
    added: ChangeKind::ArgumentAdded,
    removed: ChangeKind::ArgumentRemoved,
    type_changed: ChangeKind::ArgumentTypeChanged,
    default_changed: ChangeKind::ArgumentDefaultChanged,
    description_changed: Some(ChangeKind::ArgumentDescriptionChanged),
};

const DIRECTIVE_ARGUMENTS: InputKinds = InputKinds {
    noun: "Argument",
    added: ChangeKind::DirectiveArgumentAdded,
    removed: ChangeKind::DirectiveArgumentRemoved,
    type_changed: ChangeKind::DirectiveArgumentTypeChanged,
    default_changed: ChangeKind::DirectiveArgumentDefaultChanged,
    description_changed: None,
};

const INPUT_FIELDS: InputKinds = InputKinds {
    noun: "Input field",
    added: ChangeKind::InputFieldAdded,
    removed: ChangeKind::InputFieldRemoved,
    type_changed: ChangeKind::InputFieldTypeChanged,
    default_changed: ChangeKind::InputFieldDefaultChanged,
    description_changed: Some(ChangeKind::InputFieldDescriptionChanged),
};

/// Every change from `old` to `new`, in discovery order.
pub(crate) fn diff(old: &SchemaModel, new: &SchemaModel) -> Vec<Change> {
    let mut differ = Differ::default();
    differ.roots(old, new);
    differ.types(old, new);
    differ.directives(old, new);
    differ.changes
}

#[derive(Default)]
struct Differ {
    changes: Vec<Change>,
}

impl Differ {
    fn push(
        &mut self,
        kind: ChangeKind,
        criticality: Criticality,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.changes
            .push(Change::new(kind, criticality, path, message));
    }

    fn roots(&mut self, old: &SchemaModel, new: &SchemaModel) {
        let roots = [
            ("query", &old.query, &new.query),
            ("mutation", &old.mutation, &new.mutation),
            ("subscription", &old.subscription, &new.subscription),
        ];
        for (operation, old_root, new_root) in roots {
            match (old_root, new_root) {
                (Some(o), Some(n)) if o != n => self.push(
                    ChangeKind::SchemaRootChanged,
                    Criticality::Breaking,
                    "schema",
                    format!("Schema {operation} root changed from `{o}` to `{n}`"),
                ),
                (Some(o), None) => self.push(
                    ChangeKind::SchemaRootChanged,
                    Criticality::Breaking,
                    "schema",
                    format!("Schema {operation} root `{o}` was removed"),
                ),
                (None, Some(n)) => self.push(
                    ChangeKind::SchemaRootChanged,
                    Criticality::NonBreaking,
                    "schema",
                    format!("Schema {operation} root `{n}` was added"),
                ),
                _ => {}
            }
        }
    }

    fn types(&mut self, old: &SchemaModel, new: &SchemaModel) {
        for (name, old_type) in &old.types {
            if !new.types.contains_key(name) {
                self.push(
                    ChangeKind::TypeRemoved,
                    Criticality::Breaking,
                    name.as_str(),
                    format!("Type `{name}` was removed"),
                );
            } else if let Some(new_type) = new.types.get(name) {
                self.type_changes(old_type, new_type);
            }
        }
        for name in new.types.keys() {
            if !old.types.contains_key(name) {
                self.push(
                    ChangeKind::TypeAdded,
                    Criticality::NonBreaking,
                    name.as_str(),
                    format!("Type `{name}` was added"),
                );
            }
        }
    }

    fn type_changes(&mut self, old: &TypeModel, new: &TypeModel) {
        let name = old.name.as_str();
        if old.description != new.description {
            self.push(
                ChangeKind::TypeDescriptionChanged,
                Criticality::NonBreaking,
                name,
                format!(
                    "Description of type `{name}` changed from `{}` to `{}`",
                    text(&old.description),
                    text(&new.description)
                ),
            );
        }

        match (&old.shape, &new.shape) {
            (Shape::Object(o), Shape::Object(n)) => self.composite(name, "object", o, n),
            (Shape::Interface(o), Shape::Interface(n)) => self.composite(name, "interface", o, n),
            (Shape::Union(o), Shape::Union(n)) => self.union(name, o, n),
            (Shape::Enum(o), Shape::Enum(n)) => self.enum_values(name, o, n),
            (Shape::InputObject(o), Shape::InputObject(n)) => self.input_values(
                &INPUT_FIELDS,
                &format!("input object type `{name}`"),
                name,
                o,
                n,
            ),
            (Shape::Scalar, Shape::Scalar) => {}
            (o, n) => self.push(
                ChangeKind::TypeKindChanged,
                Criticality::Breaking,
                name,
                format!("`{name}` changed from {} to {}", o.kind(), n.kind()),
            ),
        }
    }

    fn composite(&mut self, name: &str, kind: &str, old: &Composite, new: &Composite) {
        for interface in &old.interfaces {
            if !new.interfaces.contains(interface) {
                self.push(
                    ChangeKind::InterfaceRemoved,
                    Criticality::Breaking,
                    name,
                    format!("`{name}` no longer implements interface `{interface}`"),
                );
            }
        }
        for interface in &new.interfaces {
            if !old.interfaces.contains(interface) {
                self.push(
                    ChangeKind::InterfaceAdded,
                    Criticality::Dangerous,
                    name,
                    format!("`{name}` now implements interface `{interface}`"),
                );
            }
        }

        for (field_name, old_field) in &old.fields {
            match new.fields.get(field_name) {
                Some(new_field) => self.field(name, old_field, new_field),
                None => self.push(
                    ChangeKind::FieldRemoved,
                    Criticality::Breaking,
                    format!("{name}.{field_name}"),
                    format!("Field `{field_name}` was removed from {kind} type `{name}`"),
                ),
            }
        }
        for field_name in new.fields.keys() {
            if !old.fields.contains_key(field_name) {
                self.push(
                    ChangeKind::FieldAdded,
                    Criticality::NonBreaking,
                    format!("{name}.{field_name}"),
                    format!("Field `{field_name}` was added to {kind} type `{name}`"),
                );
            }
        }
    }

    fn field(&mut self, type_name: &str, old: &FieldModel, new: &FieldModel) {
        let path = format!("{type_name}.{}", old.name);

        if old.ty.to_string() != new.ty.to_string() {
            let criticality = if is_safe_output_change(&old.ty, &new.ty) {
                Criticality::NonBreaking
            } else {
                Criticality::Breaking
            };
            self.push(
                ChangeKind::FieldTypeChanged,
                criticality,
                path.clone(),
                format!(
                    "Field `{path}` changed type from `{}` to `{}`",
                    old.ty, new.ty
                ),
            );
        }
        if old.description != new.description {
            self.push(
                ChangeKind::FieldDescriptionChanged,
                Criticality::NonBreaking,
                path.clone(),
                format!(
                    "Description of field `{path}` changed from `{}` to `{}`",
                    text(&old.description),
                    text(&new.description)
                ),
            );
        }
        match (&old.deprecation, &new.deprecation) {
            (None, Some(reason)) => self.push(
                ChangeKind::FieldDeprecationAdded,
                Criticality::NonBreaking,
                path.clone(),
                format!("Field `{path}` was deprecated: {reason}"),
            ),
            (Some(_), None) => self.push(
                ChangeKind::FieldDeprecationRemoved,
                Criticality::NonBreaking,
                path.clone(),
                format!("Field `{path}` is no longer deprecated"),
            ),
            _ => {}
        }

        self.input_values(
            &FIELD_ARGUMENTS,
            &format!("field `{path}`"),
            &path,
            &old.arguments,
            &new.arguments,
        );
    }

    fn input_values(
        &mut self,
        kinds: &InputKinds,
        owner: &str,
        path: &str,
        old: &IndexMap<String, InputValueModel>,
        new: &IndexMap<String, InputValueModel>,
    ) {
        let noun = kinds.noun;
        for (name, old_value) in old {
            let value_path = format!("{path}.{name}");
            let Some(new_value) = new.get(name) else {
                self.push(
                    kinds.removed,
                    Criticality::Breaking,
                    value_path,
                    format!("{noun} `{name}` was removed from {owner}"),
                );
                continue;
            };

            if old_value.ty.to_string() != new_value.ty.to_string() {
                let criticality = if is_safe_input_change(&old_value.ty, &new_value.ty) {
                    Criticality::NonBreaking
                } else {
                    Criticality::Breaking
                };
                self.push(
                    kinds.type_changed,
                    criticality,
                    value_path.clone(),
                    format!(
                        "{noun} `{name}` on {owner} changed type from `{}` to `{}`",
                        old_value.ty, new_value.ty
                    ),
                );
            }

            let default_message = match (&old_value.default, &new_value.default) {
                (Some(o), Some(n)) if o != n => Some(format!(
                    "Default value of {} `{name}` on {owner} changed from `{o}` to `{n}`",
                    noun.to_lowercase()
                )),
                (Some(o), None) => Some(format!(
                    "Default value `{o}` was removed from {} `{name}` on {owner}",
                    noun.to_lowercase()
                )),
                (None, Some(n)) => Some(format!(
                    "Default value `{n}` was added to {} `{name}` on {owner}",
                    noun.to_lowercase()
                )),
                _ => None,
            };
            if let Some(message) = default_message {
                self.push(
                    kinds.default_changed,
                    Criticality::Dangerous,
                    value_path.clone(),
                    message,
                );
            }

            if let Some(kind) = kinds.description_changed {
                if old_value.description != new_value.description {
                    self.push(
                        kind,
                        Criticality::NonBreaking,
                        value_path,
                        format!(
                            "Description of {} `{name}` on {owner} changed from `{}` to `{}`",
                            noun.to_lowercase(),
                            text(&old_value.description),
                            text(&new_value.description)
                        ),
                    );
                }
            }
        }

        for (name, new_value) in new {
            if old.contains_key(name) {
                continue;
            }
            let criticality = if new_value.is_required() {
                Criticality::Breaking
            } else {
                Criticality::NonBreaking
            };
            self.push(
                kinds.added,
                criticality,
                format!("{path}.{name}"),
                format!("{noun} `{name}` was added to {owner}"),
            );
        }
    }

    fn union(&mut self, name: &str, old: &[String], new: &[String]) {
        for member in old {
            if !new.contains(member) {
                self.push(
                    ChangeKind::UnionMemberRemoved,
                    Criticality::Breaking,
                    name,
                    format!("Member `{member}` was removed from union type `{name}`"),
                );
            }
        }
        for member in new {
            if !old.contains(member) {
                self.push(
                    ChangeKind::UnionMemberAdded,
                    Criticality::Dangerous,
                    name,
                    format!("Member `{member}` was added to union type `{name}`"),
                );
            }
        }
    }

    fn enum_values(
        &mut self,
        name: &str,
        old: &IndexMap<String, EnumValueModel>,
        new: &IndexMap<String, EnumValueModel>,
    ) {
        for (value, old_value) in old {
            let path = format!("{name}.{value}");
            let Some(new_value) = new.get(value) else {
                self.push(
                    ChangeKind::EnumValueRemoved,
                    Criticality::Breaking,
                    path,
                    format!("Enum value `{value}` was removed from enum `{name}`"),
                );
                continue;
            };
            if old_value.description != new_value.description {
                self.push(
                    ChangeKind::EnumValueDescriptionChanged,
                    Criticality::NonBreaking,
                    path.clone(),
                    format!(
                        "Description of enum value `{path}` changed from `{}` to `{}`",
                        text(&old_value.description),
                        text(&new_value.description)
                    ),
                );
            }
            match (&old_value.deprecation, &new_value.deprecation) {
                (None, Some(reason)) => self.push(
                    ChangeKind::EnumValueDeprecationAdded,
                    Criticality::NonBreaking,
                    path.clone(),
                    format!("Enum value `{path}` was deprecated: {reason}"),
                ),
                (Some(_), None) => self.push(
                    ChangeKind::EnumValueDeprecationRemoved,
                    Criticality::NonBreaking,
                    path.clone(),
                    format!("Enum value `{path}` is no longer deprecated"),
                ),
                _ => {}
            }
        }
        for value in new.keys() {
            if !old.contains_key(value) {
                self.push(
                    ChangeKind::EnumValueAdded,
                    Criticality::Dangerous,
                    format!("{name}.{value}"),
                    format!("Enum value `{value}` was added to enum `{name}`"),
                );
            }
        }
    }

    fn directives(&mut self, old: &SchemaModel, new: &SchemaModel) {
        for (name, old_directive) in &old.directives {
            match new.directives.get(name) {
                Some(new_directive) => self.directive(old_directive, new_directive),
                None => self.push(
                    ChangeKind::DirectiveRemoved,
                    Criticality::Breaking,
                    format!("@{name}"),
                    format!("Directive `@{name}` was removed"),
                ),
            }
        }
        for name in new.directives.keys() {
            if !old.directives.contains_key(name) {
                self.push(
                    ChangeKind::DirectiveAdded,
                    Criticality::NonBreaking,
                    format!("@{name}"),
                    format!("Directive `@{name}` was added"),
                );
            }
        }
    }

    fn directive(&mut self, old: &DirectiveModel, new: &DirectiveModel) {
        let path = format!("@{}", old.name);

        if old.description != new.description {
            self.push(
                ChangeKind::DirectiveDescriptionChanged,
                Criticality::NonBreaking,
                path.clone(),
                format!(
                    "Description of directive `{path}` changed from `{}` to `{}`",
                    text(&old.description),
                    text(&new.description)
                ),
            );
        }
        for location in &old.locations {
            if !new.locations.contains(location) {
                self.push(
                    ChangeKind::DirectiveLocationRemoved,
                    Criticality::Breaking,
                    path.clone(),
                    format!("Location `{location}` was removed from directive `{path}`"),
                );
            }
        }
        for location in &new.locations {
            if !old.locations.contains(location) {
                self.push(
                    ChangeKind::DirectiveLocationAdded,
                    Criticality::NonBreaking,
                    path.clone(),
                    format!("Location `{location}` was added to directive `{path}`"),
                );
            }
        }
        if old.repeatable != new.repeatable {
            let (criticality, message) = if new.repeatable {
                (Criticality::NonBreaking, format!("Directive `{path}` is now repeatable"))
            } else {
                (Criticality::Breaking, format!("Directive `{path}` is no longer repeatable"))
            };
            self.push(ChangeKind::DirectiveRepeatableChanged, criticality, path.clone(), message);
        }

        self.input_values(
            &DIRECTIVE_ARGUMENTS,
            &format!("directive `{path}`"),
            &path,
            &old.arguments,
            &new.arguments,
        );
    }
}

fn text(description: &Option<String>) -> &str {
    description.as_deref().unwrap_or("")
}

fn same_base(old: &BaseType, new: &BaseType, inner: fn(&Type, &Type) -> bool) -> bool {
    match (old, new) {
        (BaseType::Named(o), BaseType::Named(n)) => o == n,
        (BaseType::List(o), BaseType::List(n)) => inner(o, n),
        _ => false,
    }
}

/// A result type may only become stricter: a nullable position may turn
/// non-null, never the reverse.
fn is_safe_output_change(old: &Type, new: &Type) -> bool {
    if !old.nullable && new.nullable {
        return false;
    }
    same_base(&old.base, &new.base, is_safe_output_change)
}

/// An input type may only become more permissive: a non-null position may
/// turn nullable, never the reverse.
fn is_safe_input_change(old: &Type, new: &Type) -> bool {
    if old.nullable && !new.nullable {
        return false;
    }
    same_base(&old.base, &new.base, is_safe_input_change)
}
