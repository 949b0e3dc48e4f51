//! SDL printing.
//!
//! [`print_schema`] renders the part of a schema visible in one scope.
//! Builtin scalars, introspection types and builtin directives are implied
//! by the language and never printed. Types and directives are sorted by
//! name so that two dumps of the same schema compare equal line by line.

use std::fmt::Write as _;

use async_graphql_value::ConstValue;

use crate::coercion::{Coercer, Input};
use crate::definition::{
    Definition, DirectiveApplication, DirectiveDefinition, FieldDefinition, InputValueDefinition,
};
use crate::schema::graph::{NamedType, SchemaGraph};
use crate::visibility::ScopedSchema;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Prints a constant as a query language literal.
pub fn print_value(value: &ConstValue) -> String {
    match value {
        ConstValue::Null => "null".to_string(),
        ConstValue::Number(n) => n.to_string(),
        ConstValue::String(s) => print_string(s),
        ConstValue::Boolean(b) => b.to_string(),
        ConstValue::Enum(name) => name.to_string(),
        ConstValue::List(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        ConstValue::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(name, value)| format!("{}: {}", name, print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        _ => "null".to_string(),
    }
}

fn print_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The default of an input value as a literal, in its coerced form so
/// enum defaults given as strings print as enum values.
pub(crate) fn default_literal(graph: &SchemaGraph, value: &InputValueDefinition) -> Option<String> {
    let default = value.default_value()?;
    let coerced = Coercer::new(graph.builder())
        .with_implicit_list(graph.config().implicit_list_coercion)
        .coerce(Input::Const(default), value.ty())
        .ok()
        .and_then(|coerced| coerced.to_const());
    Some(print_value(coerced.as_ref().unwrap_or(default)))
}

/// Renders the schema as visible in `scope`.
pub fn print_schema(scope: &ScopedSchema<'_>) -> String {
    let graph = scope.graph();
    let mut blocks = Vec::new();

    if let Some(block) = print_schema_block(graph) {
        blocks.push(block);
    }

    let mut directives: Vec<&DirectiveDefinition> = graph
        .directives()
        .values()
        .filter(|d| !graph.is_builtin_directive(&d.header.name))
        .filter(|d| scope.allows(d.header.visibility.as_ref()))
        .map(|d| &**d)
        .collect();
    directives.sort_by(|a, b| a.header.name.cmp(&b.header.name));
    for directive in directives {
        blocks.push(print_directive_definition(scope, directive));
    }

    let mut types: Vec<&Definition> = scope
        .types()
        .filter(|ty| !graph.is_introspection_type(ty.name()))
        .filter_map(NamedType::definition)
        .collect();
    types.sort_by(|a, b| a.name().cmp(b.name()));
    for definition in types {
        blocks.push(print_type(scope, definition));
    }

    let mut out = blocks.join("\n");
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn print_schema_block(graph: &SchemaGraph) -> Option<String> {
    let definition = graph.schema_definition();
    let query = graph.query_type();
    let mutation = graph.mutation_type();
    let conventional = query == "Query" && mutation.is_none_or(|m| m == "Mutation");
    if conventional && definition.directives.is_empty() {
        return None;
    }
    let mut out = format!("schema{} {{\n", print_applied(graph, &definition.directives));
    let _ = writeln!(out, "  query: {query}");
    if let Some(mutation) = mutation {
        let _ = writeln!(out, "  mutation: {mutation}");
    }
    out.push_str("}\n");
    Some(out)
}

fn print_description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };
    let escaped = description.replace("\"\"\"", "\\\"\"\"");
    if escaped.contains('\n') || escaped.ends_with('"') || escaped.ends_with('\\') {
        let _ = writeln!(out, "{indent}\"\"\"");
        for line in escaped.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{indent}{line}");
            }
        }
        let _ = writeln!(out, "{indent}\"\"\"");
    } else {
        let _ = writeln!(out, "{indent}\"\"\"{escaped}\"\"\"");
    }
}

fn print_applied(graph: &SchemaGraph, directives: &[DirectiveApplication]) -> String {
    let mut out = String::new();
    for application in directives {
        let Some(name) = graph.name_of(application.directive().into()) else {
            continue;
        };
        let _ = write!(out, " @{name}");
        if !application.raw_arguments().is_empty() {
            let arguments: Vec<String> = application
                .raw_arguments()
                .iter()
                .map(|(name, value)| format!("{}: {}", name, print_value(value)))
                .collect();
            let _ = write!(out, "({})", arguments.join(", "));
        }
    }
    out
}

fn print_deprecation(reason: Option<&str>) -> String {
    match reason {
        None => String::new(),
        Some(DEFAULT_DEPRECATION_REASON) => " @deprecated".to_string(),
        Some(reason) => format!(" @deprecated(reason: {})", print_string(reason)),
    }
}

fn print_input_value(graph: &SchemaGraph, value: &InputValueDefinition) -> String {
    let mut out = format!("{}: {}", value.name(), graph.render(value.ty()));
    if let Some(default) = default_literal(graph, value) {
        let _ = write!(out, " = {default}");
    }
    out.push_str(&print_deprecation(value.deprecation_reason()));
    out.push_str(&print_applied(graph, value.directives()));
    out
}

fn print_arguments(
    graph: &SchemaGraph,
    arguments: &[&InputValueDefinition],
    indent: &str,
) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    if arguments.iter().all(|a| a.description().is_none()) {
        let printed: Vec<String> = arguments
            .iter()
            .map(|a| print_input_value(graph, a))
            .collect();
        return format!("({})", printed.join(", "));
    }
    let inner = format!("{indent}  ");
    let mut out = String::from("(\n");
    for argument in arguments {
        print_description(&mut out, argument.description(), &inner);
        let _ = writeln!(out, "{inner}{}", print_input_value(graph, argument));
    }
    let _ = write!(out, "{indent})");
    out
}

fn print_field(scope: &ScopedSchema<'_>, field: &FieldDefinition, out: &mut String) {
    let graph = scope.graph();
    print_description(out, field.description(), "  ");
    let arguments: Vec<&InputValueDefinition> = field
        .arguments()
        .iter()
        .filter(|a| scope.input_value_visible(a))
        .collect();
    let _ = writeln!(
        out,
        "  {}{}: {}{}{}",
        field.name(),
        print_arguments(graph, &arguments, "  "),
        graph.render(field.ty()),
        print_deprecation(field.deprecation_reason()),
        print_applied(graph, field.directives()),
    );
}

fn print_implements<'g>(scope: &ScopedSchema<'g>, definition: &'g Definition) -> String {
    let interfaces = scope.interfaces(definition);
    if interfaces.is_empty() {
        String::new()
    } else {
        format!(" implements {}", interfaces.join(" & "))
    }
}

fn print_type<'g>(scope: &ScopedSchema<'g>, definition: &'g Definition) -> String {
    let graph = scope.graph();
    let header = definition.header();
    let mut out = String::new();
    print_description(&mut out, header.description.as_deref(), "");
    let applied = print_applied(graph, &header.directives);

    match definition {
        Definition::Object(object) => {
            let _ = write!(
                out,
                "type {}{}{}",
                header.name,
                print_implements(scope, definition),
                applied
            );
            print_field_block(scope, object.fields.values(), &mut out);
        }
        Definition::Interface(interface) => {
            let _ = write!(
                out,
                "interface {}{}{}",
                header.name,
                print_implements(scope, definition),
                applied
            );
            print_field_block(scope, interface.fields.values(), &mut out);
        }
        Definition::Union(_) => {
            let members = scope.possible_types(&header.name);
            let _ = write!(out, "union {}{}", header.name, applied);
            if !members.is_empty() {
                let _ = write!(out, " = {}", members.join(" | "));
            }
            out.push('\n');
        }
        Definition::Enum(enum_type) => {
            let _ = writeln!(out, "enum {}{} {{", header.name, applied);
            for value in enum_type.values.values() {
                if !scope.enum_value_visible(value) {
                    continue;
                }
                print_description(&mut out, value.description(), "  ");
                let _ = writeln!(
                    out,
                    "  {}{}{}",
                    value.name(),
                    print_deprecation(value.deprecation_reason()),
                    print_applied(graph, value.directives())
                );
            }
            out.push_str("}\n");
        }
        Definition::InputObject(input) => {
            let _ = writeln!(out, "input {}{} {{", header.name, applied);
            for field in input.fields.values() {
                if !scope.input_value_visible(field) {
                    continue;
                }
                print_description(&mut out, field.description(), "  ");
                let _ = writeln!(out, "  {}", print_input_value(graph, field));
            }
            out.push_str("}\n");
        }
        Definition::Scalar(scalar) => {
            let _ = write!(out, "scalar {}", header.name);
            if let Some(url) = &scalar.specified_by_url {
                let _ = write!(out, " @specifiedBy(url: {})", print_string(url));
            }
            let _ = writeln!(out, "{applied}");
        }
        Definition::Directive(directive) => {
            out.push_str(&print_directive_definition(scope, directive));
        }
    }
    out
}

fn print_field_block<'g>(
    scope: &ScopedSchema<'_>,
    fields: impl Iterator<Item = &'g FieldDefinition>,
    out: &mut String,
) {
    let visible: Vec<&FieldDefinition> = fields
        .filter(|f| !f.is_meta() && scope.field_visible(f))
        .collect();
    if visible.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(" {\n");
    for field in visible {
        print_field(scope, field, out);
    }
    out.push_str("}\n");
}

fn print_directive_definition(scope: &ScopedSchema<'_>, directive: &DirectiveDefinition) -> String {
    let graph = scope.graph();
    let mut out = String::new();
    print_description(&mut out, directive.header.description.as_deref(), "");
    let arguments: Vec<&InputValueDefinition> = directive
        .arguments
        .values()
        .filter(|a| scope.input_value_visible(a))
        .collect();
    let locations: Vec<&str> = directive.locations.iter().map(|l| l.as_str()).collect();
    let _ = writeln!(
        out,
        "directive @{}{}{} on {}",
        directive.header.name,
        print_arguments(graph, &arguments, ""),
        if directive.repeatable { " repeatable" } else { "" },
        locations.join(" | ")
    );
    out
}

#[cfg(test)]
mod tests {
    use async_graphql_value::Name;

    use super::*;

    #[test]
    fn test_print_scalars() {
        assert_eq!(print_value(&ConstValue::Null), "null");
        assert_eq!(print_value(&ConstValue::Number(1.into())), "1");
        assert_eq!(print_value(&ConstValue::Boolean(false)), "false");
        assert_eq!(print_value(&ConstValue::Enum(Name::new("RED"))), "RED");
    }

    #[test]
    fn test_print_string_escapes() {
        assert_eq!(
            print_value(&ConstValue::String("say \"hi\"\n".into())),
            r#""say \"hi\"\n""#
        );
    }

    #[test]
    fn test_print_nested() {
        let value = ConstValue::Object(
            [
                (Name::new("first"), ConstValue::String("Adam".into())),
                (
                    Name::new("tags"),
                    ConstValue::List(vec![
                        ConstValue::Number(1.into()),
                        ConstValue::Number(2.into()),
                    ]),
                ),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(print_value(&value), r#"{first: "Adam", tags: [1, 2]}"#);
    }

    #[test]
    fn test_description_forms() {
        let mut out = String::new();
        print_description(&mut out, Some("One line"), "  ");
        assert_eq!(out, "  \"\"\"One line\"\"\"\n");

        let mut out = String::new();
        print_description(&mut out, Some("First\nSecond"), "");
        assert_eq!(out, "\"\"\"\nFirst\nSecond\n\"\"\"\n");
    }

    #[test]
    fn test_deprecation() {
        assert_eq!(print_deprecation(None), "");
        assert_eq!(print_deprecation(Some("No longer supported")), " @deprecated");
        assert_eq!(
            print_deprecation(Some("Use `name`")),
            " @deprecated(reason: \"Use `name`\")"
        );
    }
}
