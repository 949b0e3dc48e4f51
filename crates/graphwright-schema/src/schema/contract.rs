//! Capability contracts.
//!
//! A [`CapabilityContract`] lists the resolver methods an object serving a
//! given object or interface type must provide: one per declared field,
//! named by the field's resolver method name, taking one parameter per
//! argument. A type implementing interfaces requires the union of its own
//! methods and every interface's full contract. Conformance is checked
//! structurally with [`CapabilityContract::verify`]; the contract can also be
//! rendered as a Rust trait for hosts that want a compile-time check.

use std::fmt::Write as _;

use indexmap::IndexMap;
use thiserror::Error;

use crate::definition::{DefinitionKind, FieldDefinition};
use crate::resolvers::Resolver;
use crate::schema::graph::{NamedType, SchemaGraph};
use crate::types::{BaseType, BuiltinScalar, TypeRef};

/// One parameter of a resolver method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name: the snake_case form of the argument name.
    pub name: String,
    /// Public argument name.
    pub argument_name: String,
    pub ty: TypeRef,
}

/// One required resolver method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub field_name: String,
    pub parameters: Vec<Parameter>,
    pub returns: TypeRef,
    /// Public name of the type whose field introduced the method.
    pub declared_by: String,
}

/// Methods a resolver must implement for one object or interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityContract {
    type_name: String,
    methods: IndexMap<String, MethodSignature>,
}

/// A resolver lacks methods its contract requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{type_name}` resolver is missing methods: {}", missing.join(", "))]
pub struct ContractViolation {
    pub type_name: String,
    pub missing: Vec<String>,
}

impl CapabilityContract {
    /// Own field requirements first, then inherited ones in interface order.
    /// A method already required is not added again.
    pub(crate) fn synthesize<'f>(
        type_name: &str,
        fields: impl IntoIterator<Item = &'f FieldDefinition>,
        interfaces: &[&CapabilityContract],
    ) -> Self {
        let mut methods = IndexMap::new();
        for field in fields.into_iter().filter(|f| !f.is_meta()) {
            let signature = MethodSignature {
                name: field.resolver_method_name().to_string(),
                field_name: field.name().to_string(),
                parameters: field
                    .arguments()
                    .iter()
                    .map(|argument| Parameter {
                        name: argument.parameter_name(),
                        argument_name: argument.name().to_string(),
                        ty: argument.ty().clone(),
                    })
                    .collect(),
                returns: field.ty().clone(),
                declared_by: type_name.to_string(),
            };
            methods.entry(signature.name.clone()).or_insert(signature);
        }
        for interface in interfaces {
            for (name, signature) in &interface.methods {
                methods
                    .entry(name.clone())
                    .or_insert_with(|| signature.clone());
            }
        }
        Self {
            type_name: type_name.to_string(),
            methods,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.values()
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Checks that `resolver` responds to every required method.
    ///
    /// # Errors
    ///
    /// Returns a `ContractViolation` listing the missing methods.
    pub fn verify(&self, resolver: &dyn Resolver) -> Result<(), ContractViolation> {
        let missing: Vec<String> = self
            .methods
            .keys()
            .filter(|name| !resolver.responds_to(name))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContractViolation {
                type_name: self.type_name.clone(),
                missing,
            })
        }
    }

    /// Renders the contract as a Rust trait named `<Type>Resolver`.
    pub fn render_trait(&self, graph: &SchemaGraph) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "pub trait {}Resolver {{", self.type_name);
        for method in self.methods.values() {
            let mut params = String::from("&self");
            for parameter in &method.parameters {
                let _ = write!(
                    params,
                    ", {}: {}",
                    parameter.name,
                    rust_type(graph, &parameter.ty)
                );
            }
            let _ = writeln!(
                out,
                "    fn {}({}) -> {};",
                method.name,
                params,
                rust_type(graph, &method.returns)
            );
        }
        out.push_str("}\n");
        out
    }
}

fn rust_type(graph: &SchemaGraph, ty: &TypeRef) -> String {
    let inner = match ty {
        TypeRef::List { inner, .. } => format!("Vec<{}>", rust_type(graph, inner)),
        TypeRef::Named { base, .. } => match base {
            BaseType::Builtin(scalar) => match scalar {
                BuiltinScalar::Int => "i32".to_string(),
                BuiltinScalar::Float => "f64".to_string(),
                BuiltinScalar::Boolean => "bool".to_string(),
                BuiltinScalar::String | BuiltinScalar::Id => "String".to_string(),
            },
            BaseType::Declared(_) => match graph.named(*base) {
                Some(NamedType::Declared(definition)) => match definition.kind() {
                    DefinitionKind::Object | DefinitionKind::Interface | DefinitionKind::Union => {
                        format!("Box<dyn {}Resolver>", definition.name())
                    }
                    _ => definition.name().to_string(),
                },
                _ => "()".to_string(),
            },
        },
    };
    if ty.is_required() {
        inner
    } else {
        format!("Option<{inner}>")
    }
}
