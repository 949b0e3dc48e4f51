//! Lazy definition builder.
//!
//! [`DefinitionBuilder::definition_of`] turns a registered declaration into
//! its [`Definition`] on first demand and memoizes it per handle, so the same
//! handle always yields the identical `Arc`. Members refer to other types by
//! handle, which means a field typed as its own parent (or as a type that
//! points back) never triggers a nested build. A nested build only happens
//! where the definition itself needs another definition: interface contracts
//! for objects and interfaces. A handle requested again while its own build
//! is running on the same thread is a genuine cycle and fails with
//! [`SchemaError::BuildCycle`].
//!
//! Each handle has its own slot guarded by a mutex and condition variable.
//! A second thread asking for a handle that is being built waits for the
//! result instead of building it twice. A failed build resets the slot so a
//! later call can retry.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use indexmap::IndexMap;
use tracing::trace;

use super::contract::CapabilityContract;
use super::introspection;
use crate::definition::{
    CustomScalarTypeDefinition, Definition, DefinitionHeader, DirectiveDefinition,
    EnumTypeDefinition, FieldDefinition, InputObjectTypeDefinition, InputValueDefinition,
    InterfaceTypeDefinition, ObjectTypeDefinition, UnionTypeDefinition,
};
use crate::error::{BoxError, SchemaError};
use crate::registry::{Common, TypeDeclaration, TypeRegistry};
use crate::types::{InputShape, ShapeField, TypeHandle};

enum SlotState {
    Pending,
    Building(ThreadId),
    Built(Definition),
}

struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts a slot back to `Pending` if its build does not complete, including
/// when the build panics.
struct BuildingGuard<'a> {
    slot: &'a Slot,
    armed: bool,
}

impl BuildingGuard<'_> {
    fn finish(mut self, definition: Definition) {
        self.armed = false;
        *self.slot.lock() = SlotState::Built(definition);
        self.slot.ready.notify_all();
    }
}

impl Drop for BuildingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.slot.lock() = SlotState::Pending;
            self.slot.ready.notify_all();
        }
    }
}

/// Builds and memoizes definitions for the handles of one registry.
pub struct DefinitionBuilder {
    registry: Arc<TypeRegistry>,
    slots: Vec<Slot>,
    query_root: Option<TypeHandle>,
}

impl DefinitionBuilder {
    /// Creates a builder. When `query_root` is given, its definition gets the
    /// `__schema` and `__type` introspection fields.
    pub fn new(registry: Arc<TypeRegistry>, query_root: Option<TypeHandle>) -> Self {
        let slots = (0..registry.len())
            .map(|_| Slot {
                state: Mutex::new(SlotState::Pending),
                ready: Condvar::new(),
            })
            .collect();
        Self {
            registry,
            slots,
            query_root,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn identity(&self, handle: TypeHandle) -> String {
        self.registry
            .identity(handle)
            .map_or_else(|| format!("#{}", handle.index()), str::to_string)
    }

    /// The definition behind `handle`, built on first call.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::BuildCycle` when the handle is already being
    /// built on this thread, `SchemaError::UndefinedHandle` when it was never
    /// defined, and the host's own error when a member declaration fails.
    pub fn definition_of(&self, handle: TypeHandle) -> Result<Definition, SchemaError> {
        let slot = self
            .slots
            .get(handle.index())
            .ok_or_else(|| SchemaError::UndefinedHandle {
                identity: self.identity(handle),
            })?;

        let current = thread::current().id();
        let mut state = slot.lock();
        loop {
            match &*state {
                SlotState::Built(definition) => return Ok(definition.clone()),
                SlotState::Building(owner) if *owner == current => {
                    return Err(SchemaError::BuildCycle {
                        identity: self.identity(handle),
                    });
                }
                SlotState::Building(_) => {
                    state = slot
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                SlotState::Pending => break,
            }
        }
        *state = SlotState::Building(current);
        drop(state);

        let guard = BuildingGuard { slot, armed: true };
        let definition = self.build(handle)?;
        trace!(
            identity = %definition.identity(),
            name = %definition.name(),
            "Definition built"
        );
        guard.finish(definition.clone());
        Ok(definition)
    }

    /// Whether `handle` has been built already.
    pub fn is_built(&self, handle: TypeHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| matches!(&*slot.lock(), SlotState::Built(_)))
    }

    fn build(&self, handle: TypeHandle) -> Result<Definition, SchemaError> {
        let declaration = self
            .registry
            .declaration(handle)
            .ok_or_else(|| SchemaError::UndefinedHandle {
                identity: self.identity(handle),
            })?;
        let header = self.header(handle, declaration.common());

        Ok(match declaration {
            TypeDeclaration::Object(decl) => {
                let mut fields = self.collect_fields(&header, (decl.fields)())?;
                if self.query_root == Some(handle) {
                    for field in introspection::root_fields(self.registry.builtins()) {
                        fields.insert(field.name().to_string(), field);
                    }
                }
                let contract = self.contract(&header, &fields, &decl.interfaces)?;
                Definition::Object(Arc::new(ObjectTypeDefinition {
                    header,
                    fields,
                    interfaces: decl.interfaces.clone(),
                    contract,
                }))
            }
            TypeDeclaration::Interface(decl) => {
                let fields = self.collect_fields(&header, (decl.fields)())?;
                let contract = self.contract(&header, &fields, &decl.interfaces)?;
                Definition::Interface(Arc::new(InterfaceTypeDefinition {
                    header,
                    fields,
                    interfaces: decl.interfaces.clone(),
                    contract,
                }))
            }
            TypeDeclaration::InputObject(decl) => {
                let fields = self.collect_input_values(&header, (decl.fields)())?;
                let shape = shape_of(&header.name, &fields);
                Definition::InputObject(Arc::new(InputObjectTypeDefinition {
                    header,
                    fields,
                    shape,
                }))
            }
            TypeDeclaration::Union(decl) => {
                let members = (decl.members)().map_err(SchemaError::Declaration)?;
                Definition::Union(Arc::new(UnionTypeDefinition { header, members }))
            }
            TypeDeclaration::Enum(decl) => {
                let declared = (decl.values)().map_err(SchemaError::Declaration)?;
                let mut values = IndexMap::with_capacity(declared.len());
                for value in declared {
                    let name = value.name().to_string();
                    if values.insert(name.clone(), value).is_some() {
                        return Err(duplicate_member(&header, &name));
                    }
                }
                Definition::Enum(Arc::new(EnumTypeDefinition { header, values }))
            }
            TypeDeclaration::Scalar(decl) => {
                Definition::Scalar(Arc::new(CustomScalarTypeDefinition {
                    header,
                    specified_by_url: decl.specified_by_url.clone(),
                    coercion: Arc::clone(&decl.coercion),
                }))
            }
            TypeDeclaration::Directive(decl) => {
                let arguments = self.collect_input_values(&header, (decl.arguments)())?;
                let shape = shape_of(&format!("@{}", header.name), &arguments);
                Definition::Directive(Arc::new(DirectiveDefinition {
                    header,
                    arguments,
                    locations: decl.locations.clone(),
                    repeatable: decl.repeatable,
                    shape,
                }))
            }
        })
    }

    fn header(&self, handle: TypeHandle, common: &Common) -> DefinitionHeader {
        DefinitionHeader {
            handle,
            identity: self.identity(handle),
            name: common.name.clone(),
            description: common.description.clone(),
            directives: common.directives.clone(),
            visibility: common.visibility.clone(),
        }
    }

    fn collect_fields(
        &self,
        header: &DefinitionHeader,
        declared: Result<Vec<FieldDefinition>, BoxError>,
    ) -> Result<IndexMap<String, FieldDefinition>, SchemaError> {
        let declared = declared.map_err(SchemaError::Declaration)?;
        let mut fields = IndexMap::with_capacity(declared.len());
        for field in declared {
            let name = field.name().to_string();
            if fields.insert(name.clone(), field).is_some() {
                return Err(duplicate_member(header, &name));
            }
        }
        Ok(fields)
    }

    fn collect_input_values(
        &self,
        header: &DefinitionHeader,
        declared: Result<Vec<InputValueDefinition>, BoxError>,
    ) -> Result<IndexMap<String, InputValueDefinition>, SchemaError> {
        let declared = declared.map_err(SchemaError::Declaration)?;
        let mut values = IndexMap::with_capacity(declared.len());
        for value in declared {
            let name = value.name().to_string();
            if values.insert(name.clone(), value).is_some() {
                return Err(duplicate_member(header, &name));
            }
        }
        Ok(values)
    }

    /// Own field requirements plus every implemented interface's contract.
    fn contract(
        &self,
        header: &DefinitionHeader,
        fields: &IndexMap<String, FieldDefinition>,
        interfaces: &[TypeHandle],
    ) -> Result<CapabilityContract, SchemaError> {
        let mut inherited = Vec::with_capacity(interfaces.len());
        for &interface in interfaces {
            match self.definition_of(interface)? {
                Definition::Interface(definition) => inherited.push(definition),
                other => {
                    return Err(SchemaError::NotAnInterface {
                        identity: header.identity.clone(),
                        interface: other.identity().to_string(),
                    });
                }
            }
        }
        let inherited: Vec<&CapabilityContract> = inherited.iter().map(|d| &d.contract).collect();
        Ok(CapabilityContract::synthesize(
            &header.name,
            fields.values(),
            &inherited,
        ))
    }
}

fn duplicate_member(header: &DefinitionHeader, member: &str) -> SchemaError {
    SchemaError::DuplicateMember {
        identity: header.identity.clone(),
        member: member.to_string(),
    }
}

fn shape_of(type_name: &str, fields: &IndexMap<String, InputValueDefinition>) -> Arc<InputShape> {
    Arc::new(InputShape::new(
        type_name,
        fields
            .values()
            .map(|field| ShapeField {
                name: field.name().to_string(),
                required: field.is_required(),
            })
            .collect(),
    ))
}
