// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::ecs::{Component, DependencyError, EntityError};
use ember_core::graph::{dependency_sort, find_incompatibilities};
use ember_core::{ComponentDescriptor, ComponentId, EntityId, ServiceTag};
use std::fmt;

/// The lifecycle state of an entity and its components.
///
/// An entity is initialized exactly once and can then be activated and
/// deactivated any number of times. The `*ing` states are transitions that only
/// exist while the entity is calling into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Created, not yet initialized. Components may be added and removed.
    Constructed,
    /// Calling `init` on the components.
    Initializing,
    /// Initialized and inactive. Components may be added and removed.
    Init,
    /// Calling `activate` on the components in dependency order.
    Activating,
    /// Active. The component set is frozen until deactivation.
    Active,
    /// Calling `deactivate` on the components in reverse activation order.
    Deactivating,
}

impl EntityState {
    /// Returns `true` for the three transition states.
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            EntityState::Initializing | EntityState::Activating | EntityState::Deactivating
        )
    }
}

/// A component that was refused by the entity, handed back to the caller.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct Rejected {
    /// Why the component was refused.
    #[source]
    pub error: EntityError,
    /// The refused component; ownership returns to the caller.
    pub component: Box<dyn Component>,
}

impl fmt::Debug for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("component", &self.component.type_name())
            .finish()
    }
}

/// What prevents a component from joining an entity's current component set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyToAdd {
    /// Required services no attached component provides.
    pub missing_services: Vec<ServiceTag>,
    /// Attached components that conflict with the candidate, in either direction.
    pub incompatible_components: Vec<ComponentId>,
}

impl ReadyToAdd {
    /// Returns `true` if nothing blocks the candidate.
    pub fn is_ready(&self) -> bool {
        self.missing_services.is_empty() && self.incompatible_components.is_empty()
    }
}

struct ComponentSlot {
    id: ComponentId,
    component: Box<dyn Component>,
}

/// An addressable container for a group of components.
///
/// The entity owns its components outright, keeps them in insertion order, and
/// drives their lifecycle. Before activating it sorts them so that every component
/// activates after the components providing the services it requires, and it
/// deactivates them in the exact reverse of that order.
pub struct Entity {
    id: EntityId,
    name: String,
    state: EntityState,
    components: Vec<ComponentSlot>,
    next_component_id: u64,
    /// Cached dependency evaluation; `None` when the component set changed.
    dependencies: Option<Result<Vec<ComponentId>, DependencyError>>,
    /// Components activated by the last `activate` call, in activation order.
    activated: Vec<ComponentId>,
}

impl Entity {
    /// Creates an entity with a freshly generated id.
    ///
    /// The name is only used to make logs and error messages readable.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(EntityId::make(), name)
    }

    /// Creates an entity with an externally supplied id.
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: EntityState::Constructed,
            components: Vec::new(),
            next_component_id: 1,
            dependencies: None,
            activated: Vec::new(),
        }
    }

    /// Returns the entity's id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Changes the entity's id. Only allowed before initialization.
    pub fn set_id(&mut self, id: EntityId) -> Result<(), EntityError> {
        self.require_state("set_id", EntityState::Constructed)?;
        self.id = id;
        for slot in &mut self.components {
            slot.component.attached(id);
        }
        Ok(())
    }

    /// Returns the entity's debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changes the entity's debug name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Returns `true` if the component set can currently change.
    pub fn can_add_remove_components(&self) -> bool {
        matches!(self.state, EntityState::Constructed | EntityState::Init)
    }

    // --- Component set ---

    /// Attaches a component and takes ownership of it.
    ///
    /// Allowed only while the entity is `Constructed` or `Init`. If the entity is
    /// already initialized, the component is initialized right away. On failure the
    /// component is handed back inside [`Rejected`].
    pub fn add_component(
        &mut self,
        mut component: Box<dyn Component>,
    ) -> Result<ComponentId, Rejected> {
        if let Err(error) = self.check_can_mutate("add_component") {
            return Err(Rejected { error, component });
        }
        if let Err(source) = component.descriptor().validate() {
            log::warn!(
                "Entity '{}': refusing component '{}': {source}",
                self.name,
                component.type_name()
            );
            let error = EntityError::InvalidDescriptor {
                type_name: component.type_name(),
                source,
            };
            return Err(Rejected { error, component });
        }

        let id = ComponentId::from_raw(self.next_component_id);
        self.next_component_id += 1;

        component.attached(self.id);
        if self.state == EntityState::Init {
            component.init(self.id);
        }

        log::debug!(
            "Entity '{}': attached component {id} ('{}')",
            self.name,
            component.type_name()
        );
        self.components.push(ComponentSlot { id, component });
        self.invalidate_dependencies();
        Ok(id)
    }

    /// Boxes and attaches a component.
    pub fn create_component<C: Component>(&mut self, component: C) -> Result<ComponentId, EntityError> {
        self.add_component(Box::new(component))
            .map_err(|rejected| rejected.error)
    }

    /// Detaches a component and hands ownership back to the caller without destroying it.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Box<dyn Component>, EntityError> {
        self.check_can_mutate("remove_component")?;
        let index = self
            .index_of(id)
            .ok_or(EntityError::ComponentNotFound(id))?;

        let mut slot = self.components.remove(index);
        slot.component.detached();
        log::debug!(
            "Entity '{}': detached component {id} ('{}')",
            self.name,
            slot.component.type_name()
        );
        self.invalidate_dependencies();
        Ok(slot.component)
    }

    /// Replaces an attached component with another one.
    ///
    /// The new component takes over the id and position of the removed one, and the
    /// removed component is handed back to the caller.
    pub fn swap_components(
        &mut self,
        remove: ComponentId,
        mut add: Box<dyn Component>,
    ) -> Result<Box<dyn Component>, Rejected> {
        if let Err(error) = self.check_can_mutate("swap_components") {
            return Err(Rejected {
                error,
                component: add,
            });
        }
        let Some(index) = self.index_of(remove) else {
            return Err(Rejected {
                error: EntityError::ComponentNotFound(remove),
                component: add,
            });
        };
        if let Err(source) = add.descriptor().validate() {
            let error = EntityError::InvalidDescriptor {
                type_name: add.type_name(),
                source,
            };
            return Err(Rejected {
                error,
                component: add,
            });
        }

        add.attached(self.id);
        if self.state == EntityState::Init {
            add.init(self.id);
        }
        let mut removed = std::mem::replace(&mut self.components[index].component, add);
        removed.detached();
        self.invalidate_dependencies();
        Ok(removed)
    }

    /// Reports what would block `candidate` from joining the current component set.
    ///
    /// This does not attach anything; it lets tools explain why a component cannot be
    /// used before the entity fails to activate.
    pub fn is_component_ready_to_add(&self, candidate: &dyn Component) -> ReadyToAdd {
        let candidate = candidate.descriptor();
        let attached: Vec<(ComponentId, ComponentDescriptor)> = self.describe_components();

        let missing_services = candidate
            .required()
            .iter()
            .filter(|tag| !attached.iter().any(|(_, d)| d.provides_service(**tag)))
            .copied()
            .collect();

        let incompatible_components = attached
            .iter()
            .filter(|(_, d)| {
                !candidate.conflicts_with(d).is_empty() || !d.conflicts_with(&candidate).is_empty()
            })
            .map(|(id, _)| *id)
            .collect();

        ReadyToAdd {
            missing_services,
            incompatible_components,
        }
    }

    /// Iterates the attached components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> + '_ {
        self.components
            .iter()
            .map(|slot| (slot.id, slot.component.as_ref()))
    }

    /// Returns the number of attached components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Finds a component by id.
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.index_of(id)
            .map(|index| self.components[index].component.as_ref())
    }

    /// Finds a component by id, mutably.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        let index = self.index_of(id)?;
        Some(self.components[index].component.as_mut())
    }

    /// Finds the first component of type `T`.
    pub fn find_component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|slot| slot.component.as_any().downcast_ref::<T>())
    }

    /// Finds the first component of type `T`, mutably.
    pub fn find_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|slot| slot.component.as_any_mut().downcast_mut::<T>())
    }

    /// Collects every component of type `T`, in insertion order.
    pub fn find_components<T: Component>(&self) -> Vec<&T> {
        self.components
            .iter()
            .filter_map(|slot| slot.component.as_any().downcast_ref::<T>())
            .collect()
    }

    // --- Dependencies ---

    /// Marks the cached activation order as stale.
    ///
    /// Dependencies are evaluated again on the next activation or explicit
    /// [`evaluate_dependencies`](Self::evaluate_dependencies) call.
    pub fn invalidate_dependencies(&mut self) {
        self.dependencies = None;
    }

    /// Computes the activation order of the attached components.
    ///
    /// The result is cached until the component set changes or
    /// [`invalidate_dependencies`](Self::invalidate_dependencies) is called.
    pub fn evaluate_dependencies(&mut self) -> Result<Vec<ComponentId>, DependencyError> {
        if let Some(cached) = &self.dependencies {
            return cached.clone();
        }

        let result = self.sort_components();
        if let Err(e) = &result {
            log::warn!("Entity '{}' {}: {e}", self.name, self.id);
        }
        self.dependencies = Some(result.clone());
        result
    }

    /// Returns the cached activation order, if the last evaluation succeeded and is still current.
    pub fn activation_order(&self) -> Option<&[ComponentId]> {
        match &self.dependencies {
            Some(Ok(order)) => Some(order),
            _ => None,
        }
    }

    fn describe_components(&self) -> Vec<(ComponentId, ComponentDescriptor)> {
        self.components
            .iter()
            .map(|slot| (slot.id, slot.component.descriptor()))
            .collect()
    }

    fn sort_components(&self) -> Result<Vec<ComponentId>, DependencyError> {
        let described = self.describe_components();

        let incompatible = find_incompatibilities(&described);
        if !incompatible.is_empty() {
            return Err(DependencyError::Incompatible(incompatible));
        }

        Ok(dependency_sort(&described)?)
    }

    // --- Lifecycle ---

    /// Initializes the entity and its components, in insertion order.
    ///
    /// Called exactly once in an entity's lifetime; later calls fail.
    pub fn init(&mut self) -> Result<(), EntityError> {
        self.require_state("init", EntityState::Constructed)?;

        self.state = EntityState::Initializing;
        let owner = self.id;
        for slot in &mut self.components {
            slot.component.init(owner);
        }
        self.state = EntityState::Init;

        log::debug!("Entity '{}' {}: initialized", self.name, self.id);
        Ok(())
    }

    /// Activates the components in dependency order.
    ///
    /// Fails without side effects if the entity is not `Init` or its dependencies
    /// cannot be resolved. If a component fails to activate, the remaining components
    /// are skipped and the error is returned; components already activated are left
    /// active and the entity is left `Active`, so a following
    /// [`deactivate`](Self::deactivate) tears down exactly those components.
    pub fn activate(&mut self) -> Result<(), EntityError> {
        self.require_state("activate", EntityState::Init)?;
        let order = self.evaluate_dependencies()?;

        self.state = EntityState::Activating;
        self.activated.clear();

        for id in order {
            let Some(index) = self.index_of(id) else {
                continue;
            };
            let component = &mut self.components[index].component;
            if let Err(source) = component.activate() {
                let type_name = component.type_name();
                log::error!(
                    "Entity '{}' {}: component {id} ('{type_name}') failed to activate: {source}",
                    self.name,
                    self.id
                );
                self.state = EntityState::Active;
                return Err(EntityError::ActivationFailed {
                    component: id,
                    type_name,
                    source,
                });
            }
            self.activated.push(id);
        }

        self.state = EntityState::Active;
        log::debug!("Entity '{}' {}: activated", self.name, self.id);
        Ok(())
    }

    /// Deactivates the components activated by the last [`activate`](Self::activate)
    /// call, in exact reverse order.
    pub fn deactivate(&mut self) -> Result<(), EntityError> {
        self.require_state("deactivate", EntityState::Active)?;

        self.state = EntityState::Deactivating;
        let activated = std::mem::take(&mut self.activated);
        for id in activated.into_iter().rev() {
            if let Some(index) = self.index_of(id) {
                self.components[index].component.deactivate();
            }
        }
        self.state = EntityState::Init;

        log::debug!("Entity '{}' {}: deactivated", self.name, self.id);
        Ok(())
    }

    /// Tears the entity down, deactivating it first if it is active, and destroys
    /// every owned component.
    pub fn destroy(self) {
        drop(self);
    }

    fn require_state(&self, operation: &'static str, expected: EntityState) -> Result<(), EntityError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EntityError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn check_can_mutate(&self, operation: &'static str) -> Result<(), EntityError> {
        if self.can_add_remove_components() {
            Ok(())
        } else {
            log::warn!(
                "Entity '{}': cannot {operation} while {:?}",
                self.name,
                self.state
            );
            Err(EntityError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.components.iter().position(|slot| slot.id == id)
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        match self.state {
            EntityState::Active => {
                let _ = self.deactivate();
            }
            state if state.is_transitional() => {
                log::error!(
                    "Entity '{}' {} destroyed while {state:?}",
                    self.name,
                    self.id
                );
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field(
                "components",
                &self
                    .components
                    .iter()
                    .map(|slot| (slot.id, slot.component.type_name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
