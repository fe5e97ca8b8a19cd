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

use crate::ecs::ActivationError;
use ember_core::{ComponentDescriptor, EntityId, ServiceTag};
use std::any::Any;

/// The interface every component attached to an [`Entity`](crate::ecs::Entity) implements.
///
/// A component declares the services it provides, requires, and is incompatible
/// with; the entity uses those declarations to order activation. All lifecycle
/// hooks have empty defaults so simple components only describe their services.
///
/// The `'static` bound lets components be downcast through [`as_any`](Self::as_any),
/// and `Send` lets a fully built entity be handed to another thread.
pub trait Component: Send + 'static {
    /// Services this component offers once active.
    fn provided_services(&self) -> Vec<ServiceTag> {
        Vec::new()
    }

    /// Services that must be active before this component activates.
    fn required_services(&self) -> Vec<ServiceTag> {
        Vec::new()
    }

    /// Services that must not be present on the same entity.
    fn incompatible_services(&self) -> Vec<ServiceTag> {
        Vec::new()
    }

    /// Collects the three service lists into a descriptor.
    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::from_services(
            self.required_services(),
            self.provided_services(),
            self.incompatible_services(),
        )
    }

    /// Called when the component is attached to an entity.
    ///
    /// `owner` is a plain id, never an ownership link; components that keep it must
    /// forget it in [`detached`](Self::detached).
    fn attached(&mut self, _owner: EntityId) {}

    /// Called when the component is removed from its entity and handed back.
    fn detached(&mut self) {}

    /// Called once when the owning entity initializes, or on attach if it already has.
    fn init(&mut self, _owner: EntityId) {}

    /// Called when the owning entity activates, after every component providing
    /// a required service has activated.
    fn activate(&mut self) -> Result<(), ActivationError> {
        Ok(())
    }

    /// Called when the owning entity deactivates, before any component this one
    /// depends on is deactivated.
    fn deactivate(&mut self) {}

    /// A human-readable type name, used in logs.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Allows downcasting to concrete component types.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to concrete component types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
