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

//! Error types reported by entities.

use crate::ecs::EntityState;
use ember_core::graph::{DependencySortError, Incompatibility};
use ember_core::{ComponentId, ServiceTag};
use std::fmt;

/// A failure reported by a component's `activate` hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ActivationError(pub String);

impl ActivationError {
    /// Creates an activation error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Why an entity's components cannot be put into an activation order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// A component provides a service another component declares incompatible.
    #[error("incompatible components: {}", describe_incompatibilities(.0))]
    Incompatible(Vec<Incompatibility<ComponentId>>),
    /// A required service is not provided by any attached component.
    #[error("missing required services: {}", describe_tags(.services))]
    MissingRequired {
        /// The unmet services.
        services: Vec<ServiceTag>,
    },
    /// Components depend on each other's services.
    #[error("cyclic dependency between components {components:?}")]
    CyclicDependency {
        /// The components that could not be ordered.
        components: Vec<ComponentId>,
    },
}

impl From<DependencySortError<ComponentId>> for DependencyError {
    fn from(error: DependencySortError<ComponentId>) -> Self {
        match error {
            DependencySortError::MissingRequired { services } => {
                DependencyError::MissingRequired { services }
            }
            DependencySortError::CyclicDependency { components } => {
                DependencyError::CyclicDependency { components }
            }
        }
    }
}

/// An operation on an [`Entity`](crate::ecs::Entity) that was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// The operation is not allowed in the entity's current state.
    #[error("operation '{operation}' is not allowed while the entity is {state:?}")]
    InvalidState {
        /// The refused operation.
        operation: &'static str,
        /// The state the entity was in.
        state: EntityState,
    },
    /// No component with this id is attached.
    #[error("component {0} is not attached to this entity")]
    ComponentNotFound(ComponentId),
    /// The component's own descriptor is inconsistent.
    #[error("component '{type_name}' has an invalid descriptor: {source}")]
    InvalidDescriptor {
        /// The offending component type.
        type_name: &'static str,
        /// The descriptor violation.
        #[source]
        source: ember_core::ecs::DescriptorError,
    },
    /// Dependency evaluation failed; activation did not start.
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    /// A component failed to activate. Components activated before it stay active.
    #[error("component {component} ('{type_name}') failed to activate: {source}")]
    ActivationFailed {
        /// The component that failed.
        component: ComponentId,
        /// Its type name.
        type_name: &'static str,
        /// The reported failure.
        #[source]
        source: ActivationError,
    },
}

fn describe_tags(tags: &[ServiceTag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_incompatibilities(found: &[Incompatibility<ComponentId>]) -> String {
    struct Pair<'a>(&'a Incompatibility<ComponentId>);

    impl fmt::Display for Pair<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{} provides [{}] rejected by {}",
                self.0.provider,
                describe_tags(&self.0.services),
                self.0.rejecter
            )
        }
    }

    found
        .iter()
        .map(|pair| Pair(pair).to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
