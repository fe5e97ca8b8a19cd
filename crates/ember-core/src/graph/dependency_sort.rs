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

//! A stable topological sort of components by the services they provide and require.

use crate::ecs::{descriptor::write_tags, ComponentDescriptor, ServiceTag};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// The reason a set of components cannot be put into an activation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySortError<K> {
    /// Some required services are not provided by any component in the set.
    MissingRequired {
        /// The unmet services, sorted and deduplicated.
        services: Vec<ServiceTag>,
    },
    /// Every required service has a provider, but the providers depend on each other.
    CyclicDependency {
        /// The components that could not be placed, in insertion order.
        components: Vec<K>,
    },
}

impl<K: fmt::Debug> fmt::Display for DependencySortError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySortError::MissingRequired { services } => {
                write!(f, "missing required services: ")?;
                write_tags(f, services)
            }
            DependencySortError::CyclicDependency { components } => {
                write!(f, "cyclic service dependency between components {components:?}")
            }
        }
    }
}

impl<K: fmt::Debug> std::error::Error for DependencySortError<K> {}

/// Two components that cannot coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incompatibility<K> {
    /// The component providing the conflicting services.
    pub provider: K,
    /// The component declaring those services incompatible.
    pub rejecter: K,
    /// The conflicting services.
    pub services: Vec<ServiceTag>,
}

/// Orders components so every component comes after the providers of the services it requires.
///
/// Components are placed greedily: at each step, the first not-yet-placed component
/// (in input order) whose requirements are all provided by already-placed components is
/// appended. Independent components therefore keep their relative input order. A
/// component's own provided services never satisfy its own requirements.
///
/// # Arguments
///
/// * `components`: The components to order, as `(key, descriptor)` pairs in insertion order.
///
/// # Returns
///
/// * `Ok(Vec<K>)`: The keys in activation order.
/// * `Err(MissingRequired)`: If a required service has no provider anywhere in the set.
/// * `Err(CyclicDependency)`: If all services have providers but no valid order exists.
pub fn dependency_sort<K>(
    components: &[(K, ComponentDescriptor)],
) -> Result<Vec<K>, DependencySortError<K>>
where
    K: Copy + Eq + Hash,
{
    if components.is_empty() {
        return Ok(Vec::new());
    }

    // 1. Track, per component, the requirements not yet satisfied by the placed prefix.
    let mut pending: Vec<Option<Vec<ServiceTag>>> = components
        .iter()
        .map(|(_, descriptor)| Some(descriptor.required().to_vec()))
        .collect();
    let mut available: HashSet<ServiceTag> = HashSet::new();
    let mut sorted = Vec::with_capacity(components.len());

    // 2. Place the first ready component, then rescan from the start.
    loop {
        let ready = pending.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|unmet| unmet.iter().all(|tag| available.contains(tag)))
        });

        let Some(index) = ready else {
            break;
        };

        pending[index] = None;
        let (key, descriptor) = &components[index];
        available.extend(descriptor.provided().iter().copied());
        sorted.push(*key);

        for unmet in pending.iter_mut().flatten() {
            unmet.retain(|tag| !available.contains(tag));
        }
    }

    if sorted.len() == components.len() {
        return Ok(sorted);
    }

    // 3. Classify the failure.
    let provided_anywhere: HashSet<ServiceTag> = components
        .iter()
        .flat_map(|(_, descriptor)| descriptor.provided().iter().copied())
        .collect();

    let mut missing: Vec<ServiceTag> = pending
        .iter()
        .flatten()
        .flatten()
        .filter(|tag| !provided_anywhere.contains(*tag))
        .copied()
        .collect();

    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        return Err(DependencySortError::MissingRequired { services: missing });
    }

    let blocked = components
        .iter()
        .zip(&pending)
        .filter(|(_, slot)| slot.is_some())
        .map(|((key, _), _)| *key)
        .collect();
    Err(DependencySortError::CyclicDependency { components: blocked })
}

/// Finds every pair of components where one provides a service the other declares incompatible.
///
/// Pairs are reported in input order of the provider, then of the rejecter. A component is
/// never compared against itself.
pub fn find_incompatibilities<K: Copy>(
    components: &[(K, ComponentDescriptor)],
) -> Vec<Incompatibility<K>> {
    let mut found = Vec::new();
    for (i, (provider, provider_desc)) in components.iter().enumerate() {
        for (j, (rejecter, rejecter_desc)) in components.iter().enumerate() {
            if i == j {
                continue;
            }
            let services = provider_desc.conflicts_with(rejecter_desc);
            if !services.is_empty() {
                found.push(Incompatibility {
                    provider: *provider,
                    rejecter: *rejecter,
                    services,
                });
            }
        }
    }
    found
}
