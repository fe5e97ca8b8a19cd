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

//! Service declarations of a component type.

use super::ServiceTag;
use std::fmt;

/// The services a component type requires, provides, and cannot coexist with.
///
/// Each list is treated as a set: tags are stored sorted and deduplicated, so the
/// order in which they were declared is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDescriptor {
    required: Vec<ServiceTag>,
    provided: Vec<ServiceTag>,
    incompatible: Vec<ServiceTag>,
}

/// A descriptor that violates the descriptor invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// The descriptor lists services as both provided and incompatible.
    SelfIncompatible(Vec<ServiceTag>),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::SelfIncompatible(tags) => {
                write!(f, "services both provided and incompatible: ")?;
                write_tags(f, tags)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

impl ComponentDescriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a descriptor from the three service lists.
    pub fn from_services(
        required: impl IntoIterator<Item = ServiceTag>,
        provided: impl IntoIterator<Item = ServiceTag>,
        incompatible: impl IntoIterator<Item = ServiceTag>,
    ) -> Self {
        Self {
            required: normalize(required),
            provided: normalize(provided),
            incompatible: normalize(incompatible),
        }
    }

    /// Adds a provided service.
    #[must_use]
    pub fn provides(mut self, tag: ServiceTag) -> Self {
        insert_sorted(&mut self.provided, tag);
        self
    }

    /// Adds a required service.
    #[must_use]
    pub fn requires(mut self, tag: ServiceTag) -> Self {
        insert_sorted(&mut self.required, tag);
        self
    }

    /// Adds an incompatible service.
    #[must_use]
    pub fn incompatible_with(mut self, tag: ServiceTag) -> Self {
        insert_sorted(&mut self.incompatible, tag);
        self
    }

    /// The services this component type needs before it can be activated.
    pub fn required(&self) -> &[ServiceTag] {
        &self.required
    }

    /// The services this component type offers once active.
    pub fn provided(&self) -> &[ServiceTag] {
        &self.provided
    }

    /// The services that must not be present alongside this component type.
    pub fn incompatible(&self) -> &[ServiceTag] {
        &self.incompatible
    }

    /// Returns `true` if this descriptor provides `tag`.
    pub fn provides_service(&self, tag: ServiceTag) -> bool {
        self.provided.binary_search(&tag).is_ok()
    }

    /// Returns `true` if this descriptor requires `tag`.
    pub fn requires_service(&self, tag: ServiceTag) -> bool {
        self.required.binary_search(&tag).is_ok()
    }

    /// Checks that no service is both provided and declared incompatible.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let overlap = intersect(&self.provided, &self.incompatible);
        if overlap.is_empty() {
            Ok(())
        } else {
            Err(DescriptorError::SelfIncompatible(overlap))
        }
    }

    /// Returns the services provided by `self` that `other` declares incompatible.
    pub fn conflicts_with(&self, other: &ComponentDescriptor) -> Vec<ServiceTag> {
        intersect(&self.provided, &other.incompatible)
    }
}

fn normalize(tags: impl IntoIterator<Item = ServiceTag>) -> Vec<ServiceTag> {
    let mut tags: Vec<ServiceTag> = tags.into_iter().collect();
    tags.sort_unstable();
    tags.dedup();
    tags
}

fn insert_sorted(tags: &mut Vec<ServiceTag>, tag: ServiceTag) {
    if let Err(pos) = tags.binary_search(&tag) {
        tags.insert(pos, tag);
    }
}

fn intersect(a: &[ServiceTag], b: &[ServiceTag]) -> Vec<ServiceTag> {
    a.iter()
        .filter(|tag| b.binary_search(tag).is_ok())
        .copied()
        .collect()
}

pub(crate) fn write_tags(f: &mut fmt::Formatter<'_>, tags: &[ServiceTag]) -> fmt::Result {
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{tag}")?;
    }
    Ok(())
}
