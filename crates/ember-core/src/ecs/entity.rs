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

//! Identifiers for entities and the components attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static LOCAL_MACHINE_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_ENTITY_COUNTER: AtomicU32 = AtomicU32::new(1);

/// A globally unique identifier for an entity.
///
/// Generated ids combine the local machine id (upper 32 bits) with a process-wide
/// counter (lower 32 bits), so ids minted on different machines never collide as
/// long as each machine is assigned its own id through [`set_local_machine_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// The id that never refers to an entity.
    pub const INVALID: EntityId = EntityId(0);

    /// Wraps an externally supplied raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Generates a fresh id.
    pub fn make() -> Self {
        let counter = NEXT_ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let machine = LOCAL_MACHINE_ID.load(Ordering::Relaxed);
        Self((u64::from(machine) << 32) | u64::from(counter))
    }

    /// Returns the raw 64-bit value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `false` for [`EntityId::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// Overrides the machine id used for id generation.
pub fn set_local_machine_id(machine_id: u32) {
    LOCAL_MACHINE_ID.store(machine_id, Ordering::Relaxed);
}

/// Returns the machine id used for id generation.
pub fn local_machine_id() -> u32 {
    LOCAL_MACHINE_ID.load(Ordering::Relaxed)
}

/// Identifies a component within its owning entity.
///
/// Ids are assigned when the component is attached and are only unique within
/// that entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Wraps a raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let a = EntityId::make();
        let b = EntityId::make();
        assert!(a.is_valid());
        assert!(b.is_valid());
        assert_ne!(a, b);
        assert!(!EntityId::INVALID.is_valid());
        assert_eq!(EntityId::default(), EntityId::INVALID);
    }
}
