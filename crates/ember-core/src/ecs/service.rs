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

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque identifier for a capability a component provides or requires.
///
/// Tags carry no ownership; two tags are the same service exactly when their raw
/// values are equal. Named tags are derived with a stable 32-bit FNV-1a hash so
/// they can be declared as constants:
///
/// ```
/// use ember_core::ServiceTag;
///
/// const TRANSFORM: ServiceTag = ServiceTag::from_name("TransformService");
/// assert_eq!(TRANSFORM, ServiceTag::from_name("TransformService"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceTag(u32);

impl ServiceTag {
    /// Creates a tag from its raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Derives a tag from a service name.
    pub const fn from_name(name: &str) -> Self {
        const OFFSET_BASIS: u32 = 0x811c_9dc5;
        const PRIME: u32 = 0x0100_0193;

        let bytes = name.as_bytes();
        let mut hash = OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Returns the raw value of the tag.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for ServiceTag {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_tags_are_stable() {
        // FNV-1a of the empty string is the offset basis.
        assert_eq!(ServiceTag::from_name("").raw(), 0x811c_9dc5);
        assert_eq!(ServiceTag::from_name("a").raw(), 0xe40c_292c);
        assert_ne!(
            ServiceTag::from_name("TransformService"),
            ServiceTag::from_name("RenderService")
        );
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(ServiceTag::new(0xbeef).to_string(), "0x0000beef");
    }
}
