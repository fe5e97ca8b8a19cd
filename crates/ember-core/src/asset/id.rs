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
use uuid::Uuid;

const ASSET_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_52a4_0c3e_4d1b_9a57_e2b8_41c0_7d93);
const ASSET_TYPE_NAMESPACE: Uuid = Uuid::from_u128(0x2d8e_b6f0_71a9_4c55_8e1f_34d7_a9c2_0b6e);

/// A globally unique, persistent identifier for a logical asset.
///
/// The id represents the "idea" of an asset, decoupled from the stream it is
/// loaded from. The GUID names the source; the sub id distinguishes several
/// products generated from the same source (e.g., the meshes of one scene file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId {
    /// The identity of the asset's source.
    pub guid: Uuid,
    /// The product index within the source.
    pub sub_id: u32,
}

impl AssetId {
    /// Creates an id from its parts.
    pub const fn new(guid: Uuid, sub_id: u32) -> Self {
        Self { guid, sub_id }
    }

    /// Creates a new, random (version 4) id.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4(), 0)
    }

    /// Derives a deterministic (version 5) id from a logical name such as a source path.
    pub fn from_name(name: &str) -> Self {
        Self::new(Uuid::new_v5(&ASSET_NAMESPACE, name.as_bytes()), 0)
    }

    /// Returns a copy of this id with a different sub id.
    #[must_use]
    pub const fn with_sub_id(self, sub_id: u32) -> Self {
        Self::new(self.guid, sub_id)
    }

    /// Returns `false` for the nil GUID.
    pub fn is_valid(&self) -> bool {
        !self.guid.is_nil()
    }
}

impl Default for AssetId {
    /// The invalid (nil) id.
    fn default() -> Self {
        Self::new(Uuid::nil(), 0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}:{:x}", self.guid, self.sub_id)
    }
}

/// A stable identifier for a kind of asset.
///
/// The asset database keys its handler and catalog maps by this value. Types are
/// usually derived from a name so every crate agrees on the value without sharing
/// a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetType(Uuid);

impl AssetType {
    /// Wraps an explicit UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derives a type from its name.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&ASSET_TYPE_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    pub const fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_ids_are_deterministic() {
        let a = AssetId::from_name("textures/brick.png");
        let b = AssetId::from_name("textures/brick.png");
        assert_eq!(a, b);
        assert!(a.is_valid());
        assert_ne!(a, a.with_sub_id(1));
        assert!(!AssetId::default().is_valid());
    }

    #[test]
    fn type_and_id_namespaces_differ() {
        let name = "mesh";
        assert_ne!(AssetId::from_name(name).guid, AssetType::from_name(name).uuid());
        assert_eq!(AssetType::from_name(name), AssetType::from_name(name));
    }
}
