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

use ember_core::{AssetId, AssetType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where the data of an asset is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStreamInfo {
    /// The file holding the data.
    pub stream_name: PathBuf,
    /// Byte offset of the data inside the file.
    pub offset: u64,
    /// Length of the data in bytes; `0` means "to the end of the file".
    pub length: u64,
    /// The handler opens the file itself instead of reading a prepared stream.
    pub is_custom_stream: bool,
}

impl AssetStreamInfo {
    /// Describes a whole file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            stream_name: path.into(),
            ..Self::default()
        }
    }

    /// Describes a slice of a file, such as an entry of a pack.
    pub fn slice(path: impl Into<PathBuf>, offset: u64, length: u64) -> Self {
        Self {
            stream_name: path.into(),
            offset,
            length,
            is_custom_stream: false,
        }
    }

    /// Marks the stream as opened by the handler.
    #[must_use]
    pub fn custom(mut self) -> Self {
        self.is_custom_stream = true;
        self
    }

    /// Returns `true` if the info names a stream at all.
    pub fn is_valid(&self) -> bool {
        !self.stream_name.as_os_str().is_empty()
    }
}

/// Resolves asset ids to the streams holding their data.
pub trait AssetCatalog: Send + Sync {
    /// Locates the data to load for an asset. An invalid info means "unknown".
    fn stream_info_for_load(&self, id: &AssetId, asset_type: &AssetType) -> AssetStreamInfo;

    /// Locates where an asset should be saved. Saving is unsupported by default.
    fn stream_info_for_save(&self, _id: &AssetId, _asset_type: &AssetType) -> AssetStreamInfo {
        AssetStreamInfo::default()
    }
}

/// An in-memory catalog of asset files.
///
/// Relative stream names are resolved against the catalog's root directory. The
/// same location is used for loading and saving.
#[derive(Debug, Default)]
pub struct FileCatalog {
    root: PathBuf,
    entries: RwLock<HashMap<AssetId, AssetStreamInfo>>,
}

impl FileCatalog {
    /// Creates a catalog resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registers or replaces the stream of an asset.
    pub fn insert(&self, id: AssetId, mut info: AssetStreamInfo) {
        if info.stream_name.is_relative() {
            info.stream_name = self.root.join(&info.stream_name);
        }
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, info);
    }

    /// Registers a whole file as the stream of an asset.
    pub fn insert_file(&self, id: AssetId, path: impl AsRef<Path>) {
        self.insert(id, AssetStreamInfo::file(path.as_ref()));
    }

    /// Forgets an asset and returns its stream info.
    pub fn remove(&self, id: &AssetId) -> Option<AssetStreamInfo> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    /// Returns `true` if the catalog knows the asset.
    pub fn contains(&self, id: &AssetId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    /// Returns the number of known assets.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, id: &AssetId) -> AssetStreamInfo {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

impl AssetCatalog for FileCatalog {
    fn stream_info_for_load(&self, id: &AssetId, _asset_type: &AssetType) -> AssetStreamInfo {
        self.lookup(id)
    }

    fn stream_info_for_save(&self, id: &AssetId, _asset_type: &AssetType) -> AssetStreamInfo {
        self.lookup(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_resolve_against_root() {
        let catalog = FileCatalog::new("/data");
        let id = AssetId::from_name("brick");
        catalog.insert_file(id, "textures/brick.tex");

        let info = catalog.stream_info_for_load(&id, &AssetType::from_name("texture"));
        assert!(info.is_valid());
        assert_eq!(info.stream_name, PathBuf::from("/data/textures/brick.tex"));
        assert_eq!(info.offset, 0);
    }

    #[test]
    fn test_unknown_asset_has_invalid_info() {
        let catalog = FileCatalog::new("/data");
        let info = catalog.stream_info_for_load(&AssetId::random(), &AssetType::from_name("x"));
        assert!(!info.is_valid());
    }

    #[test]
    fn test_remove_forgets_asset() {
        let catalog = FileCatalog::default();
        let id = AssetId::random();
        catalog.insert(id, AssetStreamInfo::slice("/packs/a.pack", 64, 128));
        assert!(catalog.contains(&id));

        let removed = catalog.remove(&id).unwrap();
        assert_eq!((removed.offset, removed.length), (64, 128));
        assert!(catalog.is_empty());
    }
}
