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

use crate::asset::database::Shared;
use crate::asset::{AssetError, AssetHandle, AssetPayload};
use ember_core::{AssetId, AssetType};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Decides whether a dependency discovered during a load should be loaded too.
pub type AssetFilter = Arc<dyn Fn(&AssetId, &AssetType) -> bool + Send + Sync>;

/// The per-type strategy that creates, loads, saves and destroys asset payloads.
///
/// Handlers are shared between the database and its worker threads, so every
/// method takes `&self` and may be called concurrently for different assets.
pub trait AssetHandler: Send + Sync {
    /// Creates the empty payload of a new asset.
    ///
    /// Returning `None` makes the request that triggered the creation fail.
    fn create_asset(&self, id: &AssetId, asset_type: &AssetType) -> Option<AssetPayload>;

    /// Fills `payload` from `stream`.
    fn load_asset_data(
        &self,
        ctx: &LoadContext<'_>,
        payload: &mut AssetPayload,
        stream: &mut dyn Read,
    ) -> Result<(), AssetError>;

    /// Fills `payload` from a file the handler opens itself.
    ///
    /// Used for catalog entries flagged as custom streams. The default opens the file
    /// and reads it through [`load_asset_data`](Self::load_asset_data).
    fn load_asset_data_from_path(
        &self,
        ctx: &LoadContext<'_>,
        payload: &mut AssetPayload,
        path: &Path,
    ) -> Result<(), AssetError> {
        let mut stream = BufReader::new(File::open(path)?);
        self.load_asset_data(ctx, payload, &mut stream)
    }

    /// Writes `payload` to `stream`. Saving is unsupported unless overridden.
    fn save_asset_data(
        &self,
        asset_type: &AssetType,
        _payload: &AssetPayload,
        _stream: &mut dyn Write,
    ) -> Result<(), AssetError> {
        Err(AssetError::SaveUnsupported(*asset_type))
    }

    /// Finishes a load once the data stage ran.
    ///
    /// Receives whether the data stage succeeded and returns the final outcome, so a
    /// handler can still reject data that decoded but failed validation.
    fn init_asset(&self, _asset: &AssetHandle, load_stage_succeeded: bool, _is_reload: bool) -> bool {
        load_stage_succeeded
    }

    /// Releases a payload. Called exactly once per payload.
    fn destroy_asset(&self, payload: AssetPayload) {
        drop(payload);
    }

    /// The asset types this handler can serve.
    fn handled_asset_types(&self) -> Vec<AssetType>;

    /// Lets a handler turn down individual assets of a type it serves.
    fn can_handle_asset(&self, _id: &AssetId) -> bool {
        true
    }
}

/// What a handler sees of the load it is running.
pub struct LoadContext<'a> {
    id: AssetId,
    asset_type: AssetType,
    is_reload: bool,
    filter: Option<&'a AssetFilter>,
    database: &'a Arc<Shared>,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(
        id: AssetId,
        asset_type: AssetType,
        is_reload: bool,
        filter: Option<&'a AssetFilter>,
        database: &'a Arc<Shared>,
    ) -> Self {
        Self {
            id,
            asset_type,
            is_reload,
            filter,
            database,
        }
    }

    /// The asset being loaded.
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// The type of the asset being loaded.
    pub fn asset_type(&self) -> &AssetType {
        &self.asset_type
    }

    /// Whether this load replaces the data of an already loaded asset.
    pub fn is_reload(&self) -> bool {
        self.is_reload
    }

    /// Returns `true` if the load's filter lets `id` be loaded as a dependency.
    pub fn accepts(&self, id: &AssetId, asset_type: &AssetType) -> bool {
        self.filter.map_or(true, |filter| filter(id, asset_type))
    }

    /// Gets a dependency of the asset being loaded, loading it on this thread.
    ///
    /// Loading in place keeps a worker from waiting on another worker. A dependency
    /// that is already being loaded elsewhere is returned without waiting for it.
    /// Returns `None` if the filter rejects the dependency or it cannot be created.
    pub fn load_dependency(&self, id: &AssetId, asset_type: &AssetType) -> Option<AssetHandle> {
        if !self.accepts(id, asset_type) {
            log::debug!(
                "AssetDatabase: filter skipped dependency {id} of asset {}",
                self.id
            );
            return None;
        }
        self.database.load_blocking(id, asset_type, self.filter.cloned())
    }
}
