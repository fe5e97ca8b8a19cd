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
use std::io;

/// Errors reported by the asset database and its registries.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The asset id is the nil id.
    #[error("asset id is invalid")]
    InvalidId,
    /// Another handler already owns this asset type.
    #[error("a handler is already registered for asset type {0}")]
    HandlerAlreadyRegistered(AssetType),
    /// Another catalog already owns this asset type.
    #[error("a catalog is already registered for asset type {0}")]
    CatalogAlreadyRegistered(AssetType),
    /// No handler is registered for this asset type.
    #[error("no handler registered for asset type {0}")]
    NoHandler(AssetType),
    /// The handler declined to handle this asset.
    #[error("handler refused asset {0}")]
    Refused(AssetId),
    /// The handler could not create an empty payload.
    #[error("handler could not create asset {0}")]
    CreateFailed(AssetId),
    /// An asset with this id is already registered.
    #[error("asset {0} already exists")]
    AlreadyExists(AssetId),
    /// No asset with this id is registered.
    #[error("asset {0} not found")]
    NotFound(AssetId),
    /// No catalog could locate the asset's data.
    #[error("no stream information for asset {0}")]
    NoStreamInfo(AssetId),
    /// The handler could not decode the asset's data.
    #[error("failed to decode asset {id}: {reason}")]
    Decode {
        /// The asset being decoded.
        id: AssetId,
        /// Handler-provided description.
        reason: String,
    },
    /// The handler cannot serialize this asset type.
    #[error("saving is not supported for asset type {0}")]
    SaveUnsupported(AssetType),
    /// A handler panicked while working on the asset.
    #[error("handler panicked while processing asset {0}")]
    HandlerPanicked(AssetId),
    /// Reading or writing the asset's stream failed.
    #[error("asset I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The database configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A worker thread could not be started.
    #[error("failed to spawn asset worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}

impl AssetError {
    /// Builds a [`AssetError::Decode`] error.
    pub fn decode(id: AssetId, reason: impl Into<String>) -> Self {
        Self::Decode {
            id,
            reason: reason.into(),
        }
    }
}

/// Errors in an [`AssetDatabaseConfig`](crate::asset::AssetDatabaseConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The RON document could not be parsed.
    #[error("failed to parse asset database config: {0}")]
    Parse(String),
    /// The database needs at least one worker thread.
    #[error("max_worker_threads must be at least 1")]
    NoWorkers,
}
