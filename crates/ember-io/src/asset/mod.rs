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

//! The asset database: reference-counted asset records, per-type handlers,
//! catalogs locating asset data, background loading and notifications.
//!
//! The flow of a typical load:
//! 1. A handler is registered for an [`AssetType`](ember_core::AssetType) and a
//!    catalog tells the database where assets of that type are stored.
//! 2. [`AssetDatabase::get_asset`] returns an [`AssetHandle`] immediately and queues
//!    a load job on a worker thread.
//! 3. The worker reads the stream through the handler and queues a `Ready` or
//!    `Error` notification.
//! 4. The owning thread calls [`AssetDatabase::dispatch_events`], which invokes the
//!    connected [`AssetEventHandler`]s.
//! 5. When the last handle is dropped, the handler destroys the payload and an
//!    `Unloaded` notification is queued.

mod catalog;
mod config;
mod database;
mod error;
mod events;
mod handler;
mod jobs;
mod record;
mod registry;

pub use catalog::*;
pub use config::*;
pub use database::{AssetDatabase, GetAssetOptions};
pub use error::*;
pub use events::{AssetCallbacks, AssetEventHandler, AssetEventKind, ListenerId};
pub use handler::*;
pub use record::{AssetHandle, AssetPayload, AssetStatus};
pub use registry::*;
