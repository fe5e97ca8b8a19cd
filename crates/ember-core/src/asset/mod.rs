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

//! Provides the identifiers and marker traits of Ember's asset system.
//!
//! This module defines the "common language" for asset-related operations. It has
//! no knowledge of how assets are loaded, cached, or released; that is the job of
//! the asset database in `ember-io`.
//!
//! The key pieces are:
//! - [`AssetId`]: the canonical identity of an asset, independent of where it is stored.
//! - [`AssetType`]: a stable identifier selecting the handler responsible for an asset.
//! - The [`AssetData`] trait: ties a payload type to its [`AssetType`] at compile time.

mod id;

pub use id::*;

/// A payload type that can be managed by the asset database.
///
/// The supertraits enforce the guarantees needed for background loading:
/// payloads are sent to worker threads and read concurrently by many holders.
///
/// # Examples
///
/// ```
/// use ember_core::asset::{AssetData, AssetType};
///
/// struct Texture {
///     pixels: Vec<u8>,
/// }
///
/// impl AssetData for Texture {
///     fn asset_type() -> AssetType {
///         AssetType::from_name("texture")
///     }
/// }
///
/// assert_eq!(Texture::asset_type(), AssetType::from_name("texture"));
/// ```
pub trait AssetData: Send + Sync + 'static {
    /// The type identifier under which handlers for this payload are registered.
    fn asset_type() -> AssetType;
}
