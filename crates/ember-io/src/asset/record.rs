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
use crate::asset::AssetHandler;
use ember_core::{AssetId, AssetType};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// The type-erased data of an asset, created and interpreted by its handler.
pub type AssetPayload = Box<dyn Any + Send + Sync>;

/// The load state of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetStatus {
    /// Created but no load was requested.
    NotLoaded = 0,
    /// A load job is waiting for a worker.
    Queued = 1,
    /// A handler is reading the asset's data.
    Loading = 2,
    /// The data is loaded and initialized.
    Ready = 3,
    /// The last load failed. The record stays allocated until released.
    Error = 4,
}

impl AssetStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => AssetStatus::NotLoaded,
            1 => AssetStatus::Queued,
            2 => AssetStatus::Loading,
            3 => AssetStatus::Ready,
            _ => AssetStatus::Error,
        }
    }
}

/// The shared state behind every handle to one asset.
///
/// Exactly one record exists per `AssetId` in a database. The record keeps the
/// handler that created its payload so the same handler destroys it.
pub(crate) struct AssetRecord {
    id: AssetId,
    asset_type: AssetType,
    status: AtomicU8,
    payload: RwLock<Option<AssetPayload>>,
    handler: Arc<dyn AssetHandler>,
    ref_count: AtomicUsize,
    released: AtomicBool,
}

impl AssetRecord {
    pub(crate) fn new(
        id: AssetId,
        asset_type: AssetType,
        status: AssetStatus,
        payload: AssetPayload,
        handler: Arc<dyn AssetHandler>,
    ) -> Self {
        Self {
            id,
            asset_type,
            status: AtomicU8::new(status as u8),
            payload: RwLock::new(Some(payload)),
            handler,
            ref_count: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> AssetId {
        self.id
    }

    pub(crate) fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub(crate) fn handler(&self) -> &Arc<dyn AssetHandler> {
        &self.handler
    }

    pub(crate) fn status(&self) -> AssetStatus {
        AssetStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: AssetStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Moves `from -> to` only if the record is still in `from`.
    pub(crate) fn transition(&self, from: AssetStatus, to: AssetStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn use_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    pub(crate) fn take_payload(&self) -> Option<AssetPayload> {
        self.payload
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Stores a payload and returns the one it replaces.
    pub(crate) fn replace_payload(&self, payload: AssetPayload) -> Option<AssetPayload> {
        self.payload
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(payload)
    }

    pub(crate) fn with_payload<R>(&self, f: impl FnOnce(Option<&AssetPayload>) -> R) -> R {
        let payload = self.payload.read().unwrap_or_else(|e| e.into_inner());
        f(payload.as_ref())
    }

    /// Hands the payload to the handler for destruction. Runs at most once.
    pub(crate) fn destroy(&self) {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        log::trace!("AssetDatabase: destroying asset {}", self.id);
        if let Some(payload) = self.take_payload() {
            self.handler.destroy_asset(payload);
        }
    }
}

/// A counted reference to an asset.
///
/// Cloning a handle increments the asset's use count and dropping it decrements
/// it. When the last handle goes away the database unregisters the asset and its
/// handler destroys the payload. Jobs and queued notifications hold handles too,
/// so an asset is never destroyed while a load or save for it is in flight.
pub struct AssetHandle {
    record: Arc<AssetRecord>,
    database: Weak<Shared>,
}

impl AssetHandle {
    /// Takes a new reference on `record`.
    pub(crate) fn acquire(record: Arc<AssetRecord>, database: Weak<Shared>) -> Self {
        record.ref_count.fetch_add(1, Ordering::AcqRel);
        Self { record, database }
    }

    pub(crate) fn record(&self) -> &Arc<AssetRecord> {
        &self.record
    }

    /// Returns the asset's id.
    pub fn id(&self) -> AssetId {
        self.record.id
    }

    /// Returns the asset's type.
    pub fn asset_type(&self) -> AssetType {
        self.record.asset_type
    }

    /// Returns the current load state.
    pub fn status(&self) -> AssetStatus {
        self.record.status()
    }

    /// Returns `true` once the data is loaded and initialized.
    pub fn is_ready(&self) -> bool {
        self.status() == AssetStatus::Ready
    }

    /// Returns `true` if the last load failed.
    pub fn is_error(&self) -> bool {
        self.status() == AssetStatus::Error
    }

    /// Returns `true` while a load is queued or running.
    pub fn is_loading(&self) -> bool {
        matches!(self.status(), AssetStatus::Queued | AssetStatus::Loading)
    }

    /// Returns the number of live handles to this asset, this one included.
    pub fn use_count(&self) -> usize {
        self.record.use_count()
    }

    /// Returns `true` if both handles refer to the same asset record.
    pub fn ptr_eq(&self, other: &AssetHandle) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    /// Reads the payload as a `T`.
    ///
    /// Returns `None` while the payload is out for loading or if it is not a `T`.
    pub fn read<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.record
            .with_payload(|payload| payload.and_then(|p| p.downcast_ref::<T>()).map(f))
    }

    /// Mutates the payload as a `T`.
    pub fn write<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut payload = self
            .record
            .payload
            .write()
            .unwrap_or_else(|e| e.into_inner());
        payload
            .as_mut()
            .and_then(|p| p.downcast_mut::<T>())
            .map(f)
    }
}

impl Clone for AssetHandle {
    fn clone(&self) -> Self {
        Self::acquire(self.record.clone(), self.database.clone())
    }
}

impl Drop for AssetHandle {
    fn drop(&mut self) {
        if self.record.ref_count.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        match self.database.upgrade() {
            Some(database) => database.release_asset(&self.record),
            // The database is gone; nothing can resurrect the record anymore.
            None => self.record.destroy(),
        }
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("id", &self.record.id)
            .field("asset_type", &self.record.asset_type)
            .field("status", &self.status())
            .field("use_count", &self.use_count())
            .finish()
    }
}
