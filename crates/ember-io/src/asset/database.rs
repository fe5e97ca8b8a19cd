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

use crate::asset::events::{deliver, AssetEvent, Listener};
use crate::asset::jobs::{JobKind, WorkerPool};
use crate::asset::record::AssetRecord;
use crate::asset::{
    AssetCatalog, AssetDatabaseConfig, AssetError, AssetEventHandler, AssetEventKind, AssetFilter,
    AssetHandle, AssetHandler, AssetHandlerRegistry, AssetPayload, AssetStatus, AssetStreamInfo,
    CatalogRegistry, ListenerId, LoadContext,
};
use ember_core::event::EventBus;
use ember_core::{AssetData, AssetId, AssetType};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one handler stage. A panic is logged and reported as `None`.
fn guarded<R>(id: &AssetId, stage: &str, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            log::error!("AssetDatabase: handler panicked in {stage} for asset {id}");
            None
        }
    }
}

/// How [`AssetDatabase::get_asset`] treats an asset that is not loaded yet.
#[derive(Clone)]
pub struct GetAssetOptions {
    /// Start loading the asset if it has not been loaded.
    pub queue_load: bool,
    /// Load on the calling thread instead of a worker.
    pub load_blocking: bool,
    /// Decides which dependencies the load may pull in.
    pub filter: Option<AssetFilter>,
}

impl GetAssetOptions {
    /// Only registers the asset; no load is started.
    pub fn no_load() -> Self {
        Self {
            queue_load: false,
            ..Self::default()
        }
    }

    /// Loads on the calling thread before returning.
    pub fn blocking() -> Self {
        Self {
            load_blocking: true,
            ..Self::default()
        }
    }

    /// Sets the dependency filter.
    #[must_use]
    pub fn with_filter(
        mut self,
        filter: impl Fn(&AssetId, &AssetType) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl Default for GetAssetOptions {
    fn default() -> Self {
        Self {
            queue_load: true,
            load_blocking: false,
            filter: None,
        }
    }
}

impl std::fmt::Debug for GetAssetOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetAssetOptions")
            .field("queue_load", &self.queue_load)
            .field("load_blocking", &self.load_blocking)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// State shared by the database, its worker jobs and every asset handle.
///
/// Lock order: `get_or_create` before `assets`, `ready` before `assets`. No
/// handler, listener or payload lock is held while a handler runs, except the
/// payload read lock during a save.
pub(crate) struct Shared {
    handlers: AssetHandlerRegistry,
    catalogs: CatalogRegistry,
    assets: Mutex<HashMap<AssetId, Arc<AssetRecord>>>,
    /// Serializes every path that may create a record.
    get_or_create: Mutex<()>,
    /// Makes a status change and the matching notification one step.
    ready: Mutex<()>,
    /// Reloads in flight; each holds a handle until it completes.
    reloads: Mutex<HashMap<AssetId, AssetHandle>>,
    events: EventBus<AssetEvent>,
    next_sequence: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
    next_listener: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            handlers: AssetHandlerRegistry::new(),
            catalogs: CatalogRegistry::new(),
            assets: Mutex::new(HashMap::new()),
            get_or_create: Mutex::new(()),
            ready: Mutex::new(()),
            reloads: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            next_sequence: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    // --- Records ---

    fn find(self: &Arc<Self>, id: &AssetId) -> Option<AssetHandle> {
        lock(&self.assets)
            .get(id)
            .map(|record| AssetHandle::acquire(Arc::clone(record), Arc::downgrade(self)))
    }

    fn asset_count(&self) -> usize {
        lock(&self.assets).len()
    }

    /// Returns the record for `id`, creating it if needed. The flag is `true` if
    /// this call created it.
    fn get_or_create(
        self: &Arc<Self>,
        id: &AssetId,
        asset_type: &AssetType,
    ) -> Result<(AssetHandle, bool), AssetError> {
        if !id.is_valid() {
            return Err(AssetError::InvalidId);
        }

        let _creating = lock(&self.get_or_create);
        if let Some(existing) = self.find(id) {
            if existing.asset_type() != *asset_type {
                log::warn!(
                    "AssetDatabase: asset {id} requested as {asset_type} but registered as {}",
                    existing.asset_type()
                );
            }
            return Ok((existing, false));
        }

        let created = self.insert_record(id, asset_type, AssetStatus::NotLoaded)?;
        Ok((created, true))
    }

    /// Creates a record that must not exist yet.
    fn create_new(
        self: &Arc<Self>,
        id: &AssetId,
        asset_type: &AssetType,
    ) -> Result<AssetHandle, AssetError> {
        if !id.is_valid() {
            return Err(AssetError::InvalidId);
        }

        let _creating = lock(&self.get_or_create);
        if lock(&self.assets).contains_key(id) {
            return Err(AssetError::AlreadyExists(*id));
        }
        self.insert_record(id, asset_type, AssetStatus::Ready)
    }

    /// Must be called with `get_or_create` held.
    fn insert_record(
        self: &Arc<Self>,
        id: &AssetId,
        asset_type: &AssetType,
        status: AssetStatus,
    ) -> Result<AssetHandle, AssetError> {
        let handler = self
            .handlers
            .handler(asset_type)
            .ok_or(AssetError::NoHandler(*asset_type))?;
        if !handler.can_handle_asset(id) {
            return Err(AssetError::Refused(*id));
        }
        let payload = handler
            .create_asset(id, asset_type)
            .ok_or(AssetError::CreateFailed(*id))?;

        let record = Arc::new(AssetRecord::new(*id, *asset_type, status, payload, handler));
        let handle = AssetHandle::acquire(Arc::clone(&record), Arc::downgrade(self));
        lock(&self.assets).insert(*id, record);

        log::debug!("AssetDatabase: created asset {id} ({asset_type}) as {status:?}");
        Ok(handle)
    }

    /// Unregisters and destroys a record whose last handle was dropped.
    ///
    /// A lookup may have taken a new reference before the map lock was acquired;
    /// the record then stays registered and the later release destroys it.
    pub(crate) fn release_asset(&self, record: &Arc<AssetRecord>) {
        let removed = {
            let mut assets = lock(&self.assets);
            match assets.get(&record.id()) {
                Some(current) if Arc::ptr_eq(current, record) && record.use_count() == 0 => {
                    assets.remove(&record.id());
                    true
                }
                _ => false,
            }
        };
        if !removed {
            return;
        }

        log::debug!("AssetDatabase: released asset {}", record.id());
        record.destroy();
        self.notify(
            AssetEventKind::Unloaded(record.id(), record.asset_type()),
            None,
        );
    }

    // --- Loading ---

    fn stream_info_for_load(&self, id: &AssetId, asset_type: &AssetType) -> AssetStreamInfo {
        self.catalogs
            .catalog(asset_type)
            .map(|catalog| catalog.stream_info_for_load(id, asset_type))
            .unwrap_or_default()
    }

    fn stream_info_for_save(&self, id: &AssetId, asset_type: &AssetType) -> AssetStreamInfo {
        self.catalogs
            .catalog(asset_type)
            .map(|catalog| catalog.stream_info_for_save(id, asset_type))
            .unwrap_or_default()
    }

    /// Gets an asset and, if nobody started loading it, loads it on this thread.
    pub(crate) fn load_blocking(
        self: &Arc<Self>,
        id: &AssetId,
        asset_type: &AssetType,
        filter: Option<AssetFilter>,
    ) -> Option<AssetHandle> {
        let (asset, _) = match self.get_or_create(id, asset_type) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("AssetDatabase: cannot get asset {id}: {e}");
                return None;
            }
        };
        if asset
            .record()
            .transition(AssetStatus::NotLoaded, AssetStatus::Queued)
        {
            self.run_load(&asset, filter.as_ref());
        }
        Some(asset)
    }

    fn read_stream(
        &self,
        ctx: &LoadContext<'_>,
        handler: &dyn AssetHandler,
        payload: &mut AssetPayload,
    ) -> Result<(), AssetError> {
        let info = self.stream_info_for_load(ctx.id(), ctx.asset_type());
        if !info.is_valid() {
            return Err(AssetError::NoStreamInfo(*ctx.id()));
        }
        if info.is_custom_stream {
            return handler.load_asset_data_from_path(ctx, payload, &info.stream_name);
        }

        let mut file = File::open(&info.stream_name)?;
        if info.offset > 0 {
            file.seek(SeekFrom::Start(info.offset))?;
        }
        let mut reader = BufReader::new(file);
        if info.length > 0 {
            handler.load_asset_data(ctx, payload, &mut reader.take(info.length))
        } else {
            handler.load_asset_data(ctx, payload, &mut reader)
        }
    }

    /// Runs a first load. The job owns `asset`, so the record outlives the load.
    fn run_load(self: &Arc<Self>, asset: &AssetHandle, filter: Option<&AssetFilter>) {
        let record = asset.record();
        let (id, asset_type) = (record.id(), record.asset_type());
        let handler = Arc::clone(record.handler());
        record.set_status(AssetStatus::Loading);
        log::debug!("AssetDatabase: loading asset {id}");

        let payload = match record.take_payload() {
            Some(payload) => Some(payload),
            None => guarded(&id, "create_asset", || handler.create_asset(&id, &asset_type)).flatten(),
        };
        let loaded = match payload {
            Some(mut payload) => {
                let ctx = LoadContext::new(id, asset_type, false, filter, self);
                let result = guarded(&id, "load_asset_data", || {
                    self.read_stream(&ctx, handler.as_ref(), &mut payload)
                })
                .unwrap_or_else(|| Err(AssetError::HandlerPanicked(id)));
                // Back in the record even after a panic, so release still destroys it.
                record.replace_payload(payload);
                match result {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("AssetDatabase: failed to load asset {id}: {e}");
                        false
                    }
                }
            }
            None => {
                log::warn!("AssetDatabase: asset {id} has no payload to load into");
                false
            }
        };

        let succeeded = guarded(&id, "init_asset", || handler.init_asset(asset, loaded, false))
            .unwrap_or(false);
        self.finish_load(asset, succeeded);
    }

    fn finish_load(&self, asset: &AssetHandle, succeeded: bool) {
        let _ready = lock(&self.ready);
        if succeeded {
            asset.record().set_status(AssetStatus::Ready);
            log::debug!("AssetDatabase: asset {} is ready", asset.id());
            self.notify(AssetEventKind::Ready(asset.clone()), None);
        } else {
            asset.record().set_status(AssetStatus::Error);
            self.notify(AssetEventKind::Error(asset.clone()), None);
        }
    }

    /// Replaces the data of a loaded asset, from its stream or from `replacement`.
    fn run_reload(self: &Arc<Self>, asset: &AssetHandle, replacement: Option<AssetPayload>) {
        let record = asset.record();
        let (id, asset_type) = (record.id(), record.asset_type());
        let handler = Arc::clone(record.handler());

        let fresh = match replacement {
            Some(payload) => Ok(payload),
            None => self.reload_from_stream(&id, &asset_type, handler.as_ref()),
        };

        match fresh {
            Ok(payload) => {
                if let Some(old) = record.replace_payload(payload) {
                    guarded(&id, "destroy_asset", || handler.destroy_asset(old));
                }
                let succeeded = guarded(&id, "init_asset", || handler.init_asset(asset, true, true))
                    .unwrap_or(false);

                let _ready = lock(&self.ready);
                if succeeded {
                    record.set_status(AssetStatus::Ready);
                    log::debug!("AssetDatabase: reloaded asset {id}");
                    self.notify(AssetEventKind::Reloaded(asset.clone()), None);
                } else {
                    record.set_status(AssetStatus::Error);
                    self.notify(AssetEventKind::ReloadError(asset.clone()), None);
                }
            }
            Err(e) => {
                log::warn!("AssetDatabase: failed to reload asset {id}: {e}");
                let _ready = lock(&self.ready);
                self.notify(AssetEventKind::ReloadError(asset.clone()), None);
            }
        }

        let finished = lock(&self.reloads).remove(&id);
        drop(finished);
    }

    fn reload_from_stream(
        self: &Arc<Self>,
        id: &AssetId,
        asset_type: &AssetType,
        handler: &dyn AssetHandler,
    ) -> Result<AssetPayload, AssetError> {
        let mut payload = guarded(id, "create_asset", || handler.create_asset(id, asset_type))
            .flatten()
            .ok_or(AssetError::CreateFailed(*id))?;
        let ctx = LoadContext::new(*id, *asset_type, true, None, self);
        let result = guarded(id, "load_asset_data", || {
            self.read_stream(&ctx, handler, &mut payload)
        })
        .unwrap_or_else(|| Err(AssetError::HandlerPanicked(*id)));
        match result {
            Ok(()) => Ok(payload),
            Err(e) => {
                guarded(id, "destroy_asset", || handler.destroy_asset(payload));
                Err(e)
            }
        }
    }

    // --- Saving ---

    fn run_save(&self, asset: &AssetHandle) {
        let id = asset.id();
        let result = guarded(&id, "save_asset_data", || self.write_asset(asset))
            .unwrap_or_else(|| Err(AssetError::HandlerPanicked(id)));
        if let Err(e) = &result {
            log::warn!("AssetDatabase: failed to save asset {id}: {e}");
        }
        let _ready = lock(&self.ready);
        self.notify(AssetEventKind::Saved(asset.clone(), result.is_ok()), None);
    }

    fn write_asset(&self, asset: &AssetHandle) -> Result<(), AssetError> {
        let (id, asset_type) = (asset.id(), asset.asset_type());
        let info = self.stream_info_for_save(&id, &asset_type);
        if !info.is_valid() {
            return Err(AssetError::NoStreamInfo(id));
        }

        let mut writer = BufWriter::new(File::create(&info.stream_name)?);
        let record = asset.record();
        record.with_payload(|payload| match payload {
            Some(payload) => record
                .handler()
                .save_asset_data(&asset_type, payload, &mut writer),
            None => Err(AssetError::NotFound(id)),
        })?;
        writer.flush()?;
        Ok(())
    }

    // --- Notifications ---

    fn notify(&self, kind: AssetEventKind, target: Option<ListenerId>) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.events.publish(AssetEvent {
            kind,
            sequence,
            target,
        });
    }

    fn connect(
        self: &Arc<Self>,
        asset: Option<AssetId>,
        handler: Arc<dyn AssetEventHandler>,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));

        let _ready = lock(&self.ready);
        lock(&self.listeners).push(Listener {
            id,
            asset,
            since: self.next_sequence.load(Ordering::SeqCst),
            handler,
        });

        if let Some(existing) = asset.and_then(|asset_id| self.find(&asset_id)) {
            if existing.is_ready() {
                self.notify(AssetEventKind::Ready(existing), Some(id));
            }
        }
        id
    }

    fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        listeners.len() != before
    }

    fn dispatch(&self) -> usize {
        let events = self.events.drain();
        let count = events.len();
        for event in events {
            let recipients: Vec<Arc<dyn AssetEventHandler>> = lock(&self.listeners)
                .iter()
                .filter(|listener| listener.wants(&event))
                .map(|listener| Arc::clone(&listener.handler))
                .collect();
            for recipient in recipients {
                deliver(recipient.as_ref(), &event.kind);
            }
        }
        count
    }
}

/// A reference-counted, thread-safe store of assets with background loading.
///
/// The database maps each [`AssetId`] to exactly one record. Handlers registered
/// per [`AssetType`] create, load, save and destroy the payloads, and catalogs
/// tell the database where the data lives. Loads run on a pool of worker threads;
/// their outcome is reported through notifications that
/// [`dispatch_events`](Self::dispatch_events) delivers on the thread that created
/// the database.
///
/// There is no global instance: create one with [`AssetDatabase::create`] and pass
/// it to the code that needs it.
pub struct AssetDatabase {
    shared: Arc<Shared>,
    pool: WorkerPool,
    owner: ThreadId,
    config: AssetDatabaseConfig,
}

impl AssetDatabase {
    /// Creates a database and starts its worker threads.
    ///
    /// The calling thread becomes the owning thread that dispatches notifications.
    pub fn create(config: AssetDatabaseConfig) -> Result<Self, AssetError> {
        let pool = WorkerPool::start(&config)?;
        Ok(Self {
            shared: Arc::new(Shared::new()),
            pool,
            owner: thread::current().id(),
            config,
        })
    }

    /// Stops the workers after they finish the queued jobs, then drops the database.
    ///
    /// Handles that outlive the database stay valid; their payloads are destroyed
    /// when the last of them is dropped.
    pub fn destroy(self) {
        drop(self);
    }

    /// Returns the configuration the database was created with.
    pub fn config(&self) -> &AssetDatabaseConfig {
        &self.config
    }

    // --- Handlers and catalogs ---

    /// Registers `handler` for `asset_type`. Fails if the type already has a handler.
    pub fn register_handler(
        &self,
        handler: Arc<dyn AssetHandler>,
        asset_type: AssetType,
    ) -> Result<(), AssetError> {
        self.shared.handlers.register_handler(handler, asset_type)
    }

    /// Registers `handler` for every type it handles.
    pub fn register_handler_for_all(&self, handler: Arc<dyn AssetHandler>) -> Result<(), AssetError> {
        self.shared.handlers.register_handler_for_all(handler)
    }

    /// Removes `handler` from every type it serves. Existing assets keep their handler.
    pub fn unregister_handler(&self, handler: &Arc<dyn AssetHandler>) -> usize {
        self.shared.handlers.unregister_handler(handler)
    }

    /// Returns the handler serving `asset_type`.
    pub fn handler(&self, asset_type: &AssetType) -> Option<Arc<dyn AssetHandler>> {
        self.shared.handlers.handler(asset_type)
    }

    /// Returns the handler registry.
    pub fn handlers(&self) -> &AssetHandlerRegistry {
        &self.shared.handlers
    }

    /// Registers `catalog` for `asset_type`.
    pub fn register_catalog(
        &self,
        catalog: Arc<dyn AssetCatalog>,
        asset_type: AssetType,
    ) -> Result<(), AssetError> {
        self.shared.catalogs.register_catalog(catalog, asset_type)
    }

    /// Registers `catalog` for every type in `asset_types`, or for none if one is taken.
    pub fn register_catalog_for_types(
        &self,
        catalog: Arc<dyn AssetCatalog>,
        asset_types: &[AssetType],
    ) -> Result<(), AssetError> {
        self.shared
            .catalogs
            .register_catalog_for_types(catalog, asset_types)
    }

    /// Removes `catalog` from every type it serves.
    pub fn unregister_catalog(&self, catalog: &Arc<dyn AssetCatalog>) -> usize {
        self.shared.catalogs.unregister_catalog(catalog)
    }

    /// Returns the catalog registry.
    pub fn catalogs(&self) -> &CatalogRegistry {
        &self.shared.catalogs
    }

    /// Asks the catalog of `asset_type` where to load `id` from.
    pub fn stream_info_for_load(&self, id: &AssetId, asset_type: &AssetType) -> AssetStreamInfo {
        self.shared.stream_info_for_load(id, asset_type)
    }

    /// Asks the catalog of `asset_type` where to save `id` to.
    pub fn stream_info_for_save(&self, id: &AssetId, asset_type: &AssetType) -> AssetStreamInfo {
        self.shared.stream_info_for_save(id, asset_type)
    }

    // --- Assets ---

    /// Returns a handle to `id`, creating the asset if it is unknown.
    ///
    /// Concurrent calls for the same new id create a single record. With
    /// `queue_load`, an asset that was never loaded starts loading; completion is
    /// reported through notifications, not by this call. Returns `None` for an
    /// invalid id, an unhandled type, or when the handler cannot create the asset.
    pub fn get_asset(
        &self,
        id: &AssetId,
        asset_type: &AssetType,
        options: GetAssetOptions,
    ) -> Option<AssetHandle> {
        match self.try_get_asset(id, asset_type, options) {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("AssetDatabase: cannot get asset {id}: {e}");
                None
            }
        }
    }

    /// Like [`get_asset`](Self::get_asset), reporting why no handle was returned.
    pub fn try_get_asset(
        &self,
        id: &AssetId,
        asset_type: &AssetType,
        options: GetAssetOptions,
    ) -> Result<AssetHandle, AssetError> {
        let (asset, _) = self.shared.get_or_create(id, asset_type)?;
        if options.queue_load {
            self.queue_load(&asset, &options);
        }
        Ok(asset)
    }

    /// Gets and asynchronously loads an asset.
    pub fn get_asset_default(&self, id: &AssetId, asset_type: &AssetType) -> Option<AssetHandle> {
        self.get_asset(id, asset_type, GetAssetOptions::default())
    }

    /// Gets and asynchronously loads an asset whose payload type is `T`.
    pub fn get<T: AssetData>(&self, id: &AssetId) -> Option<AssetHandle> {
        self.get_asset_default(id, &T::asset_type())
    }

    fn queue_load(&self, asset: &AssetHandle, options: &GetAssetOptions) {
        if !asset
            .record()
            .transition(AssetStatus::NotLoaded, AssetStatus::Queued)
        {
            return;
        }

        if options.load_blocking {
            self.shared.run_load(asset, options.filter.as_ref());
            return;
        }

        let shared = Arc::clone(&self.shared);
        let job_asset = asset.clone();
        let filter = options.filter.clone();
        self.pool.submit(JobKind::Load, asset.id(), move || {
            shared.run_load(&job_asset, filter.as_ref());
        });
    }

    /// Returns a handle to a registered asset without creating or loading anything.
    pub fn find_asset(&self, id: &AssetId) -> Option<AssetHandle> {
        self.shared.find(id)
    }

    /// Creates a brand-new, ready asset that is not backed by any catalog entry.
    ///
    /// Returns `None` if the id is already registered.
    pub fn create_asset(&self, id: &AssetId, asset_type: &AssetType) -> Option<AssetHandle> {
        match self.shared.create_new(id, asset_type) {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("AssetDatabase: cannot create asset {id}: {e}");
                None
            }
        }
    }

    /// Writes a ready asset through its handler on a worker.
    ///
    /// The outcome is reported by a `Saved` notification. Returns `false` if the
    /// asset is not ready.
    pub fn save_asset(&self, asset: &AssetHandle) -> bool {
        if !asset.is_ready() {
            log::warn!("AssetDatabase: cannot save asset {} while {:?}", asset.id(), asset.status());
            return false;
        }
        let shared = Arc::clone(&self.shared);
        let job_asset = asset.clone();
        self.pool.submit(JobKind::Save, asset.id(), move || {
            shared.run_save(&job_asset);
        });
        true
    }

    /// Reloads a loaded asset from its stream on a worker.
    ///
    /// The outcome is reported by a `Reloaded` or `ReloadError` notification. Returns
    /// `false` if the asset is unknown, still loading, or already being reloaded.
    pub fn reload_asset(&self, id: &AssetId) -> bool {
        self.schedule_reload(id, None)
    }

    /// Replaces the data of a loaded asset with `payload` on a worker.
    pub fn reload_asset_from_data(&self, id: &AssetId, payload: AssetPayload) -> bool {
        self.schedule_reload(id, Some(payload))
    }

    fn schedule_reload(&self, id: &AssetId, replacement: Option<AssetPayload>) -> bool {
        let Some(asset) = self.shared.find(id) else {
            log::warn!("AssetDatabase: cannot reload unknown asset {id}");
            return false;
        };
        if !matches!(asset.status(), AssetStatus::Ready | AssetStatus::Error) {
            log::debug!("AssetDatabase: asset {id} is still loading, reload skipped");
            return false;
        }

        {
            let mut reloads = lock(&self.shared.reloads);
            if reloads.contains_key(id) {
                log::debug!("AssetDatabase: reload of {id} already in flight");
                return false;
            }
            reloads.insert(*id, asset.clone());
        }

        let shared = Arc::clone(&self.shared);
        self.pool.submit(JobKind::Reload, *id, move || {
            shared.run_reload(&asset, replacement);
        });
        true
    }

    // --- Notifications ---

    /// Delivers the queued notifications to the connected listeners.
    ///
    /// Must be called on the thread that created the database; elsewhere it logs an
    /// error and delivers nothing. Returns the number of events processed.
    pub fn dispatch_events(&self) -> usize {
        if thread::current().id() != self.owner {
            log::error!("AssetDatabase: dispatch_events called outside the owning thread");
            return 0;
        }
        self.shared.dispatch()
    }

    /// Listens to the notifications of one asset.
    ///
    /// If the asset is already ready, a `Ready` notification for this listener is
    /// queued and delivered by the next dispatch.
    pub fn connect(&self, id: &AssetId, handler: Arc<dyn AssetEventHandler>) -> ListenerId {
        self.shared.connect(Some(*id), handler)
    }

    /// Listens to the notifications of every asset.
    pub fn connect_all(&self, handler: Arc<dyn AssetEventHandler>) -> ListenerId {
        self.shared.connect(None, handler)
    }

    /// Stops a listener. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        self.shared.disconnect(id)
    }

    // --- Introspection ---

    /// Returns the number of registered assets.
    pub fn asset_count(&self) -> usize {
        self.shared.asset_count()
    }

    /// Returns the number of submitted jobs that have not finished.
    pub fn active_job_count(&self) -> usize {
        self.pool.tracker().len()
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Returns the number of queued notifications.
    pub fn pending_event_count(&self) -> usize {
        self.shared.events.len()
    }
}

impl Drop for AssetDatabase {
    fn drop(&mut self) {
        self.pool.shutdown();
        let remaining = self.shared.asset_count();
        if remaining > 0 {
            log::warn!("AssetDatabase: destroyed with {remaining} asset(s) still referenced");
        }
    }
}

impl std::fmt::Debug for AssetDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetDatabase")
            .field("assets", &self.asset_count())
            .field("handlers", &self.shared.handlers.len())
            .field("catalogs", &self.shared.catalogs.len())
            .field("workers", &self.worker_count())
            .finish()
    }
}
