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

//! Asset notifications and the listeners that receive them.
//!
//! Worker threads never call listeners. They queue [`AssetEvent`]s on the
//! database's bus, and the owning thread delivers them from
//! [`AssetDatabase::dispatch_events`](crate::asset::AssetDatabase::dispatch_events).

use crate::asset::AssetHandle;
use ember_core::{AssetId, AssetType};
use std::fmt;
use std::sync::Arc;

/// Identifies a connected listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// A state change of an asset.
#[derive(Debug)]
pub enum AssetEventKind {
    /// A load completed and the asset is ready.
    Ready(AssetHandle),
    /// A load failed; the asset is in the error state.
    Error(AssetHandle),
    /// New data replaced the asset's data.
    Reloaded(AssetHandle),
    /// A reload failed; the previous data is kept.
    ReloadError(AssetHandle),
    /// A save finished, successfully or not.
    Saved(AssetHandle, bool),
    /// The last handle was released and the data destroyed.
    Unloaded(AssetId, AssetType),
}

impl AssetEventKind {
    /// The asset the event is about.
    pub fn asset_id(&self) -> AssetId {
        match self {
            AssetEventKind::Ready(asset)
            | AssetEventKind::Error(asset)
            | AssetEventKind::Reloaded(asset)
            | AssetEventKind::ReloadError(asset)
            | AssetEventKind::Saved(asset, _) => asset.id(),
            AssetEventKind::Unloaded(id, _) => *id,
        }
    }
}

/// A queued notification.
#[derive(Debug)]
pub(crate) struct AssetEvent {
    pub(crate) kind: AssetEventKind,
    /// Publication sequence; listeners connected after it never see the event.
    pub(crate) sequence: u64,
    /// Delivered only to this listener when set.
    pub(crate) target: Option<ListenerId>,
}

/// Receives asset notifications on the thread that dispatches events.
///
/// Every method defaults to doing nothing.
pub trait AssetEventHandler: Send + Sync {
    /// The asset finished loading.
    fn on_asset_ready(&self, _asset: &AssetHandle) {}
    /// The asset's data was replaced.
    fn on_asset_reloaded(&self, _asset: &AssetHandle) {}
    /// A reload failed.
    fn on_asset_reload_error(&self, _asset: &AssetHandle) {}
    /// A save finished.
    fn on_asset_saved(&self, _asset: &AssetHandle, _success: bool) {}
    /// The asset was released and destroyed.
    fn on_asset_unloaded(&self, _id: &AssetId, _asset_type: &AssetType) {}
    /// A load failed.
    fn on_asset_error(&self, _asset: &AssetHandle) {}
}

pub(crate) fn deliver(handler: &dyn AssetEventHandler, kind: &AssetEventKind) {
    match kind {
        AssetEventKind::Ready(asset) => handler.on_asset_ready(asset),
        AssetEventKind::Error(asset) => handler.on_asset_error(asset),
        AssetEventKind::Reloaded(asset) => handler.on_asset_reloaded(asset),
        AssetEventKind::ReloadError(asset) => handler.on_asset_reload_error(asset),
        AssetEventKind::Saved(asset, success) => handler.on_asset_saved(asset, *success),
        AssetEventKind::Unloaded(id, asset_type) => handler.on_asset_unloaded(id, asset_type),
    }
}

type AssetCallback = Box<dyn Fn(&AssetHandle) + Send + Sync>;

/// An [`AssetEventHandler`] built from closures.
///
/// ```
/// use ember_io::asset::AssetCallbacks;
///
/// let callbacks = AssetCallbacks::new()
///     .on_ready(|asset| println!("{} is ready", asset.id()))
///     .on_error(|asset| eprintln!("{} failed to load", asset.id()));
/// # let _ = callbacks;
/// ```
#[derive(Default)]
pub struct AssetCallbacks {
    ready: Option<AssetCallback>,
    error: Option<AssetCallback>,
    reloaded: Option<AssetCallback>,
    reload_error: Option<AssetCallback>,
    saved: Option<Box<dyn Fn(&AssetHandle, bool) + Send + Sync>>,
    unloaded: Option<Box<dyn Fn(&AssetId, &AssetType) + Send + Sync>>,
}

impl AssetCallbacks {
    /// Creates a handler that ignores every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback for completed loads.
    pub fn on_ready(mut self, f: impl Fn(&AssetHandle) + Send + Sync + 'static) -> Self {
        self.ready = Some(Box::new(f));
        self
    }

    /// Sets the callback for failed loads.
    pub fn on_error(mut self, f: impl Fn(&AssetHandle) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the callback for completed reloads.
    pub fn on_reloaded(mut self, f: impl Fn(&AssetHandle) + Send + Sync + 'static) -> Self {
        self.reloaded = Some(Box::new(f));
        self
    }

    /// Sets the callback for failed reloads.
    pub fn on_reload_error(mut self, f: impl Fn(&AssetHandle) + Send + Sync + 'static) -> Self {
        self.reload_error = Some(Box::new(f));
        self
    }

    /// Sets the callback for finished saves.
    pub fn on_saved(mut self, f: impl Fn(&AssetHandle, bool) + Send + Sync + 'static) -> Self {
        self.saved = Some(Box::new(f));
        self
    }

    /// Sets the callback for released assets.
    pub fn on_unloaded(mut self, f: impl Fn(&AssetId, &AssetType) + Send + Sync + 'static) -> Self {
        self.unloaded = Some(Box::new(f));
        self
    }

    /// Wraps the callbacks for [`AssetDatabase::connect`](crate::asset::AssetDatabase::connect).
    pub fn into_handler(self) -> Arc<dyn AssetEventHandler> {
        Arc::new(self)
    }
}

impl AssetEventHandler for AssetCallbacks {
    fn on_asset_ready(&self, asset: &AssetHandle) {
        if let Some(f) = &self.ready {
            f(asset);
        }
    }

    fn on_asset_reloaded(&self, asset: &AssetHandle) {
        if let Some(f) = &self.reloaded {
            f(asset);
        }
    }

    fn on_asset_reload_error(&self, asset: &AssetHandle) {
        if let Some(f) = &self.reload_error {
            f(asset);
        }
    }

    fn on_asset_saved(&self, asset: &AssetHandle, success: bool) {
        if let Some(f) = &self.saved {
            f(asset, success);
        }
    }

    fn on_asset_unloaded(&self, id: &AssetId, asset_type: &AssetType) {
        if let Some(f) = &self.unloaded {
            f(id, asset_type);
        }
    }

    fn on_asset_error(&self, asset: &AssetHandle) {
        if let Some(f) = &self.error {
            f(asset);
        }
    }
}

impl fmt::Debug for AssetCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCallbacks")
            .field("ready", &self.ready.is_some())
            .field("error", &self.error.is_some())
            .field("reloaded", &self.reloaded.is_some())
            .field("reload_error", &self.reload_error.is_some())
            .field("saved", &self.saved.is_some())
            .field("unloaded", &self.unloaded.is_some())
            .finish()
    }
}

/// A connected listener and the assets it listens to.
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    /// `None` listens to every asset.
    pub(crate) asset: Option<AssetId>,
    /// Events published before this sequence predate the connection.
    pub(crate) since: u64,
    pub(crate) handler: Arc<dyn AssetEventHandler>,
}

impl Listener {
    pub(crate) fn wants(&self, event: &AssetEvent) -> bool {
        match event.target {
            Some(target) => target == self.id,
            None => {
                event.sequence >= self.since
                    && self.asset.map_or(true, |id| id == event.kind.asset_id())
            }
        }
    }
}
