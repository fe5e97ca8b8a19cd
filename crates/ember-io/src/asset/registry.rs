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

//! Type-keyed registries of asset handlers and catalogs.
//!
//! Each registry guards its map with its own mutex, separate from the asset map,
//! so registering a handler never contends with asset lookups.

use crate::asset::{AssetCatalog, AssetError, AssetHandler};
use ember_core::AssetType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Compares the object behind two trait-object `Arc`s, ignoring vtables.
fn same_instance<H: ?Sized>(a: &Arc<H>, b: &Arc<H>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

struct TypeMap<H: ?Sized> {
    entries: Mutex<HashMap<AssetType, Arc<H>>>,
}

impl<H: ?Sized> TypeMap<H> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AssetType, Arc<H>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts unless the type is taken.
    fn insert(&self, asset_type: AssetType, value: Arc<H>) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&asset_type) {
            return false;
        }
        entries.insert(asset_type, value);
        true
    }

    /// Inserts `value` for every type, or for none if one of them is taken.
    ///
    /// Returns the first taken type on failure.
    fn insert_all(&self, asset_types: &[AssetType], value: &Arc<H>) -> Result<(), AssetType> {
        let mut entries = self.lock();
        if let Some(taken) = asset_types.iter().find(|t| entries.contains_key(*t)) {
            return Err(*taken);
        }
        for asset_type in asset_types {
            entries.insert(*asset_type, Arc::clone(value));
        }
        Ok(())
    }

    fn remove_all(&self, value: &Arc<H>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, registered| !same_instance(registered, value));
        before - entries.len()
    }

    fn get(&self, asset_type: &AssetType) -> Option<Arc<H>> {
        self.lock().get(asset_type).cloned()
    }

    fn types_of(&self, value: &Arc<H>) -> Vec<AssetType> {
        let mut types: Vec<AssetType> = self
            .lock()
            .iter()
            .filter(|(_, registered)| same_instance(registered, value))
            .map(|(asset_type, _)| *asset_type)
            .collect();
        types.sort();
        types
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Maps each asset type to the single handler that serves it.
pub struct AssetHandlerRegistry {
    handlers: TypeMap<dyn AssetHandler>,
}

impl AssetHandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: TypeMap::new(),
        }
    }

    /// Registers `handler` for `asset_type`.
    ///
    /// Fails if another handler, or this one, already serves the type.
    pub fn register_handler(
        &self,
        handler: Arc<dyn AssetHandler>,
        asset_type: AssetType,
    ) -> Result<(), AssetError> {
        if !self.handlers.insert(asset_type, handler) {
            log::warn!("AssetDatabase: a handler is already registered for {asset_type}");
            return Err(AssetError::HandlerAlreadyRegistered(asset_type));
        }
        log::info!("AssetDatabase: registered handler for {asset_type}");
        Ok(())
    }

    /// Registers `handler` for every type it reports in `handled_asset_types`.
    ///
    /// Either every type is registered or, if one is already taken, none is.
    pub fn register_handler_for_all(&self, handler: Arc<dyn AssetHandler>) -> Result<(), AssetError> {
        let asset_types = handler.handled_asset_types();
        if let Err(taken) = self.handlers.insert_all(&asset_types, &handler) {
            log::warn!("AssetDatabase: a handler is already registered for {taken}");
            return Err(AssetError::HandlerAlreadyRegistered(taken));
        }
        log::info!(
            "AssetDatabase: registered handler for {} asset type(s)",
            asset_types.len()
        );
        Ok(())
    }

    /// Removes every mapping to `handler` and returns how many there were.
    ///
    /// Unregistering an unknown handler is a no-op.
    pub fn unregister_handler(&self, handler: &Arc<dyn AssetHandler>) -> usize {
        let removed = self.handlers.remove_all(handler);
        if removed > 0 {
            log::info!("AssetDatabase: unregistered handler from {removed} asset type(s)");
        }
        removed
    }

    /// Returns the handler serving `asset_type`.
    pub fn handler(&self, asset_type: &AssetType) -> Option<Arc<dyn AssetHandler>> {
        self.handlers.get(asset_type)
    }

    /// Returns the types `handler` is registered for, sorted.
    pub fn handled_types(&self, handler: &Arc<dyn AssetHandler>) -> Vec<AssetType> {
        self.handlers.types_of(handler)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no type has a handler.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AssetHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps each asset type to the catalog that locates its data.
pub struct CatalogRegistry {
    catalogs: TypeMap<dyn AssetCatalog>,
}

impl CatalogRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            catalogs: TypeMap::new(),
        }
    }

    /// Registers `catalog` for `asset_type`. Fails if the type already has a catalog.
    pub fn register_catalog(
        &self,
        catalog: Arc<dyn AssetCatalog>,
        asset_type: AssetType,
    ) -> Result<(), AssetError> {
        if !self.catalogs.insert(asset_type, catalog) {
            log::warn!("AssetDatabase: a catalog is already registered for {asset_type}");
            return Err(AssetError::CatalogAlreadyRegistered(asset_type));
        }
        log::debug!("AssetDatabase: registered catalog for {asset_type}");
        Ok(())
    }

    /// Registers `catalog` for every type in `asset_types`, or for none if one is taken.
    pub fn register_catalog_for_types(
        &self,
        catalog: Arc<dyn AssetCatalog>,
        asset_types: &[AssetType],
    ) -> Result<(), AssetError> {
        if let Err(taken) = self.catalogs.insert_all(asset_types, &catalog) {
            log::warn!("AssetDatabase: a catalog is already registered for {taken}");
            return Err(AssetError::CatalogAlreadyRegistered(taken));
        }
        log::debug!(
            "AssetDatabase: registered catalog for {} asset type(s)",
            asset_types.len()
        );
        Ok(())
    }

    /// Removes every mapping to `catalog` and returns how many there were.
    pub fn unregister_catalog(&self, catalog: &Arc<dyn AssetCatalog>) -> usize {
        self.catalogs.remove_all(catalog)
    }

    /// Returns the catalog for `asset_type`.
    pub fn catalog(&self, asset_type: &AssetType) -> Option<Arc<dyn AssetCatalog>> {
        self.catalogs.get(asset_type)
    }

    /// Returns the types `catalog` is registered for, sorted.
    pub fn handled_asset_types(&self, catalog: &Arc<dyn AssetCatalog>) -> Vec<AssetType> {
        self.catalogs.types_of(catalog)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Returns `true` if no type has a catalog.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetPayload, AssetStreamInfo, LoadContext};
    use ember_core::AssetId;
    use std::io::Read;

    struct NullHandler(Vec<AssetType>);

    impl AssetHandler for NullHandler {
        fn create_asset(&self, _id: &AssetId, _asset_type: &AssetType) -> Option<AssetPayload> {
            Some(Box::new(()))
        }

        fn load_asset_data(
            &self,
            _ctx: &LoadContext<'_>,
            _payload: &mut AssetPayload,
            _stream: &mut dyn Read,
        ) -> Result<(), AssetError> {
            Ok(())
        }

        fn handled_asset_types(&self) -> Vec<AssetType> {
            self.0.clone()
        }
    }

    struct NullCatalog;

    impl AssetCatalog for NullCatalog {
        fn stream_info_for_load(&self, _id: &AssetId, _asset_type: &AssetType) -> AssetStreamInfo {
            AssetStreamInfo::default()
        }
    }

    fn texture() -> AssetType {
        AssetType::from_name("texture")
    }

    fn mesh() -> AssetType {
        AssetType::from_name("mesh")
    }

    #[test]
    fn test_one_handler_per_type() {
        let registry = AssetHandlerRegistry::new();
        let first: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![]));
        let second: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![]));

        registry.register_handler(first.clone(), texture()).unwrap();
        let err = registry.register_handler(second, texture()).unwrap_err();
        assert!(matches!(err, AssetError::HandlerAlreadyRegistered(t) if t == texture()));

        let found = registry.handler(&texture()).unwrap();
        assert!(same_instance(&found, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_removes_every_mapping() {
        let registry = AssetHandlerRegistry::new();
        let handler: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![texture(), mesh()]));
        registry.register_handler_for_all(handler.clone()).unwrap();
        assert_eq!(registry.handled_types(&handler).len(), 2);

        assert_eq!(registry.unregister_handler(&handler), 2);
        assert!(registry.is_empty());
        assert!(registry.handler(&mesh()).is_none());

        assert_eq!(registry.unregister_handler(&handler), 0, "second unregister is a no-op");
    }

    #[test]
    fn test_unregister_leaves_other_handlers() {
        let registry = AssetHandlerRegistry::new();
        let a: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![]));
        let b: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![]));
        registry.register_handler(a.clone(), texture()).unwrap();
        registry.register_handler(b.clone(), mesh()).unwrap();

        registry.unregister_handler(&a);
        assert!(registry.handler(&texture()).is_none());
        assert!(registry.handler(&mesh()).is_some());
    }

    #[test]
    fn test_register_for_all_is_all_or_nothing() {
        let registry = AssetHandlerRegistry::new();
        let sound = AssetType::from_name("sound");
        let owner: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![]));
        registry.register_handler(owner.clone(), mesh()).unwrap();

        let late: Arc<dyn AssetHandler> = Arc::new(NullHandler(vec![texture(), mesh(), sound]));
        let err = registry.register_handler_for_all(late.clone()).unwrap_err();
        assert!(matches!(err, AssetError::HandlerAlreadyRegistered(t) if t == mesh()));

        assert!(registry.handled_types(&late).is_empty());
        assert!(registry.handler(&texture()).is_none());
        assert!(registry.handler(&sound).is_none());
        assert!(same_instance(&registry.handler(&mesh()).unwrap(), &owner));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_catalog_for_types_is_all_or_nothing() {
        let registry = CatalogRegistry::new();
        let first: Arc<dyn AssetCatalog> = Arc::new(NullCatalog);
        let second: Arc<dyn AssetCatalog> = Arc::new(NullCatalog);
        registry.register_catalog(first.clone(), mesh()).unwrap();

        let err = registry
            .register_catalog_for_types(second.clone(), &[texture(), mesh()])
            .unwrap_err();
        assert!(matches!(err, AssetError::CatalogAlreadyRegistered(t) if t == mesh()));
        assert!(registry.handled_asset_types(&second).is_empty());
        assert!(registry.catalog(&texture()).is_none());

        registry
            .register_catalog_for_types(second.clone(), &[texture()])
            .unwrap();
        assert_eq!(registry.handled_asset_types(&second), vec![texture()]);
        assert_eq!(registry.len(), 2);
    }
}
