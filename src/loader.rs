//! Cached loaders in front of the backing store.
//!
//! Each loader owns one [`TtlCache`] and shares the store. On a cache miss
//! the store is read and the result (including "not found" for item data)
//! is cached according to the loader's policy.

use crate::cache::{CacheReport, Clock, TtlCache};
use crate::config::Config;
use crate::i18n::LanguageTag;
use crate::item_id::{validate_item_id, ItemId};
use crate::store::{DataRecord, DescriptionSet, ItemStore, StoreError, UnitMap};
use std::sync::Arc;

pub struct DataLoader {
    store: Arc<dyn ItemStore>,
    cache: TtlCache<ItemId, DataRecord>,
}

impl DataLoader {
    pub fn new(store: Arc<dyn ItemStore>, cache: TtlCache<ItemId, DataRecord>) -> Self {
        Self { store, cache }
    }

    /// Load one item's data. `Ok(None)` means no such item.
    pub fn load(&self, id: &ItemId) -> Result<Option<Arc<DataRecord>>, StoreError> {
        // Re-checked here so no caller can reach the store with a bad key.
        if !validate_item_id(id.as_str()) {
            return Err(StoreError::RejectedKey(id.as_str().to_string()));
        }
        self.cache.get_or_load(id, |id| self.store.fetch_data(id))
    }

    pub fn report(&self) -> CacheReport {
        self.cache.report()
    }
}

pub struct DescriptionLoader {
    store: Arc<dyn ItemStore>,
    cache: TtlCache<LanguageTag, DescriptionSet>,
}

impl DescriptionLoader {
    pub fn new(store: Arc<dyn ItemStore>, cache: TtlCache<LanguageTag, DescriptionSet>) -> Self {
        Self { store, cache }
    }

    /// Load the description set for `lang`. `Ok(None)` means none exists.
    pub fn load(&self, lang: &LanguageTag) -> Result<Option<Arc<DescriptionSet>>, StoreError> {
        self.cache
            .get_or_load(lang, |lang| self.store.fetch_descriptions(lang))
    }

    pub fn report(&self) -> CacheReport {
        self.cache.report()
    }
}

pub struct UnitLoader {
    store: Arc<dyn ItemStore>,
    cache: TtlCache<(), UnitMap>,
}

impl UnitLoader {
    pub fn new(store: Arc<dyn ItemStore>, cache: TtlCache<(), UnitMap>) -> Self {
        Self { store, cache }
    }

    /// Load the global unit map. `Ok(None)` means it is missing.
    pub fn load(&self) -> Result<Option<Arc<UnitMap>>, StoreError> {
        self.cache.get_or_load(&(), |_| self.store.fetch_units())
    }

    pub fn report(&self) -> CacheReport {
        self.cache.report()
    }
}

/// The three loaders of one warm process, sharing a store and a clock.
pub struct Loaders {
    pub data: DataLoader,
    pub descriptions: DescriptionLoader,
    pub units: UnitLoader,
}

impl Loaders {
    pub fn new(config: &Config, store: Arc<dyn ItemStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DataLoader::new(
                store.clone(),
                TtlCache::new("data", config.data_cache_policy(), clock.clone()),
            ),
            descriptions: DescriptionLoader::new(
                store.clone(),
                TtlCache::new("descriptions", config.desc_cache_policy(), clock.clone()),
            ),
            units: UnitLoader::new(
                store,
                TtlCache::new("units", config.units_cache_policy(), clock),
            ),
        }
    }

    pub fn reports(&self) -> Vec<CacheReport> {
        vec![
            self.data.report(),
            self.descriptions.report(),
            self.units.report(),
        ]
    }
}
