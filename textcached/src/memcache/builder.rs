use crate::cache::cache::Cache;
use crate::memory_store::hash_map_store::HashMapMemoryStore;
use crate::server::timer;
use std::sync::Arc;

pub struct MemcacheStoreConfig {
    capacity: usize,
}

impl MemcacheStoreConfig {
    pub fn new(capacity: usize) -> MemcacheStoreConfig {
        MemcacheStoreConfig { capacity }
    }
}

pub struct MemcacheStoreBuilder {}

impl MemcacheStoreBuilder {
    pub fn from_config(
        config: MemcacheStoreConfig,
        timer: Arc<dyn timer::Timer + Send + Sync>,
    ) -> Arc<dyn Cache + Send + Sync> {
        Arc::new(HashMapMemoryStore::new(timer, config.capacity))
    }
}
