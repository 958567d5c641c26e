use crate::cache::cache::{
    Cache, Expiry, KeyType as CacheKeyType, Record as CacheRecord, ValueType as CacheValueType,
};
use crate::cache::error::Result;
use crate::server::timer::Timer;
use std::sync::Arc;

pub type Record = CacheRecord;
pub type KeyType = CacheKeyType;
pub type ValueType = CacheValueType;

/**
 * Implements the text protocol verbs based
 * on a key value store
 */
pub struct EntryStore {
    store: Arc<dyn Cache + Send + Sync>,
    timer: Arc<dyn Timer + Send + Sync>,
}

impl EntryStore {
    pub fn new(
        store: Arc<dyn Cache + Send + Sync>,
        timer: Arc<dyn Timer + Send + Sync>,
    ) -> EntryStore {
        EntryStore { store, timer }
    }

    fn make_record(
        &self,
        payload: ValueType,
        flags: u32,
        exptime: i64,
        byte_count: u32,
    ) -> Record {
        let expire_at = Expiry::resolve(exptime, self.timer.timestamp());
        Record::new(payload, flags, byte_count, expire_at)
    }

    pub fn set(
        &self,
        key: KeyType,
        payload: ValueType,
        flags: u32,
        exptime: i64,
        byte_count: u32,
    ) -> Result<()> {
        self.store
            .set(key, self.make_record(payload, flags, exptime, byte_count))
    }

    pub fn add(
        &self,
        key: KeyType,
        payload: ValueType,
        flags: u32,
        exptime: i64,
        byte_count: u32,
    ) -> Result<()> {
        self.store
            .add(key, self.make_record(payload, flags, exptime, byte_count))
    }

    pub fn replace(
        &self,
        key: KeyType,
        payload: ValueType,
        flags: u32,
        exptime: i64,
        byte_count: u32,
    ) -> Result<()> {
        self.store
            .replace(key, self.make_record(payload, flags, exptime, byte_count))
    }

    pub fn append(&self, key: KeyType, payload: ValueType) -> Result<()> {
        self.store.append(key, payload)
    }

    pub fn prepend(&self, key: KeyType, payload: ValueType) -> Result<()> {
        self.store.prepend(key, payload)
    }

    pub fn get(&self, key: &KeyType) -> Result<Record> {
        self.store.get(key)
    }

    pub fn delete(&self, key: &KeyType) -> Result<Record> {
        self.store.delete(key)
    }

    /// Raises the capacity ceiling by delta entries; returns the new one.
    pub fn increment_capacity(&self, delta: u64) -> usize {
        self.store
            .adjust_capacity(i64::try_from(delta).unwrap_or(i64::MAX))
    }

    /// Lowers the capacity ceiling by delta entries, saturating at zero.
    pub fn decrement_capacity(&self, delta: u64) -> usize {
        let delta = i64::try_from(delta).unwrap_or(i64::MAX);
        self.store.adjust_capacity(-delta)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}


#[cfg(test)]
mod delete_tests;
