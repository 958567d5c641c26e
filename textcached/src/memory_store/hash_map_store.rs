use crate::cache::cache::{Cache, KeyType, Record, ValueType};
use crate::cache::error::{CacheError, Result};
use crate::server::timer;

use bytes::BytesMut;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

struct StoreInner {
    entries: HashMap<KeyType, Record>,
    capacity: usize,
}

/// Coarse-locked map backend: one mutex guards the mapping and the
/// capacity ceiling, taken once per operation and never held across an
/// await point. Readers can never observe a partially applied write.
pub struct HashMapMemoryStore {
    inner: Mutex<StoreInner>,
    timer: Arc<dyn timer::Timer + Send + Sync>,
}

impl HashMapMemoryStore {
    pub fn new(
        timer: Arc<dyn timer::Timer + Send + Sync>,
        capacity: usize,
    ) -> HashMapMemoryStore {
        HashMapMemoryStore {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                capacity,
            }),
            timer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // a poisoning panic cannot leave the map structurally broken,
        // every mutation completes before the guard drops
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Clear-all capacity policy: inserting a new key into a store already
    /// at its ceiling wipes the whole mapping and refuses that insertion.
    /// Overwriting an existing key never trips it.
    fn check_capacity(inner: &mut StoreInner, key: &KeyType) -> Result<()> {
        if !inner.entries.contains_key(key) && inner.entries.len() >= inner.capacity {
            inner.entries.clear();
            return Err(CacheError::CapacityExceeded);
        }
        Ok(())
    }

    /// Evicts the entry when it sits past its expiration. Returns true if
    /// the slot is now vacant.
    fn evict_if_expired(now: u32, inner: &mut StoreInner, key: &KeyType) -> bool {
        match inner.entries.get(key) {
            Some(record) if record.header.expire_at.is_past(now) => {
                inner.entries.remove(key);
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    fn splice_common(&self, key: KeyType, patch: ValueType, is_append: bool) -> Result<()> {
        let now = self.timer.timestamp();
        let mut inner = self.lock();
        if Self::evict_if_expired(now, &mut inner, &key) {
            return Err(CacheError::NotFound);
        }
        let record = inner
            .entries
            .get_mut(&key)
            .ok_or(CacheError::NotFound)?;
        let mut value = BytesMut::with_capacity(record.value.len() + patch.len());
        if is_append {
            value.extend_from_slice(&record.value);
            value.extend_from_slice(&patch);
        } else {
            value.extend_from_slice(&patch);
            value.extend_from_slice(&record.value);
        }
        record.value = value.freeze();
        Ok(())
    }
}

impl Cache for HashMapMemoryStore {
    fn get(&self, key: &KeyType) -> Result<Record> {
        let now = self.timer.timestamp();
        let mut inner = self.lock();
        if Self::evict_if_expired(now, &mut inner, key) {
            return Err(CacheError::NotFound);
        }
        inner
            .entries
            .get(key)
            .cloned()
            .ok_or(CacheError::NotFound)
    }

    fn set(&self, key: KeyType, record: Record) -> Result<()> {
        let mut inner = self.lock();
        Self::check_capacity(&mut inner, &key)?;
        inner.entries.insert(key, record);
        Ok(())
    }

    fn add(&self, key: KeyType, record: Record) -> Result<()> {
        let now = self.timer.timestamp();
        let mut inner = self.lock();
        if !Self::evict_if_expired(now, &mut inner, &key) {
            return Err(CacheError::KeyExists);
        }
        Self::check_capacity(&mut inner, &key)?;
        inner.entries.insert(key, record);
        Ok(())
    }

    fn replace(&self, key: KeyType, record: Record) -> Result<()> {
        let now = self.timer.timestamp();
        let mut inner = self.lock();
        if Self::evict_if_expired(now, &mut inner, &key) {
            return Err(CacheError::NotFound);
        }
        inner.entries.insert(key, record);
        Ok(())
    }

    fn append(&self, key: KeyType, tail: ValueType) -> Result<()> {
        self.splice_common(key, tail, true)
    }

    fn prepend(&self, key: KeyType, head: ValueType) -> Result<()> {
        self.splice_common(key, head, false)
    }

    fn delete(&self, key: &KeyType) -> Result<Record> {
        let now = self.timer.timestamp();
        let mut inner = self.lock();
        if Self::evict_if_expired(now, &mut inner, key) {
            return Err(CacheError::NotFound);
        }
        inner.entries.remove(key).ok_or(CacheError::NotFound)
    }

    fn adjust_capacity(&self, delta: i64) -> usize {
        let mut inner = self.lock();
        inner.capacity = if delta >= 0 {
            inner.capacity.saturating_add(delta as usize)
        } else {
            inner.capacity.saturating_sub(delta.unsigned_abs() as usize)
        };
        inner.capacity
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}
