use crate::cache::cache::Cache;
use crate::memcache::store::EntryStore;
use crate::memcache_server::handler::TextHandler;
use crate::memcache_server::journal::{CommandEvent, CommandJournal};
use crate::memory_store::hash_map_store::HashMapMemoryStore;
use crate::server::timer;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TEST_CAPACITY: usize = 1000;
pub const TEST_JOURNAL_DEPTH: usize = 64;

pub struct MockSystemTimer {
    pub current_time: AtomicU32,
}

pub trait SetableTimer: timer::Timer {
    fn set(&self, time: u32);
    fn add_seconds(&self, seconds: u32);
}

impl MockSystemTimer {
    pub fn new() -> Self {
        MockSystemTimer {
            current_time: AtomicU32::new(0),
        }
    }
}

impl Default for MockSystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl timer::Timer for MockSystemTimer {
    fn timestamp(&self) -> u32 {
        self.current_time.load(Ordering::Relaxed)
    }
}

impl SetableTimer for MockSystemTimer {
    fn set(&self, time: u32) {
        self.current_time.store(time, Ordering::Relaxed)
    }

    fn add_seconds(&self, seconds: u32) {
        self.current_time.fetch_add(seconds, Ordering::Release);
    }
}

pub struct StoreWithMockTimer {
    pub timer: Arc<MockSystemTimer>,
    pub store: EntryStore,
}

pub fn create_storage() -> StoreWithMockTimer {
    create_storage_with_capacity(TEST_CAPACITY)
}

pub fn create_storage_with_capacity(capacity: usize) -> StoreWithMockTimer {
    let timer = Arc::new(MockSystemTimer::new());
    let cache: Arc<dyn Cache + Send + Sync> =
        Arc::new(HashMapMemoryStore::new(timer.clone(), capacity));
    StoreWithMockTimer {
        timer: timer.clone(),
        store: EntryStore::new(cache, timer),
    }
}

pub struct HandlerWithMocks {
    pub handler: TextHandler,
    pub timer: Arc<MockSystemTimer>,
    pub journal_receiver: mpsc::Receiver<CommandEvent>,
}

pub fn test_peer() -> SocketAddr {
    "127.0.0.1:11311".parse().unwrap()
}

pub fn create_text_handler() -> HandlerWithMocks {
    create_text_handler_with_capacity(TEST_CAPACITY)
}

pub fn create_text_handler_with_capacity(capacity: usize) -> HandlerWithMocks {
    let timer = Arc::new(MockSystemTimer::new());
    let cache: Arc<dyn Cache + Send + Sync> =
        Arc::new(HashMapMemoryStore::new(timer.clone(), capacity));
    let storage = Arc::new(EntryStore::new(cache, timer.clone()));
    let (journal, journal_receiver) = CommandJournal::channel(TEST_JOURNAL_DEPTH);
    HandlerWithMocks {
        handler: TextHandler::new(storage, journal, test_peer(), 1),
        timer,
        journal_receiver,
    }
}
