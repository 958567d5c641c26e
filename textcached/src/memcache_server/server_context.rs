use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cache::cache::Cache;
use crate::memcache;
use crate::memcache_server::journal::{CommandEvent, CommandJournal, JournalWriter};
use crate::server::timer;

pub struct JournalConfig {
    pub path: PathBuf,
    pub depth: usize,
}

/// Everything the runtimes share: the clock, the store, the notification
/// port halves and the shutdown token.
pub struct ServerContext {
    cancellation_token: CancellationToken,
    system_timer: Arc<timer::SystemTimer>,
    store: Arc<dyn Cache + Send + Sync>,
    journal: CommandJournal,
    journal_receiver: Option<mpsc::Receiver<CommandEvent>>,
    journal_path: PathBuf,
}

impl ServerContext {
    pub fn get_default_server_context(
        store_config: memcache::builder::MemcacheStoreConfig,
        journal_config: JournalConfig,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let system_timer = Arc::new(timer::SystemTimer::new(cancellation_token.clone()));
        let store = memcache::builder::MemcacheStoreBuilder::from_config(
            store_config,
            system_timer.clone(),
        );
        let (journal, journal_receiver) = CommandJournal::channel(journal_config.depth);
        Self {
            cancellation_token,
            system_timer,
            store,
            journal,
            journal_receiver: Some(journal_receiver),
            journal_path: journal_config.path,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn system_timer(&self) -> Arc<timer::SystemTimer> {
        self.system_timer.clone()
    }

    pub fn store(&self) -> Arc<dyn Cache + Send + Sync> {
        self.store.clone()
    }

    pub fn journal(&self) -> CommandJournal {
        self.journal.clone()
    }

    /// The queue has exactly one consumer; the writer can be taken once.
    pub fn take_journal_writer(&mut self) -> Option<JournalWriter> {
        self.journal_receiver.take().map(|receiver| {
            JournalWriter::new(
                receiver,
                self.journal_path.clone(),
                self.cancellation_token.clone(),
            )
        })
    }
}
