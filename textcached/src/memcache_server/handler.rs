use crate::cache::error::CacheError;
use crate::memcache::store::EntryStore;
use crate::memcache_server::journal::CommandJournal;
use crate::protocol::text::{
    CapacityRequest, DeleteRequest, GetRequest, StoreRequest, TextCommand, TextResponse,
    ValueResponse,
};
use crate::protocol::text_codec::CommandResult;
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;

/// Executes parsed commands against the entry store and renders replies.
/// One handler per connection; the store and journal are shared.
pub struct TextHandler {
    storage: Arc<EntryStore>,
    journal: CommandJournal,
    peer: SocketAddr,
    connection: u64,
}

impl TextHandler {
    pub fn new(
        storage: Arc<EntryStore>,
        journal: CommandJournal,
        peer: SocketAddr,
        connection: u64,
    ) -> TextHandler {
        TextHandler {
            storage,
            journal,
            peer,
            connection,
        }
    }

    /// Handles a single logical request. `None` means no reply bytes go
    /// back: a successful mutation with `noreply` set. Failure outcomes
    /// are always reported, `noreply` or not.
    pub fn handle_command(&self, command: CommandResult) -> Option<TextResponse> {
        let command = match command {
            Ok(command) => command,
            Err(err) => return Some(TextResponse::error(err.to_string())),
        };
        match command {
            TextCommand::Set(request) => self.set(request),
            TextCommand::Add(request) => self.add(request),
            TextCommand::Replace(request) => self.replace(request),
            TextCommand::Append(request) => self.append(request),
            TextCommand::Prepend(request) => self.prepend(request),
            TextCommand::Get(request) => self.get(request),
            TextCommand::Delete(request) => self.delete(request),
            TextCommand::Increment(request) => self.increment(request),
            TextCommand::Decrement(request) => self.decrement(request),
        }
    }

    fn set(&self, request: StoreRequest) -> Option<TextResponse> {
        let result = self.storage.set(
            request.key.clone(),
            request.payload.clone(),
            request.flags,
            request.exptime,
            request.byte_count,
        );
        self.store_outcome(request, result)
    }

    fn add(&self, request: StoreRequest) -> Option<TextResponse> {
        let result = self.storage.add(
            request.key.clone(),
            request.payload.clone(),
            request.flags,
            request.exptime,
            request.byte_count,
        );
        self.store_outcome(request, result)
    }

    fn replace(&self, request: StoreRequest) -> Option<TextResponse> {
        let result = self.storage.replace(
            request.key.clone(),
            request.payload.clone(),
            request.flags,
            request.exptime,
            request.byte_count,
        );
        self.store_outcome(request, result)
    }

    fn append(&self, request: StoreRequest) -> Option<TextResponse> {
        let result = self
            .storage
            .append(request.key.clone(), request.payload.clone());
        self.store_outcome(request, result)
    }

    fn prepend(&self, request: StoreRequest) -> Option<TextResponse> {
        let result = self
            .storage
            .prepend(request.key.clone(), request.payload.clone());
        self.store_outcome(request, result)
    }

    fn store_outcome(
        &self,
        request: StoreRequest,
        result: Result<(), CacheError>,
    ) -> Option<TextResponse> {
        match result {
            Ok(()) => {
                self.publish(render_store(&request, "STORED"));
                if request.noreply {
                    None
                } else {
                    Some(TextResponse::Stored)
                }
            }
            Err(err @ CacheError::CapacityExceeded) => {
                Some(TextResponse::error(err.to_static_string()))
            }
            Err(_) => Some(TextResponse::NotStored),
        }
    }

    fn get(&self, request: GetRequest) -> Option<TextResponse> {
        match self.storage.get(&request.key) {
            Ok(record) => Some(TextResponse::Value(ValueResponse {
                key: request.key,
                flags: record.header().flags(),
                byte_count: record.header().byte_count(),
                payload: record.value().clone(),
            })),
            Err(_) => Some(TextResponse::End),
        }
    }

    fn delete(&self, request: DeleteRequest) -> Option<TextResponse> {
        match self.storage.delete(&request.key) {
            Ok(_record) => {
                self.publish(format!("delete {} -> DELETED", lossy(&request.key)));
                Some(TextResponse::Deleted)
            }
            Err(_) => Some(TextResponse::End),
        }
    }

    fn increment(&self, request: CapacityRequest) -> Option<TextResponse> {
        let capacity = self.storage.increment_capacity(request.delta);
        self.publish(format!(
            "increment {} -> INCREMENT (capacity now {})",
            request.delta, capacity
        ));
        Some(TextResponse::Incremented)
    }

    fn decrement(&self, request: CapacityRequest) -> Option<TextResponse> {
        let capacity = self.storage.decrement_capacity(request.delta);
        self.publish(format!(
            "decrement {} -> DECREMENT (capacity now {})",
            request.delta, capacity
        ));
        Some(TextResponse::Decremented)
    }

    fn publish(&self, text: String) {
        self.journal.publish(self.connection, self.peer, text);
    }
}

fn render_store(request: &StoreRequest, outcome: &str) -> String {
    format!(
        "{} {} {} {} {} {} -> {}",
        request.verb.as_str(),
        lossy(&request.key),
        request.flags,
        request.exptime,
        request.byte_count,
        lossy(&request.payload),
        outcome
    )
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod handler_tests;
