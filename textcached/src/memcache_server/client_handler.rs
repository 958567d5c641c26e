use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use futures_util::{SinkExt, StreamExt};
use tokio::io;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, error};

use super::handler;
use super::journal::CommandJournal;
use crate::memcache::store::EntryStore;
use crate::protocol::text_codec::{CommandResult, MemcacheTextCodec};

pub struct ClientConfig {
    pub(crate) item_size_limit: u32,
    pub(crate) rx_timeout_secs: u32,
}

pub struct Client {
    stream: Framed<TcpStream, MemcacheTextCodec>,
    addr: SocketAddr,
    config: ClientConfig,
    handler: handler::TextHandler,
    /// Max connection semaphore.
    ///
    /// When the handler is dropped, a permit is returned to this semaphore. If
    /// the listener is waiting for connections to close, it will be notified of
    /// the newly available permit and resume accepting connections.
    limit_connections: Arc<Semaphore>,
}

impl Client {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<EntryStore>,
        journal: CommandJournal,
        socket: TcpStream,
        addr: SocketAddr,
        connection: u64,
        config: ClientConfig,
        limit_connections: Arc<Semaphore>,
    ) -> Self {
        let codec = MemcacheTextCodec::new(config.item_size_limit as usize);
        Client {
            stream: Framed::new(socket, codec),
            addr,
            config,
            handler: handler::TextHandler::new(store, journal, addr, connection),
            limit_connections,
        }
    }

    pub async fn handle(&mut self) {
        debug!("New client connected: {}", self.addr);

        // For every frame the codec hands back we run the command against
        // the shared store and write the reply, if the command produced one.
        loop {
            match timeout(
                Duration::from_secs(self.config.rx_timeout_secs as u64),
                self.stream.next(),
            )
            .await
            {
                Ok(req_or_none) => {
                    let client_close = self.handle_frame(req_or_none).await;
                    if client_close {
                        return;
                    }
                }
                Err(err) => {
                    debug!(
                        "Timeout {}s elapsed, disconnecting client: {}, error: {}",
                        self.config.rx_timeout_secs, self.addr, err
                    );
                    return;
                }
            }
        }
    }

    async fn handle_frame(&mut self, req: Option<Result<CommandResult, io::Error>>) -> bool {
        match req {
            Some(Ok(command)) => self.handle_request(command).await,
            Some(Err(err)) => {
                error!("Error when reading frame; error = {:?}", err);
                true
            }
            None => {
                // The connection is closed once the stream yields `None`.
                debug!("Connection closed: {}", self.addr);
                true
            }
        }
    }

    /// Handles a single text protocol request.
    /// Returns true if we should leave the client receive loop.
    async fn handle_request(&mut self, command: CommandResult) -> bool {
        debug!("Got request {:?}", command);

        match self.handler.handle_command(command) {
            Some(response) => {
                debug!("Sending response {:?}", response);
                if let Err(e) = self.stream.send(response).await {
                    error!("error on sending response; error = {:?}", e);
                    return true;
                }
                false
            }
            None => false,
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Add a permit back to the semaphore.
        //
        // Doing so unblocks the listener if the max number of
        // connections has been reached.
        //
        // This is done in a `Drop` implementation in order to guarantee that
        // the permit is added even if the task handling the connection panics.
        // If `add_permit` was called at the end of the `run` function and some
        // bug causes a panic. The permit would never be returned to the
        // semaphore.
        self.limit_connections.add_permits(1);
    }
}
