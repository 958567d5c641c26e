use socket2::{Domain, SockAddr, Socket, Type};
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use tracing::{debug, error};

use super::client_handler;
use super::journal::CommandJournal;
use crate::memcache::store::EntryStore;

/// Connection ids as logged to the journal; process-wide so every accepted
/// socket gets a distinct `conn<N>` tag.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy)]
pub struct ServerConfig {
    timeout_secs: u32,
    connection_limit: u32,
    item_size_limit: u32,
    listen_backlog: u32,
}

impl ServerConfig {
    pub fn new(
        timeout_secs: u32,
        connection_limit: u32,
        item_size_limit: u32,
        listen_backlog: u32,
    ) -> Self {
        ServerConfig {
            timeout_secs,
            connection_limit,
            item_size_limit,
            listen_backlog,
        }
    }
}

pub struct TextTcpServer {
    storage: Arc<EntryStore>,
    journal: CommandJournal,
    limit_connections: Arc<Semaphore>,
    config: ServerConfig,
}

impl TextTcpServer {
    pub fn new(
        config: ServerConfig,
        storage: Arc<EntryStore>,
        journal: CommandJournal,
    ) -> TextTcpServer {
        TextTcpServer {
            storage,
            journal,
            limit_connections: Arc::new(Semaphore::new(config.connection_limit as usize)),
            config,
        }
    }

    pub async fn run<A: ToSocketAddrs>(
        &mut self,
        addr: A,
        cancellation_token: CancellationToken,
    ) -> io::Result<()> {
        let listener = self.get_tcp_listener(addr)?;
        loop {
            tokio::select! {
                connection = listener.accept() => {
                    match connection {
                        Ok((socket, addr)) => {
                            let peer_addr = addr;
                            socket.set_nodelay(true)?;
                            socket.set_linger(None)?;
                            let connection_id =
                                NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst);
                            let mut client = client_handler::Client::new(
                                Arc::clone(&self.storage),
                                self.journal.clone(),
                                socket,
                                peer_addr,
                                connection_id,
                                self.get_client_config(),
                                Arc::clone(&self.limit_connections)
                            );

                            self.limit_connections.acquire().await.unwrap().forget();
                            // Like with other small servers, we'll `spawn` this client to ensure it
                            // runs concurrently with all other clients. The `move` keyword is used
                            // here to move ownership of our store handle into the async closure.
                            tokio::spawn(async move { client.handle().await });
                        },
                        Err(err) => {
                            error!("Accept error: {}", err);
                        }
                    }
                }
                _ = cancellation_token.cancelled() => {
                    debug!("Accept loop stopped");
                    return Ok(());
                }
            }
        }
    }

    fn get_tcp_listener<A: ToSocketAddrs>(
        &mut self,
        addr: A,
    ) -> Result<TcpListener, std::io::Error> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        let addrs_iter = addr.to_socket_addrs()?;
        for socket_addr in addrs_iter {
            debug!("Binding to addr: {:?}", socket_addr);
            let sock_addr = SockAddr::from(socket_addr);
            let res = socket.bind(&sock_addr);
            if let Err(err) = res {
                error!("Can't bind to: {:?}, err {:?}", sock_addr, err);
                return Err(err);
            }
        }

        if let Err(err) = socket.listen(self.config.listen_backlog as i32) {
            error!("Listen error: {:?}", err);
            return Err(err);
        }

        let std_listener: std::net::TcpListener = socket.into();
        TcpListener::from_std(std_listener)
    }

    fn get_client_config(&self) -> client_handler::ClientConfig {
        client_handler::ClientConfig {
            item_size_limit: self.config.item_size_limit,
            rx_timeout_secs: self.config.timeout_secs,
        }
    }
}
