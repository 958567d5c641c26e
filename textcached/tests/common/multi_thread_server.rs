use std::process;

use textcached::memcache::{self, builder::MemcacheStoreConfig};
use textcached::memcache_server::runtime_builder::start_server_with_context;
use textcached::memcache_server::server_context::{JournalConfig, ServerContext};
use tokio_util::sync::CancellationToken;

use crate::common::random_port::RANDOM_PORT;
use crate::common::TextcachedServerParamsBuilder;

pub struct TextcachedTestServer {
    thread_join_handle: Option<std::thread::JoinHandle<()>>,
    cancellation_token: CancellationToken,
    port: u16,
}

impl TextcachedTestServer {
    fn new(
        thread_join_handle: std::thread::JoinHandle<()>,
        cancellation_token: CancellationToken,
        port: u16,
    ) -> TextcachedTestServer {
        TextcachedTestServer {
            thread_join_handle: Some(thread_join_handle),
            cancellation_token,
            port,
        }
    }

    fn kill(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            thread_join_handle.join().unwrap();
        }
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Drop for TextcachedTestServer {
    fn drop(&mut self) {
        self.kill();
    }
}

fn spawn_server_args(args: Vec<String>) -> TextcachedTestServer {
    let config = match memcache::cli::parser::parse(args) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };
    let store_config = MemcacheStoreConfig::new(config.capacity);
    let journal_config = JournalConfig {
        path: config.journal_file.clone(),
        depth: config.journal_depth,
    };
    let ctxt = ServerContext::get_default_server_context(store_config, journal_config);
    let cancellation_token = ctxt.cancellation_token();
    let port = config.port;
    let handle = std::thread::spawn(move || start_server_with_context(config, ctxt));
    TextcachedTestServer::new(handle, cancellation_token, port)
}

pub fn spawn_server(mut params: TextcachedServerParamsBuilder) -> TextcachedTestServer {
    let port = RANDOM_PORT.lock().unwrap().get_next_port();
    params.with_port(port);
    spawn_server_args(params.build())
}
