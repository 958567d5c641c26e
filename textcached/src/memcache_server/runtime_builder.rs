extern crate core_affinity;
use crate::memcache::cli::parser::{RuntimeType, TextcachedConfig};
use crate::memcache::store::EntryStore;
use crate::memcache_server::server_context::ServerContext;
use crate::memcache_server::text_tcp::{ServerConfig, TextTcpServer};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::runtime::Builder;

const RX_TIMEOUT_SECS: u32 = 60;

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("textcached-wrk-{}", id)
}

fn create_multi_thread_runtime(worker_threads: usize) -> tokio::runtime::Runtime {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap()
}

fn create_current_thread_runtime() -> tokio::runtime::Runtime {
    Builder::new_current_thread()
        .thread_name_fn(get_worker_thread_name)
        .enable_all()
        .build()
        .unwrap()
}

fn server_config(config: &TextcachedConfig) -> ServerConfig {
    ServerConfig::new(
        RX_TIMEOUT_SECS,
        config.connection_limit,
        config.item_size_limit as u32,
        config.backlog_limit,
    )
}

fn build_entry_store(ctxt: &ServerContext) -> Arc<EntryStore> {
    Arc::new(EntryStore::new(ctxt.store(), ctxt.system_timer()))
}

/// Runs the server until the context's cancellation token fires. The
/// journal writer is drained before this returns.
pub fn start_server_with_context(config: TextcachedConfig, ctxt: ServerContext) {
    match config.runtime_type {
        RuntimeType::CurrentThread => start_current_thread_server(config, ctxt),
        RuntimeType::MultiThread => start_threadpool_server(config, ctxt),
    }
}

fn start_threadpool_server(config: TextcachedConfig, mut ctxt: ServerContext) {
    let addr = SocketAddr::new(config.listen_address, config.port);
    let memc_config = server_config(&config);
    let runtime = create_multi_thread_runtime(config.threads);
    let storage = build_entry_store(&ctxt);
    let token = ctxt.cancellation_token();

    let timer = ctxt.system_timer();
    runtime.spawn(async move { timer.run().await });

    let writer_handle = ctxt
        .take_journal_writer()
        .map(|writer| runtime.spawn(async move { writer.run().await }));

    let mut tcp_server = TextTcpServer::new(memc_config, storage, ctxt.journal());
    let server_token = token.clone();
    runtime.spawn(async move {
        if let Err(err) = tcp_server.run(addr, server_token).await {
            error!("Server error: {}", err);
        }
    });

    runtime.block_on(async move {
        token.cancelled().await;
        if let Some(handle) = writer_handle {
            let _ = handle.await;
        }
    });
}

fn start_current_thread_server(config: TextcachedConfig, mut ctxt: ServerContext) {
    let addr = SocketAddr::new(config.listen_address, config.port);
    let memc_config = server_config(&config);
    let storage = build_entry_store(&ctxt);
    let token = ctxt.cancellation_token();
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();

    let mut workers = Vec::with_capacity(config.threads);
    for i in 0..config.threads {
        let storage_rc = Arc::clone(&storage);
        let journal = ctxt.journal();
        let worker_token = token.clone();
        let core_id = if core_ids.is_empty() {
            None
        } else {
            Some(core_ids[i % core_ids.len()])
        };
        workers.push(std::thread::spawn(move || {
            debug!("Creating runtime {}", i);
            if let Some(core_id) = core_id {
                if core_affinity::set_for_current(core_id) {
                    debug!(
                        "Thread pinned {:?} to core {:?}",
                        std::thread::current().id(),
                        core_id.id
                    );
                } else {
                    warn!("Cannot pin thread to core {}", core_id.id);
                }
            }
            let child_runtime = create_current_thread_runtime();
            let mut tcp_server = TextTcpServer::new(memc_config, storage_rc, journal);
            if let Err(err) = child_runtime.block_on(tcp_server.run(addr, worker_token)) {
                error!("Server error: {}", err);
            }
        }));
    }

    let parent_runtime = create_current_thread_runtime();
    let timer = ctxt.system_timer();
    parent_runtime.spawn(async move { timer.run().await });
    let writer_handle = ctxt
        .take_journal_writer()
        .map(|writer| parent_runtime.spawn(async move { writer.run().await }));
    parent_runtime.block_on(async move {
        token.cancelled().await;
        if let Some(handle) = writer_handle {
            let _ = handle.await;
        }
    });
    for worker in workers {
        let _ = worker.join();
    }
}
