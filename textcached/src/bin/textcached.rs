use std::process;

use byte_unit::{Byte, UnitType};
use log::info;
use tracing_log::LogTracer;

use textcached::memcache::builder::MemcacheStoreConfig;
use textcached::memcache::cli::parser::{self, DEFAULT_PORT};
use textcached::memcache_server::runtime_builder::start_server_with_context;
use textcached::memcache_server::server_context::{JournalConfig, ServerContext};
use textcached::version::TEXTCACHED_VERSION;

#[cfg(all(feature = "jemallocator", not(target_env = "msvc")))]
use jemallocator::Jemalloc;

#[cfg(all(feature = "jemallocator", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() {
    let config = match parser::parse(std::env::args().collect()) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();
    if let Err(err) = LogTracer::init() {
        eprintln!("Cannot initialize log bridge: {}", err);
    }

    info!("textcached {}", TEXTCACHED_VERSION);
    if config.port == DEFAULT_PORT {
        info!("Starting on default port {}", config.port);
    } else {
        info!("Starting on custom port {}", config.port);
    }
    info!("Listen address: {}", config.listen_address);
    info!("Connection limit: {}", config.connection_limit);
    info!("Store capacity: {} entries", config.capacity);
    info!(
        "Max item size: {}",
        Byte::from_u64(config.item_size_limit).get_appropriate_unit(UnitType::Decimal)
    );
    info!("Runtime: {}", config.runtime_type.as_str());
    info!("Journal file: {}", config.journal_file.display());

    let store_config = MemcacheStoreConfig::new(config.capacity);
    let journal_config = JournalConfig {
        path: config.journal_file.clone(),
        depth: config.journal_depth,
    };
    let ctxt = ServerContext::get_default_server_context(store_config, journal_config);

    start_server_with_context(config, ctxt);
}
