/// Version reported in the startup banner.
pub const TEXTCACHED_VERSION: &str = env!("CARGO_PKG_VERSION");
