use crate::version;
use byte_unit::Byte;
use clap::{command, value_parser, Arg, ArgAction};
use std::net::IpAddr;
use std::path::PathBuf;

pub enum RuntimeType {
    CurrentThread,
    MultiThread,
}

impl RuntimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeType::CurrentThread => "Work handled within current thread runtime",
            RuntimeType::MultiThread => "Work stealing threadpool runtime",
        }
    }
}

pub struct TextcachedConfig {
    pub port: u16,
    pub connection_limit: u32,
    pub backlog_limit: u32,
    pub capacity: usize,
    pub item_size_limit: u64,
    pub threads: usize,
    pub log_level: tracing::Level,
    pub listen_address: IpAddr,
    pub runtime_type: RuntimeType,
    pub journal_file: PathBuf,
    pub journal_depth: usize,
}

pub const DEFAULT_PORT: u16 = 11211;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const CONNECTION_LIMIT: u32 = 1024;
const LISTEN_BACKLOG: u32 = 1024;
const DEFAULT_CAPACITY: usize = 1000;
const MAX_ITEM_SIZE: &str = "1m";
const ITEM_SIZE_LIMIT_MAX: u64 = 1024 * 1024 * 1024;
const JOURNAL_FILE: &str = "./logs/server.log";
const JOURNAL_DEPTH: usize = 1024;
const RUNTIME_TYPE: &str = "current-thread";

impl TextcachedConfig {
    fn from_args(args: Vec<String>) -> Result<TextcachedConfig, String> {
        let threads_default = num_cpus::get_physical();
        let matches = cli_args(threads_default).get_matches_from(args);

        let port: u16 = *matches.get_one::<u16>("port").unwrap_or(&DEFAULT_PORT);

        let connection_limit: u32 = *matches
            .get_one::<u32>("connection-limit")
            .unwrap_or(&CONNECTION_LIMIT);

        let backlog_limit: u32 = *matches
            .get_one::<u32>("listen-backlog")
            .unwrap_or(&LISTEN_BACKLOG);

        let capacity: usize = *matches
            .get_one::<usize>("capacity")
            .unwrap_or(&DEFAULT_CAPACITY);

        let item_size_limit_str: String = matches
            .get_one::<String>("max-item-size")
            .unwrap_or(&String::from(MAX_ITEM_SIZE))
            .clone();

        let item_size_limit = match Byte::parse_str(&item_size_limit_str, true) {
            Ok(bytes) => bytes.as_u64(),
            Err(err) => return Err(format!("Invalid max item size: {}", err)),
        };

        if item_size_limit > ITEM_SIZE_LIMIT_MAX {
            return Err(format!(
                "Max item size cannot be greater than: {} bytes",
                ITEM_SIZE_LIMIT_MAX
            ));
        }

        let threads: usize = *matches
            .get_one::<usize>("threads")
            .unwrap_or(&threads_default);

        let listen_address = match matches
            .get_one::<String>("listen")
            .unwrap_or(&String::from(DEFAULT_ADDRESS))
            .parse::<IpAddr>()
        {
            Ok(ip_addr) => ip_addr,
            Err(err) => return Err(format!("Invalid ip address: {}", err)),
        };

        let runtime_type = match matches
            .get_one::<String>("runtime-type")
            .unwrap_or(&String::from(RUNTIME_TYPE))
            .as_str()
        {
            "current-thread" => RuntimeType::CurrentThread,
            "multi-thread" => RuntimeType::MultiThread,
            _ => unreachable!(),
        };

        let journal_file = PathBuf::from(
            matches
                .get_one::<String>("journal-file")
                .unwrap_or(&String::from(JOURNAL_FILE)),
        );

        let journal_depth: usize = *matches
            .get_one::<usize>("journal-depth")
            .unwrap_or(&JOURNAL_DEPTH);

        // Vary the output based on how many times the user used the "verbose" flag
        // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
        let log_level = match matches.get_count("v") {
            0 => tracing::Level::ERROR,
            1 => tracing::Level::WARN,
            2 => tracing::Level::INFO,
            3 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        Ok(TextcachedConfig {
            port,
            connection_limit,
            backlog_limit,
            capacity,
            item_size_limit,
            threads,
            log_level,
            listen_address,
            runtime_type,
            journal_file,
            journal_depth,
        })
    }
}

fn cli_args(threads: usize) -> clap::Command {
    command!()
        .version(version::TEXTCACHED_VERSION)
        .about("textcached - memcached text protocol cache server")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .default_value("11211")
                .value_parser(value_parser!(u16))
                .help("TCP port to listen on"),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .default_value(DEFAULT_ADDRESS)
                .help("interface to listen on"),
        )
        .arg(
            Arg::new("connection-limit")
                .short('c')
                .long("connection-limit")
                .value_parser(value_parser!(u32))
                .default_value("1024")
                .help("max simultaneous connections"),
        )
        .arg(
            Arg::new("listen-backlog")
                .short('b')
                .long("listen-backlog")
                .value_parser(value_parser!(u32))
                .default_value("1024")
                .help("set the backlog queue limit"),
        )
        .arg(
            Arg::new("capacity")
                .short('e')
                .long("capacity")
                .value_parser(value_parser!(usize))
                .default_value("1000")
                .help("max number of entries held before the clear-all policy trips"),
        )
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::new("max-item-size")
                .short('I')
                .long("max-item-size")
                .default_value(MAX_ITEM_SIZE)
                .help("adjusts max item size (min: 1k, max: 1024m)"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(usize))
                .default_value(threads.to_string())
                .help("number of threads to use"),
        )
        .arg(
            Arg::new("runtime-type")
                .short('r')
                .long("runtime-type")
                .default_value(RUNTIME_TYPE)
                .value_parser(["current-thread", "multi-thread"])
                .help("runtime type to use"),
        )
        .arg(
            Arg::new("journal-file")
                .long("journal-file")
                .default_value(JOURNAL_FILE)
                .help("append-only file receiving one line per executed command"),
        )
        .arg(
            Arg::new("journal-depth")
                .long("journal-depth")
                .value_parser(value_parser!(usize))
                .default_value("1024")
                .help("bounded journal queue depth, events beyond it are dropped"),
        )
}

pub fn parse(args: Vec<String>) -> Result<TextcachedConfig, String> {
    TextcachedConfig::from_args(args)
}
