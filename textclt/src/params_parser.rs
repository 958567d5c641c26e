use byte_unit::Byte;
use clap::Parser;
use std::{net::IpAddr, ops::RangeInclusive};

const DEFAULT_PORT: u16 = 11211;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const VALUE_SIZE: &str = "1KiB";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// capability checks for a textcached server
pub struct TextClientConfig {
    #[arg(short, long, value_name = "PORT", value_parser = port_in_range, default_value_t = DEFAULT_PORT)]
    /// TCP port the server listens on
    pub port: u16,

    #[arg(short = 'z', long, value_name = "VALUE-SIZE", value_parser = parse_size, default_value = VALUE_SIZE)]
    /// payload size used by the large value check
    pub value_size: u64,

    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 2)]
    /// sets the level of verbosity
    pub verbose: u8,

    #[arg(short, long, value_name = "address", default_value_t = String::from(DEFAULT_ADDRESS).parse::<IpAddr>().unwrap())]
    /// server address to connect to
    pub server_address: IpAddr,
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

fn parse_size(s: &str) -> Result<u64, String> {
    match Byte::parse_str(s, true) {
        Ok(bytes) => Ok(bytes.as_u64()),
        Err(byte_error) => Err(format!("{}", byte_error)),
    }
}

impl TextClientConfig {
    fn from_args(args: Vec<String>) -> Result<TextClientConfig, String> {
        let client_args = TextClientConfig::parse_from(args.iter());
        Ok(client_args)
    }
}

pub fn parse(args: Vec<String>) -> Result<TextClientConfig, String> {
    TextClientConfig::from_args(args)
}
