use std::env;
extern crate clap;
mod params_parser;
mod text_client;

fn main() {
    textclt::run(env::args().collect())
}

mod textclt {
    use crate::params_parser::{self, TextClientConfig};
    use crate::text_client::TextClient;
    use env_logger::Builder;
    use log::info;
    use std::io::Write as IoWrite;
    use std::process;
    use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

    fn get_log_level(verbose: u8) -> log::LevelFilter {
        // Vary the output based on how many times the user used the "verbose" flag
        // // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
        match verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn init_logger(cli_config: &TextClientConfig) {
        let mut builder = Builder::new();
        builder.filter_level(get_log_level(cli_config.verbose));
        builder.format_module_path(false);
        builder.format_file(false);
        builder.format_source_path(false);
        builder.format_target(false);

        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{}] {style}{:<5}{style:#}: {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        });
        builder.init();
    }

    type Check = (&'static str, fn(&mut TextClient, &TextClientConfig) -> Result<(), String>);

    const CHECKS: &[Check] = &[
        ("set/get round trip", check_set_get),
        ("add on existing key", check_add_existing),
        ("replace on missing key", check_replace_missing),
        ("append without separator", check_append),
        ("prepend without separator", check_prepend),
        ("delete then miss", check_delete),
        ("negative exptime", check_negative_exptime),
        ("noreply set", check_noreply),
        ("capacity counters", check_counters),
        ("large value round trip", check_large_value),
    ];

    pub fn run(args: Vec<String>) {
        let cli_config = match params_parser::parse(args) {
            Ok(config) => config,
            Err(err) => {
                eprint!("{}", err);
                process::exit(1);
            }
        };

        init_logger(&cli_config);

        info!("Server address: {}", cli_config.server_address);
        info!("Server port: {}", cli_config.port);
        info!(
            "Large value size: {}",
            byte_unit::Byte::from_u64(cli_config.value_size)
                .get_appropriate_unit(byte_unit::UnitType::Decimal)
        );

        let address = format!("{}:{}", cli_config.server_address, cli_config.port);
        let mut failures = 0;
        for (name, check) in CHECKS {
            let mut client = match TextClient::connect(&address) {
                Ok(client) => client,
                Err(err) => {
                    eprintln!("cannot connect to {}: {}", address, err);
                    process::exit(1);
                }
            };
            match check(&mut client, &cli_config) {
                Ok(()) => print_outcome(name, true, None),
                Err(reason) => {
                    failures += 1;
                    print_outcome(name, false, Some(&reason));
                }
            }
        }

        if failures > 0 {
            eprintln!("{} check(s) failed", failures);
            process::exit(1);
        }
    }

    fn print_outcome(name: &str, passed: bool, reason: Option<&str>) {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        let (label, color) = if passed {
            ("PASS", Color::Green)
        } else {
            ("FAIL", Color::Red)
        };
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stdout, "{}", label);
        let _ = stdout.reset();
        match reason {
            Some(reason) => {
                let _ = writeln!(stdout, " {}: {}", name, reason);
            }
            None => {
                let _ = writeln!(stdout, " {}", name);
            }
        }
    }

    fn expect(actual: &str, wanted: &str) -> Result<(), String> {
        if actual == wanted {
            Ok(())
        } else {
            Err(format!("expected {:?}, got {:?}", wanted, actual))
        }
    }

    fn check_set_get(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        expect(&client.store("set clt-rt 7 0 5", "hello")?, "STORED")?;
        let (flags, byte_count, payload) = client
            .get("clt-rt")?
            .ok_or_else(|| String::from("entry vanished"))?;
        if flags != 7 || byte_count != 5 || payload != "hello" {
            return Err(format!(
                "round trip mangled: flags={} bytes={} payload={:?}",
                flags, byte_count, payload
            ));
        }
        Ok(())
    }

    fn check_add_existing(
        client: &mut TextClient,
        _config: &TextClientConfig,
    ) -> Result<(), String> {
        expect(&client.store("set clt-add 0 0 3", "old")?, "STORED")?;
        expect(&client.store("add clt-add 0 0 3", "new")?, "NOT_STORED")
    }

    fn check_replace_missing(
        client: &mut TextClient,
        _config: &TextClientConfig,
    ) -> Result<(), String> {
        client.roundtrip("delete clt-replace")?;
        expect(
            &client.store("replace clt-replace 0 0 3", "new")?,
            "NOT_STORED",
        )
    }

    fn check_append(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        expect(&client.store("set clt-app 0 0 3", "Foo")?, "STORED")?;
        expect(&client.store("append clt-app 0 0 3", "bar")?, "STORED")?;
        let (_, _, payload) = client
            .get("clt-app")?
            .ok_or_else(|| String::from("entry vanished"))?;
        expect(&payload, "Foobar")
    }

    fn check_prepend(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        expect(&client.store("set clt-pre 0 0 3", "bar")?, "STORED")?;
        expect(&client.store("prepend clt-pre 0 0 3", "Foo")?, "STORED")?;
        let (_, _, payload) = client
            .get("clt-pre")?
            .ok_or_else(|| String::from("entry vanished"))?;
        expect(&payload, "Foobar")
    }

    fn check_delete(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        expect(&client.store("set clt-del 0 0 1", "x")?, "STORED")?;
        expect(&client.roundtrip("delete clt-del")?, "DELETED")?;
        match client.get("clt-del")? {
            None => Ok(()),
            Some(_) => Err(String::from("entry survived its deletion")),
        }
    }

    fn check_negative_exptime(
        client: &mut TextClient,
        _config: &TextClientConfig,
    ) -> Result<(), String> {
        expect(&client.store("set clt-exp 0 -1 4", "gone")?, "STORED")?;
        match client.get("clt-exp")? {
            None => Ok(()),
            Some(_) => Err(String::from("already-expired entry was readable")),
        }
    }

    fn check_noreply(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        client.send_line("set clt-quiet 0 0 5 noreply")?;
        client.send_line("hello")?;
        // the next reply must belong to the get, not the set
        let (_, _, payload) = client
            .get("clt-quiet")?
            .ok_or_else(|| String::from("noreply set did not store"))?;
        expect(&payload, "hello")
    }

    fn check_counters(client: &mut TextClient, _config: &TextClientConfig) -> Result<(), String> {
        expect(&client.roundtrip("increment 5")?, "INCREMENT")?;
        expect(&client.roundtrip("decrement 5")?, "DECREMENT")
    }

    fn check_large_value(
        client: &mut TextClient,
        config: &TextClientConfig,
    ) -> Result<(), String> {
        let payload = "x".repeat(config.value_size as usize);
        let header = format!("set clt-large 0 0 {}", payload.len());
        expect(&client.store(&header, &payload)?, "STORED")?;
        let (_, _, read_back) = client
            .get("clt-large")?
            .ok_or_else(|| String::from("entry vanished"))?;
        if read_back != payload {
            return Err(format!(
                "large payload mangled: sent {} bytes, got {} back",
                payload.len(),
                read_back.len()
            ));
        }
        Ok(())
    }
}
