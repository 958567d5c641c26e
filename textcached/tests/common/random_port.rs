use lazy_static::lazy_static;

use std::sync::Mutex;

pub struct PseudoRandomPort {
    port: u16,
}

impl PseudoRandomPort {
    pub fn new() -> PseudoRandomPort {
        // spread test binaries over the port space so a previous binary's
        // sockets in TIME_WAIT are never in the way
        let starting_port = 10000 + (std::process::id() % 20000) as u16;
        PseudoRandomPort {
            port: starting_port,
        }
    }

    pub fn get_next_port(&mut self) -> u16 {
        self.port += 7;
        self.port
    }
}

lazy_static! {
    pub static ref RANDOM_PORT: Mutex<PseudoRandomPort> = Mutex::new(PseudoRandomPort::new());
}
