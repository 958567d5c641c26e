use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Bare-bones text protocol client: one line out, one line back. Tests
/// drive the raw wire format on purpose.
pub struct TextClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TextClient {
    /// Connects with retries; the server thread binds asynchronously.
    pub fn connect(address: &str) -> TextClient {
        for _ in 0..100 {
            if let Ok(stream) = TcpStream::connect(address) {
                stream.set_nodelay(true).unwrap();
                stream
                    .set_read_timeout(Some(Duration::from_secs(10)))
                    .unwrap();
                let reader = BufReader::new(stream.try_clone().unwrap());
                return TextClient { stream, reader };
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("cannot connect to test server at {}", address);
    }

    pub fn send_line(&mut self, line: &str) {
        write!(self.stream, "{}\r\n", line).unwrap();
        self.stream.flush().unwrap();
    }

    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// Sends one header line and reads one reply line.
    pub fn roundtrip(&mut self, line: &str) -> String {
        self.send_line(line);
        self.read_line()
    }

    /// Sends a write command (header + payload) and reads the reply line.
    pub fn store(&mut self, header: &str, payload: &str) -> String {
        self.send_line(header);
        self.send_line(payload);
        self.read_line()
    }

    /// Sends a write command with noreply; no reply line is read.
    pub fn store_noreply(&mut self, header: &str, payload: &str) {
        self.send_line(header);
        self.send_line(payload);
    }

    /// Fetches a key: None on END, otherwise (flags, byte_count, payload).
    pub fn get(&mut self, key: &str) -> Option<(u32, u32, String)> {
        self.send_line(&format!("get {}", key));
        let header = self.read_line();
        if header == "END" {
            return None;
        }
        let fields: Vec<&str> = header.split(' ').collect();
        assert_eq!(fields[0], "VALUE", "unexpected reply: {}", header);
        assert_eq!(fields[1], key);
        let flags: u32 = fields[2].parse().unwrap();
        let byte_count: u32 = fields[3].parse().unwrap();
        let payload = self.read_line();
        Some((flags, byte_count, payload))
    }
}
