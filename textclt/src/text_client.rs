use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Minimal blocking text protocol client.
pub struct TextClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TextClient {
    pub fn connect(address: &str) -> Result<TextClient, String> {
        let stream = TcpStream::connect(address).map_err(|err| err.to_string())?;
        stream.set_nodelay(true).map_err(|err| err.to_string())?;
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .map_err(|err| err.to_string())?;
        let reader = BufReader::new(stream.try_clone().map_err(|err| err.to_string())?);
        Ok(TextClient { stream, reader })
    }

    pub fn send_line(&mut self, line: &str) -> Result<(), String> {
        write!(self.stream, "{}\r\n", line).map_err(|err| err.to_string())?;
        self.stream.flush().map_err(|err| err.to_string())
    }

    pub fn read_line(&mut self) -> Result<String, String> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|err| err.to_string())?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn roundtrip(&mut self, line: &str) -> Result<String, String> {
        self.send_line(line)?;
        self.read_line()
    }

    pub fn store(&mut self, header: &str, payload: &str) -> Result<String, String> {
        self.send_line(header)?;
        self.send_line(payload)?;
        self.read_line()
    }

    /// Fetches a key: Ok(None) on END, otherwise flags, byte count and
    /// payload from the value block.
    pub fn get(&mut self, key: &str) -> Result<Option<(u32, u32, String)>, String> {
        self.send_line(&format!("get {}", key))?;
        let header = self.read_line()?;
        if header == "END" {
            return Ok(None);
        }
        let fields: Vec<&str> = header.split(' ').collect();
        if fields.len() != 4 || fields[0] != "VALUE" {
            return Err(format!("unexpected get reply: {}", header));
        }
        let flags: u32 = fields[2]
            .parse()
            .map_err(|_| format!("bad flags field in: {}", header))?;
        let byte_count: u32 = fields[3]
            .parse()
            .map_err(|_| format!("bad bytes field in: {}", header))?;
        let payload = self.read_line()?;
        Ok(Some((flags, byte_count, payload)))
    }
}
