#![allow(dead_code)]

pub mod multi_thread_server;
pub mod random_port;
pub mod text_client;

pub use multi_thread_server::{spawn_server, TextcachedTestServer};
pub use text_client::TextClient;

use std::path::PathBuf;

pub struct TextcachedServerParamsBuilder {
    capacity: usize,
    threads: usize,
    port: u16,
    journal_file: Option<PathBuf>,
}

impl TextcachedServerParamsBuilder {
    pub fn new() -> TextcachedServerParamsBuilder {
        TextcachedServerParamsBuilder {
            capacity: 1000,
            threads: 2,
            port: 11211,
            journal_file: None,
        }
    }

    pub fn with_capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn with_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    pub fn with_journal_file(&mut self, path: PathBuf) -> &mut Self {
        self.journal_file = Some(path);
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        result.push(String::from("./target/debug/textcached"));

        result.push(String::from("--runtime-type"));
        result.push(String::from("multi-thread"));

        result.push(String::from("--threads"));
        result.push(self.threads.to_string());

        result.push(String::from("--capacity"));
        result.push(self.capacity.to_string());

        result.push(String::from("--port"));
        result.push(self.port.to_string());

        if let Some(journal_file) = &self.journal_file {
            result.push(String::from("--journal-file"));
            result.push(journal_file.display().to_string());
        }

        result
    }
}

impl Default for TextcachedServerParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
