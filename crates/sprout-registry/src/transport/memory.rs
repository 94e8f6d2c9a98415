//! In-memory transport
//!
//! Serves canned responses keyed by the exact request URL and records every
//! request it receives. Handy for offline mirrors and for exercising the
//! installer without sockets.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Transport;

/// Transport answering from a fixed URL → body table
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    /// Create an empty transport; every request answers with an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    /// Serve `body` for `url`, replacing any previous response
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.into(), body.into());
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of requests whose URL contains `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch(&self, url: &str) -> Vec<u8> {
        self.requests.lock().push(url.to_string());
        self.responses.get(url).cloned().unwrap_or_default()
    }
}
