//! Scripted transport for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::HttpTransport;

enum Reply {
    Body(String),
    Fail(TransportError),
}

/// Answers GETs from a list of `(url fragment, reply)` routes and records
/// every URL it was asked for.
///
/// The first route whose fragment occurs in the URL wins; unmatched URLs
/// fail with [`TransportError::Http`].
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, fragment: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push((fragment.into(), Reply::Body(body.into())));
        self
    }

    pub fn respond_json(self, fragment: impl Into<String>, body: &serde_json::Value) -> Self {
        self.respond(fragment, body.to_string())
    }

    pub fn fail(mut self, fragment: impl Into<String>, error: TransportError) -> Self {
        self.routes.push((fragment.into(), Reply::Fail(error)));
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        match self.routes.iter().find(|(fragment, _)| url.contains(fragment.as_str())) {
            Some((_, Reply::Body(body))) => Ok(body.clone()),
            Some((_, Reply::Fail(error))) => Err(error.clone()),
            None => Err(TransportError::Http(format!("no mock route for {url}"))),
        }
    }
}
