//! Blocking HTTP transport.
//!
//! This module is only available when the `http` feature is enabled.

use std::time::Duration;

use formtree::{FormError, Transport};
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::debug;

/// Sends JSON to a backend rooted at a base URL.
pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    /// Creates a transport for `base`, e.g. `http://localhost:8000`.
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint.trim_start_matches('/'))
    }
}

fn read(response: Response) -> formtree::Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(FormError::transport(format!("status {status}")));
    }
    response
        .json()
        .map_err(|e| FormError::transport(e.to_string()))
}

impl Transport for HttpTransport {
    fn post_json(&mut self, endpoint: &str, body: &Value) -> formtree::Result<Value> {
        let url = self.url(endpoint);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| FormError::transport(e.to_string()))?;
        read(response)
    }

    fn get_json(&mut self, endpoint: &str) -> formtree::Result<Value> {
        let url = self.url(endpoint);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FormError::transport(e.to_string()))?;
        read(response)
    }
}
