//! Plain GET helpers the cart uses to talk to its upstream services.
//!
//! They never fail: transport errors come back as a 500 with an empty object, and error
//! statuses keep whatever JSON the upstream sent.

use reqwest::{blocking::Client, header::ACCEPT};
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub data: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends `GET full_url` with `Accept: application/json` using a default client.
pub fn get(full_url: &str) -> UpstreamResponse {
    get_with(&Client::new(), full_url)
}

pub fn get_with(client: &Client, full_url: &str) -> UpstreamResponse {
    let response = match client.get(full_url).header(ACCEPT, "application/json").send() {
        Ok(response) => response,
        Err(e) => {
            warn!(url = full_url, error = %e, "upstream request failed");
            return UpstreamResponse {
                status: 500,
                data: json!({}),
            };
        }
    };

    let status = response.status().as_u16();
    let data = response.json::<Value>().unwrap_or_else(|_| json!({}));
    debug!(url = full_url, status, "upstream responded");

    UpstreamResponse { status, data }
}
