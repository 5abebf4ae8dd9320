//! Marketplace and lookup I/O.

pub mod lookup;
pub mod shopee;
pub mod signing;

use std::time::Duration;

use crate::error::GatewayError;

pub use lookup::InstantAnswerLookup;
pub use shopee::ShopeeGateway;

/// HTTP client whose requests fail with `GatewayError::Http` after `timeout`.
fn http_client(endpoint: &str, timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Http {
            endpoint: endpoint.into(),
            reason: format!("failed to build HTTP client: {e}"),
        })
}
