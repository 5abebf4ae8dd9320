//! Shopee partner API gateway — fetch pending chat messages, send replies.
//!
//! Every request carries `partner_id`, `timestamp`, `shop_id` and a `sign`
//! computed over the endpoint path (see [`signing`](super::signing)).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::channels::http_client;
use crate::channels::signing::sign;
use crate::config::Credentials;
use crate::error::GatewayError;
use crate::pipeline::types::{InboundMessage, MessageGateway};

/// Signed path of the fetch endpoint.
pub const GET_MESSAGE_PATH: &str = "/v2/message/get_message";

/// Signed path of the send endpoint.
pub const SEND_MESSAGE_PATH: &str = "/v2/message/send_message";

/// Maximum response body length echoed into error messages.
const MAX_ERROR_BODY: usize = 512;

/// Envelope shared by the partner API responses.
#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<RawMessage>>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    content: Option<serde_json::Value>,
}

/// Marketplace gateway over HTTPS.
pub struct ShopeeGateway {
    credentials: Credentials,
    api_base: String,
    client: reqwest::Client,
}

impl ShopeeGateway {
    /// Every request is abandoned after `timeout`.
    pub fn new(
        credentials: Credentials,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            credentials,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: http_client("shopee", timeout)?,
        })
    }

    /// URL for a signed path. The base already ends in `/api/v2`.
    fn api_url(&self, path: &str) -> String {
        let relative = path.strip_prefix("/v2").unwrap_or(path);
        format!("{}{relative}", self.api_base)
    }

    /// Common signed parameters for a request to `path`.
    fn signed_params(&self, path: &str) -> serde_json::Map<String, serde_json::Value> {
        let timestamp = Utc::now().timestamp();
        let signature = sign(
            &self.credentials.partner_id,
            path,
            timestamp,
            &self.credentials.secret_key,
        );

        let mut params = serde_json::Map::new();
        params.insert("partner_id".into(), self.credentials.partner_id.clone().into());
        params.insert("timestamp".into(), timestamp.into());
        params.insert("sign".into(), signature.into());
        params.insert("shop_id".into(), self.credentials.shop_id.clone().into());
        params
    }

    /// Read the body and map non-2xx statuses to `GatewayError::Status`.
    async fn read_body(path: &str, resp: reqwest::Response) -> Result<String, GatewayError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| GatewayError::Http {
            endpoint: path.into(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: path.into(),
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MessageGateway for ShopeeGateway {
    fn name(&self) -> &str {
        "shopee"
    }

    async fn fetch_pending(&self) -> Result<Vec<InboundMessage>, GatewayError> {
        let params = self.signed_params(GET_MESSAGE_PATH);
        let query: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();

        let resp = self
            .client
            .get(self.api_url(GET_MESSAGE_PATH))
            .query(&query)
            .send()
            .await
            .map_err(|e| GatewayError::Http {
                endpoint: GET_MESSAGE_PATH.into(),
                reason: e.to_string(),
            })?;

        let body = Self::read_body(GET_MESSAGE_PATH, resp).await?;
        let messages = parse_messages(GET_MESSAGE_PATH, &body)?;
        debug!(count = messages.len(), "Fetched pending messages");
        Ok(messages)
    }

    async fn send_reply(&self, message_id: &str, reply: &str) -> Result<(), GatewayError> {
        let mut payload = self.signed_params(SEND_MESSAGE_PATH);
        payload.insert("message_id".into(), message_id.into());
        payload.insert("message".into(), reply.into());

        let resp = self
            .client
            .post(self.api_url(SEND_MESSAGE_PATH))
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Http {
                endpoint: SEND_MESSAGE_PATH.into(),
                reason: e.to_string(),
            })?;

        let body = Self::read_body(SEND_MESSAGE_PATH, resp).await?;
        check_api_error(SEND_MESSAGE_PATH, &body)
    }
}

/// Parse a fetch response into messages.
///
/// Messages without an ID are skipped; a missing `content` is empty text.
/// Non-text content (stickers, images) skips just that message.
pub fn parse_messages(endpoint: &str, body: &str) -> Result<Vec<InboundMessage>, GatewayError> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse {
            endpoint: endpoint.into(),
            reason: e.to_string(),
        })?;

    api_error(endpoint, &envelope)?;

    let messages = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| {
            let id = match raw.id {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                other => {
                    warn!(id = ?other, "Skipping message without a usable id");
                    return None;
                }
            };
            let content = match raw.content {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => s,
                Some(other) => {
                    warn!(
                        message_id = %id,
                        content = %other,
                        "Skipping message with non-text content"
                    );
                    return None;
                }
            };
            Some(InboundMessage::new(id, content))
        })
        .collect();

    Ok(messages)
}

/// Check a send response for an API-level error. An empty body is success.
fn check_api_error(endpoint: &str, body: &str) -> Result<(), GatewayError> {
    if body.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<ApiEnvelope>(body) {
        Ok(envelope) => api_error(endpoint, &envelope),
        Err(e) => Err(GatewayError::InvalidResponse {
            endpoint: endpoint.into(),
            reason: e.to_string(),
        }),
    }
}

fn api_error(endpoint: &str, envelope: &ApiEnvelope) -> Result<(), GatewayError> {
    match envelope.error.as_deref() {
        Some(error) if !error.is_empty() => Err(GatewayError::Api {
            endpoint: endpoint.into(),
            error: error.to_string(),
            message: envelope.message.clone().unwrap_or_default(),
        }),
        _ => Ok(()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
