//! Instant-answer lookup for unhandled product questions.
//!
//! Queries a DuckDuckGo-style instant answer API and returns the text of the
//! first related topic.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::channels::http_client;
use crate::error::GatewayError;
use crate::pipeline::fallback::ProductLookup;

const ENDPOINT: &str = "lookup";

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
}

/// Instant-answer client.
pub struct InstantAnswerLookup {
    url: String,
    client: reqwest::Client,
}

impl InstantAnswerLookup {
    /// Every request is abandoned after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            url: url.into(),
            client: http_client(ENDPOINT, timeout)?,
        })
    }
}

#[async_trait]
impl ProductLookup for InstantAnswerLookup {
    async fn answer(&self, question: &str) -> Result<Option<String>, GatewayError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("q", question),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
                ("skip_disambiguation", "1"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Http {
                endpoint: ENDPOINT.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: ENDPOINT.into(),
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = resp.text().await.map_err(|e| GatewayError::Http {
            endpoint: ENDPOINT.into(),
            reason: e.to_string(),
        })?;
        let answer = first_topic(&body)?;
        debug!(found = answer.is_some(), "Instant answer lookup complete");
        Ok(answer)
    }
}

/// Text of the first related topic, if any.
pub fn first_topic(body: &str) -> Result<Option<String>, GatewayError> {
    let parsed: InstantAnswer =
        serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse {
            endpoint: ENDPOINT.into(),
            reason: e.to_string(),
        })?;

    Ok(parsed
        .related_topics
        .into_iter()
        .next()
        .and_then(|topic| topic.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}
