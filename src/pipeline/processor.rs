//! Message processor — classifies one message and sends the canned replies.
//!
//! Flow per message:
//! 1. Rules engine → `Category`
//! 2. Reply selection (catalog, or the fallback for unhandled messages)
//! 3. Send reply
//! 4. Send a thank-you unless the category is refund/cancel
//!
//! Each send is attempted once. Failures are logged and counted, never raised.

use std::sync::{Arc, Mutex};

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::pipeline::fallback::Fallback;
use crate::pipeline::rules::RulesEngine;
use crate::pipeline::selector::ReplySelector;
use crate::pipeline::types::{Category, InboundMessage, MessageGateway};

/// Outcome of processing a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub message_id: String,
    pub category: Category,
    /// The main reply was delivered.
    pub reply_sent: bool,
    /// A thank-you was delivered.
    pub thanks_sent: bool,
    /// Selection misses plus failed sends.
    pub failures: usize,
}

/// Per-message auto-responder.
pub struct MessageProcessor<R = StdRng> {
    gateway: Arc<dyn MessageGateway>,
    rules: RulesEngine,
    selector: Mutex<ReplySelector<R>>,
    fallback: Fallback,
}

impl<R: Rng + Send> MessageProcessor<R> {
    /// Create a new message processor with the clarify fallback.
    pub fn new(
        gateway: Arc<dyn MessageGateway>,
        rules: RulesEngine,
        selector: ReplySelector<R>,
    ) -> Self {
        Self {
            gateway,
            rules,
            selector: Mutex::new(selector),
            fallback: Fallback::Clarify,
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn gateway(&self) -> &Arc<dyn MessageGateway> {
        &self.gateway
    }

    /// Classify, answer and (optionally) thank one message.
    pub async fn process(&self, message: &InboundMessage) -> MessageOutcome {
        let category = self.rules.classify(&message.content);
        debug!(
            message_id = %message.id,
            category = %category,
            "Classified message"
        );

        let mut outcome = MessageOutcome {
            message_id: message.id.clone(),
            category,
            reply_sent: false,
            thanks_sent: false,
            failures: 0,
        };

        match self.reply_for(category, &message.content).await {
            Ok(reply) => {
                outcome.reply_sent = self.send(&message.id, &reply, "reply").await;
                if !outcome.reply_sent {
                    outcome.failures += 1;
                }
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Skipping reply");
                outcome.failures += 1;
            }
        }

        if category.wants_thank_you() {
            match self.pick(|selector| selector.thank_you()) {
                Ok(thanks) => {
                    outcome.thanks_sent = self.send(&message.id, &thanks, "thank_you").await;
                    if !outcome.thanks_sent {
                        outcome.failures += 1;
                    }
                }
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Skipping thank-you");
                    outcome.failures += 1;
                }
            }
        }

        outcome
    }

    /// Pick the main reply text for a category.
    async fn reply_for(&self, category: Category, content: &str) -> Result<String, PipelineError> {
        if category == Category::Unhandled {
            if let Some(answer) = self.lookup(content).await {
                return Ok(answer);
            }
        }
        self.pick(|selector| selector.select(category))
    }

    /// Ask the lookup service, if configured. `None` means use the catalog.
    async fn lookup(&self, content: &str) -> Option<String> {
        let Fallback::Lookup(lookup) = &self.fallback else {
            return None;
        };
        if content.trim().is_empty() {
            return None;
        }

        match lookup.answer(content).await {
            Ok(Some(answer)) => Some(answer),
            Ok(None) => {
                debug!("Lookup had no answer, using default reply");
                None
            }
            Err(e) => {
                warn!(error = %e, "Product lookup failed, using default reply");
                None
            }
        }
    }

    fn pick<T>(&self, f: impl FnOnce(&mut ReplySelector<R>) -> T) -> T {
        let mut selector = self
            .selector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut selector)
    }

    async fn send(&self, message_id: &str, text: &str, kind: &str) -> bool {
        match self.gateway.send_reply(message_id, text).await {
            Ok(()) => {
                info!(message_id, kind, "Reply sent");
                true
            }
            Err(e) => {
                warn!(message_id, kind, error = %e, "Failed to send reply");
                false
            }
        }
    }
}
