//! Shared types for the message processing pipeline.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

// ── Inbound message ─────────────────────────────────────────────────

/// A pending customer message fetched from the marketplace.
///
/// Lives for a single cycle: fetched, classified, answered, dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Marketplace message ID, echoed back when replying.
    pub id: String,
    /// Raw message text as typed by the customer.
    pub content: String,
}

impl InboundMessage {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Intent assigned to an inbound message by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// "Where is my order?"
    Status,
    /// Slow or late delivery.
    Delay,
    /// Cancellation, refund, address change, exchange.
    RefundCancel,
    /// Damaged, defective or lost parcel.
    DamagedLost,
    /// Promotions and coupons.
    Promotions,
    /// Nothing matched.
    Unhandled,
}

impl Category {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Delay => "delay",
            Self::RefundCancel => "refund_cancel",
            Self::DamagedLost => "damaged_lost",
            Self::Promotions => "promotions",
            Self::Unhandled => "unhandled",
        }
    }

    /// Whether a thank-you message follows the main reply.
    ///
    /// Refund and cancellation requests are not thanked.
    pub fn wants_thank_you(&self) -> bool {
        !matches!(self, Self::RefundCancel)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Reply key ───────────────────────────────────────────────────────

/// A template list in the response catalog.
///
/// Every `Category` has one, plus the dedicated thank-you list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKey {
    Category(Category),
    ThankYou,
}

impl ReplyKey {
    /// All keys the responder may look up.
    pub const ALL: [ReplyKey; 7] = [
        ReplyKey::Category(Category::Status),
        ReplyKey::Category(Category::Delay),
        ReplyKey::Category(Category::RefundCancel),
        ReplyKey::Category(Category::DamagedLost),
        ReplyKey::Category(Category::Promotions),
        ReplyKey::Category(Category::Unhandled),
        ReplyKey::ThankYou,
    ];

    /// Key used in the catalog JSON file.
    pub fn catalog_key(&self) -> &'static str {
        match self {
            Self::Category(Category::Status) => "status do pedido",
            Self::Category(Category::Delay) => "demora com a entrega",
            Self::Category(Category::RefundCancel) => "reembolso/cancelamento",
            Self::Category(Category::DamagedLost) => "extraviado ou veio com defeito",
            Self::Category(Category::Promotions) => "promoções e cupons",
            Self::Category(Category::Unhandled) => "resposta padrão",
            Self::ThankYou => "agradecimento",
        }
    }

    /// Inverse of [`ReplyKey::catalog_key`].
    pub fn from_catalog_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.catalog_key() == key)
    }
}

impl From<Category> for ReplyKey {
    fn from(category: Category) -> Self {
        Self::Category(category)
    }
}

impl fmt::Display for ReplyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

// ── Gateway trait ───────────────────────────────────────────────────

/// Marketplace messaging API — pure I/O, no business logic.
///
/// `fetch_pending` returning `Err` means "no messages available this cycle",
/// which is distinct from `Ok(vec![])` ("nothing pending").
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Gateway name for logging.
    fn name(&self) -> &str;

    /// Fetch messages awaiting a reply.
    async fn fetch_pending(&self) -> Result<Vec<InboundMessage>, GatewayError>;

    /// Send one reply to a message.
    async fn send_reply(&self, message_id: &str, reply: &str) -> Result<(), GatewayError>;
}
