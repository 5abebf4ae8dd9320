//! Auto-reply pipeline.
//!
//! Every pending message flows through:
//! 1. `MessageGateway::fetch_pending()` — marketplace I/O
//! 2. `RulesEngine::classify()` — ordered keyword rules
//! 3. `ReplySelector::select()` — random template from the catalog
//! 4. `MessageGateway::send_reply()` — reply, then thank-you unless refund/cancel
//!
//! `Poller` repeats this once per interval until shut down.

pub mod catalog;
pub mod fallback;
pub mod poller;
pub mod processor;
pub mod rules;
pub mod selector;
pub mod types;

pub use catalog::ResponseCatalog;
pub use fallback::{Fallback, FallbackPolicy, ProductLookup};
pub use poller::{CycleReport, Poller, Sleeper, TokioSleeper};
pub use processor::{MessageOutcome, MessageProcessor};
pub use rules::RulesEngine;
pub use selector::ReplySelector;
pub use types::{Category, InboundMessage, MessageGateway, ReplyKey};
