//! What to answer when no rule matched.
//!
//! `Clarify` replies from the catalog's default list. `Lookup` first asks an
//! external answer service about the free text and only falls back to the
//! default list when it has nothing (or fails).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConfigError, GatewayError};

/// Configured policy for unhandled messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    Clarify,
    Lookup,
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clarify" => Ok(Self::Clarify),
            "lookup" => Ok(Self::Lookup),
            other => Err(ConfigError::InvalidValue {
                key: "RESPONDER_FALLBACK".into(),
                message: format!("expected 'clarify' or 'lookup', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clarify => f.write_str("clarify"),
            Self::Lookup => f.write_str("lookup"),
        }
    }
}

/// External free-text answer service for product questions.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Answer a question. `Ok(None)` means the service had no answer.
    async fn answer(&self, question: &str) -> Result<Option<String>, GatewayError>;
}

/// Resolved fallback strategy held by the responder.
#[derive(Clone, Default)]
pub enum Fallback {
    #[default]
    Clarify,
    Lookup(Arc<dyn ProductLookup>),
}

impl Fallback {
    pub fn policy(&self) -> FallbackPolicy {
        match self {
            Self::Clarify => FallbackPolicy::Clarify,
            Self::Lookup(_) => FallbackPolicy::Lookup,
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fallback({})", self.policy())
    }
}
