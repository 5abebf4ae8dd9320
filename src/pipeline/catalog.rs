//! Response catalog — reply templates per category.
//!
//! Loaded once at startup from a JSON object mapping catalog keys to lists
//! of candidate replies:
//!
//! ```json
//! { "status do pedido": ["Seu pedido está a caminho!"], "agradecimento": ["Obrigado!"] }
//! ```
//!
//! A missing or malformed file is fatal. Missing or empty lists are only
//! warned about: selection for them fails per message without stopping the loop.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::CatalogError;
use crate::pipeline::types::ReplyKey;

/// Immutable mapping from reply key to candidate templates.
#[derive(Debug, Clone, Default)]
pub struct ResponseCatalog {
    templates: HashMap<ReplyKey, Vec<String>>,
}

impl ResponseCatalog {
    /// Load the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            lists = catalog.templates.len(),
            "Loaded response catalog"
        );
        Ok(catalog)
    }

    /// Parse the catalog from JSON text, warning about unknown and missing keys.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_str(raw)?;

        let mut templates = HashMap::new();
        for (key, replies) in parsed {
            match ReplyKey::from_catalog_key(&key) {
                Some(reply_key) => {
                    templates.insert(reply_key, replies);
                }
                None => warn!(key = %key, "Ignoring unknown response catalog key"),
            }
        }

        let catalog = Self { templates };
        catalog.warn_incomplete();
        Ok(catalog)
    }

    /// Build a catalog directly from key/template pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ReplyKey, Vec<S>)>,
        S: Into<String>,
    {
        let templates = entries
            .into_iter()
            .map(|(key, replies)| (key, replies.into_iter().map(Into::into).collect()))
            .collect();
        Self { templates }
    }

    /// Candidate replies for a key. `None` if absent or empty.
    pub fn candidates(&self, key: ReplyKey) -> Option<&[String]> {
        self.templates
            .get(&key)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Keys that cannot produce a reply.
    pub fn missing_keys(&self) -> Vec<ReplyKey> {
        ReplyKey::ALL
            .into_iter()
            .filter(|key| self.candidates(*key).is_none())
            .collect()
    }

    fn warn_incomplete(&self) {
        for key in self.missing_keys() {
            warn!(key = %key, "Response catalog has no templates for key; replies will be skipped");
        }
    }
}
