//! Random reply selection over the response catalog.

use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::pipeline::catalog::ResponseCatalog;
use crate::pipeline::types::ReplyKey;

/// Picks a reply uniformly at random from a catalog list.
///
/// The random source is injected so tests can seed it.
pub struct ReplySelector<R = StdRng> {
    catalog: Arc<ResponseCatalog>,
    rng: R,
}

impl ReplySelector<StdRng> {
    /// Selector backed by an OS-seeded RNG.
    pub fn from_entropy(catalog: Arc<ResponseCatalog>) -> Self {
        Self::new(catalog, StdRng::from_entropy())
    }

    /// Selector with a fixed seed (reproducible picks).
    pub fn seeded(catalog: Arc<ResponseCatalog>, seed: u64) -> Self {
        Self::new(catalog, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ReplySelector<R> {
    pub fn new(catalog: Arc<ResponseCatalog>, rng: R) -> Self {
        Self { catalog, rng }
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    /// Pick one template for the given key.
    pub fn select(&mut self, key: impl Into<ReplyKey>) -> Result<String, PipelineError> {
        let key = key.into();
        self.catalog
            .candidates(key)
            .and_then(|list| list.choose(&mut self.rng))
            .cloned()
            .ok_or_else(|| PipelineError::CategoryNotFound(key.catalog_key().to_string()))
    }

    /// Pick one thank-you template.
    pub fn thank_you(&mut self) -> Result<String, PipelineError> {
        self.select(ReplyKey::ThankYou)
    }
}
