//! Poll loop — fetch pending messages, answer them, sleep, repeat.
//!
//! Strictly sequential: a cycle finishes every fetch and send before the
//! next sleep starts. The first cycle runs immediately. Shutdown interrupts
//! the sleep or, if a request is stuck, the cycle in progress.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::pipeline::processor::MessageProcessor;

/// Default interval between cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Sleep abstraction so tests can run cycles without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Counters for one fetch → answer cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The fetch failed and nothing was processed.
    pub fetch_failed: bool,
    pub fetched: usize,
    pub replies_sent: usize,
    pub thanks_sent: usize,
    pub failures: usize,
}

/// Drives the processor on a fixed interval.
pub struct Poller<R = StdRng> {
    processor: MessageProcessor<R>,
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl<R: Rng + Send> Poller<R> {
    pub fn new(processor: MessageProcessor<R>, interval: Duration) -> Self {
        Self {
            processor,
            interval,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run a single cycle: fetch → (classify → reply → thank) per message.
    pub async fn poll_once(&self) -> CycleReport {
        let gateway = self.processor.gateway();
        let messages = match gateway.fetch_pending().await {
            Ok(msgs) => msgs,
            Err(e) => {
                error!(gateway = gateway.name(), "Message fetch failed, skipping cycle: {e}");
                return CycleReport {
                    fetch_failed: true,
                    ..Default::default()
                };
            }
        };

        let mut report = CycleReport {
            fetched: messages.len(),
            ..Default::default()
        };

        if messages.is_empty() {
            debug!("No pending messages");
            return report;
        }

        info!("Processing {} pending message(s)", messages.len());

        for message in &messages {
            let outcome = self.processor.process(message).await;
            report.replies_sent += usize::from(outcome.reply_sent);
            report.thanks_sent += usize::from(outcome.thanks_sent);
            report.failures += outcome.failures;
        }

        info!(
            fetched = report.fetched,
            replies = report.replies_sent,
            thanks = report.thanks_sent,
            failures = report.failures,
            "Cycle complete"
        );
        report
    }

    /// Run cycles until `shutdown` turns true (or its sender is dropped).
    ///
    /// Returns the number of completed cycles.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(
            gateway = self.processor.gateway().name(),
            "Responder started — polling every {}s",
            self.interval.as_secs()
        );

        let mut cycles = 0u64;
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let cycle = self.poll_once();
            tokio::pin!(cycle);
            let completed = loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow_and_update() {
                            break false;
                        }
                    }
                    _ = &mut cycle => break true,
                }
            };
            if !completed {
                warn!("Shutdown requested mid-cycle, abandoning in-flight requests");
                break;
            }
            cycles += 1;

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
                _ = self.sleeper.sleep(self.interval) => {}
            }
        }

        info!(cycles, "Responder shutting down");
        cycles
    }
}
