use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use shop_responder::channels::{InstantAnswerLookup, ShopeeGateway};
use shop_responder::config::{Credentials, ResponderConfig};
use shop_responder::pipeline::{
    Fallback, FallbackPolicy, MessageGateway, MessageProcessor, Poller, ReplySelector,
    ResponseCatalog, RulesEngine,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = ResponderConfig::from_env().context("Invalid responder configuration")?;

    // Initialize tracing (stderr, plus a daily file when RESPONDER_LOG_DIR is set)
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "responder.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    let credentials = Credentials::from_env().context("Missing marketplace credentials")?;

    let catalog = Arc::new(
        ResponseCatalog::load(&config.catalog_path).context("Failed to load response catalog")?,
    );

    eprintln!("🛒 Shop Responder v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Shop: {}", credentials.shop_id);
    eprintln!("   API: {}", config.api_base);
    eprintln!("   Catalog: {}", config.catalog_path.display());
    eprintln!("   Poll interval: {}s", config.poll_interval.as_secs());
    eprintln!("   HTTP timeout: {}s", config.http_timeout.as_secs());
    eprintln!("   Fallback: {}", config.fallback);
    eprintln!("   Press Ctrl+C to stop.\n");

    let gateway: Arc<dyn MessageGateway> = Arc::new(
        ShopeeGateway::new(credentials, config.api_base.clone(), config.http_timeout)
            .context("Failed to create marketplace client")?,
    );

    let fallback = match config.fallback {
        FallbackPolicy::Clarify => Fallback::Clarify,
        FallbackPolicy::Lookup => Fallback::Lookup(Arc::new(
            InstantAnswerLookup::new(config.lookup_url.clone(), config.http_timeout)
                .context("Failed to create lookup client")?,
        )),
    };

    let processor = MessageProcessor::new(
        gateway,
        RulesEngine::default_rules(),
        ReplySelector::from_entropy(catalog),
    )
    .with_fallback(fallback);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Keep the sender alive so the poller is not stopped by the drop.
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl+C received, shutting down...");
        let _ = shutdown_tx.send(true);
    });

    Poller::new(processor, config.poll_interval)
        .run(shutdown_rx)
        .await;

    Ok(())
}
