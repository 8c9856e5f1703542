//! bookfeed binary
//!
//! Parses flags, fans out per-symbol workers, and publishes consolidated
//! rows until SIGINT/SIGTERM. Diagnostics go to stderr so stdout stays
//! clean for CSV output.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bookfeed::websocket::TradeStream;
use bookfeed::{Config, OrderBook, Publisher, RestClient, SymbolFeed, SyncWorker, TradeStats};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(std::env::args().skip(1))?;
    info!(symbols = ?config.symbols, top_n = config.top_n, "starting bookfeed");

    let rest: Arc<RestClient> = Arc::new(RestClient::new(&config.rest_endpoint)?);

    let mut workers = Vec::with_capacity(config.symbols.len());
    let mut trade_streams = Vec::with_capacity(config.symbols.len());
    let mut feeds = Vec::with_capacity(config.symbols.len());

    for symbol in &config.symbols {
        let book = Arc::new(OrderBook::new(symbol));
        let stats = Arc::new(TradeStats::new());

        let mut worker = SyncWorker::new(symbol, book.clone(), rest.clone(), &config.ws_endpoint);
        worker.start().await;
        workers.push(worker);

        let mut trades = TradeStream::new(symbol, &config.ws_endpoint, stats.clone());
        trades.start();
        trade_streams.push(trades);

        feeds.push(SymbolFeed {
            symbol: symbol.clone(),
            book,
            stats,
        });
    }

    let mut publisher = Publisher::new(feeds, config.top_n, config.log_path.clone());
    publisher.start().await?;

    shutdown_signal().await;
    info!("shutdown signal received");

    publisher.stop().await;
    for stream in &mut trade_streams {
        stream.stop();
    }
    for worker in &mut workers {
        worker.stop().await;
    }

    info!("clean shutdown");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
