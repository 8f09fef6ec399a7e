use std::sync::Arc;

use d_store::gather_metrics;
use d_store::register_custom_metrics;
use d_store::watch_channels;
use d_store::Error;
use d_store::KeyPatternExecutor;
use d_store::QueryWatcher;
use d_store::Result;
use d_store::ShardManager;
use d_store::SocketTransport;
use d_store::StoreConfig;
use d_store::REGISTRY;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let settings = StoreConfig::new()?.validate()?;
    info!(?settings, "Configuration loaded");
    register_custom_metrics(&REGISTRY);

    let channels = watch_channels(&settings.watch);
    let shards = Arc::new(ShardManager::new(&settings, Some(channels.event_tx.clone())));
    let transport = Arc::new(SocketTransport::new());

    let watcher = QueryWatcher::new(
        shards.clone(),
        Arc::new(KeyPatternExecutor),
        transport,
        channels.event_rx,
        channels.subscription_rx,
    );

    let cancel = CancellationToken::new();
    let watcher_handle = tokio::spawn(watcher.run(cancel.clone()));

    info!("Application started. Waiting for CTRL+C signal...");
    if let Err(e) = graceful_shutdown(cancel).await {
        error!("Failed to shutdown: {:?}", e);
    }

    match watcher_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("query watcher stops: {:?}", e),
        Err(e) => error!("query watcher task failed: {:?}", e),
    }

    info!(keys = shards.key_count(), "Shutdown completed");
    info!("{}", gather_metrics(&REGISTRY));
    Ok(())
}

async fn graceful_shutdown(cancel: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown server..");
    cancel.cancel();
    Ok(())
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();
}
