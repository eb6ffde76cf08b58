mod api;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;

use signoff_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use signoff_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    let router =
        api::router(app.coordinator.clone()).merge(health::router(app.db_pool.clone()));

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "signoff-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs.max(1));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut drain_rx = shutdown_rx.clone();
    let mut server = tokio::spawn(
        std::future::IntoFuture::into_future(axum::serve(listener, router).with_graceful_shutdown(
            async move {
                let _ = drain_rx.wait_for(|stopping| *stopping).await;
            },
        )),
    );

    let mut signal_rx = shutdown_rx;
    tokio::select! {
        joined = &mut server => {
            // The server only exits on its own when serving fails.
            joined??;
            return Ok(());
        }
        _ = signal_rx.wait_for(|stopping| *stopping) => {}
    }

    tracing::info!(
        event_name = "system.server.stopping",
        grace_secs = grace.as_secs(),
        "shutdown signal received, draining connections"
    );

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => joined??,
        Err(_) => {
            server.abort();
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                "graceful drain window elapsed, aborting remaining connections"
            );
        }
    }

    Ok(())
}
