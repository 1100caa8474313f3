//! DogWorld marketplace HTTP server.

use anyhow::Context;
use dogworld_server::app::{Storage, build_state, load_accounts};
use dogworld_server::config::Config;
use dogworld_web::build_router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dogworld=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DogWorld server");

    let config = Config::from_env();
    info!(
        address = %config.server_address(),
        postgres = config.database.url.is_some(),
        seed = config.marketplace.seed_default_listings,
        "Configuration loaded"
    );

    install_metrics(&config)?;

    let accounts = load_accounts(&config)?;
    let storage = match &config.database.url {
        Some(url) => {
            info!("Connecting to PostgreSQL...");
            Storage::postgres(url, config.database.max_connections, &accounts).await?
        }
        None => {
            info!("DATABASE_URL not set; using in-memory storage");
            Storage::in_memory(&accounts)
        }
    };

    let state = build_state(&config, &accounts, storage).await?;
    let app = build_router(state);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on {}", addr);

    let signalled = Arc::new(Notify::new());
    let on_signal = signalled.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                on_signal.notify_one();
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => result??,
        () = signalled.notified() => {
            let grace = Duration::from_secs(config.server.shutdown_timeout);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    warn!(
                        timeout_secs = grace.as_secs(),
                        "Connections still open after shutdown timeout"
                    );
                    server.abort();
                }
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Installs the Prometheus recorder and its scrape endpoint.
fn install_metrics(config: &Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .metrics_address()
        .parse()
        .with_context(|| format!("invalid metrics address {}", config.metrics_address()))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        )?
        .install()
        .context("installing Prometheus exporter")?;
    dogworld_core::metrics::register_metrics();

    info!(%addr, "Metrics available at http://{}/metrics", addr);
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
