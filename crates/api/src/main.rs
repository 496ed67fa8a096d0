use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fleetflow_events::{
    BusNotifier, CompletionNotifier, EventBus, FanoutNotifier, WebhookNotifier,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetflow_api::config::{LogFormat, ServerConfig};
use fleetflow_api::notifications::CompletionLog;
use fleetflow_api::router::build_app_router;
use fleetflow_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Failed to load server configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let pool = fleetflow_db::create_pool();
    fleetflow_db::health_check(&pool)
        .await
        .context("Store health check failed")?;

    if config.seed_demo_data {
        fleetflow_db::seed::seed_demo_data(&pool)
            .await
            .context("Failed to seed demo data")?;
    }

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let completion_log_handle = tokio::spawn(CompletionLog::new().run(event_bus.subscribe()));

    // --- Completion notifiers ---
    let mut notifiers: Vec<Arc<dyn CompletionNotifier>> =
        vec![Arc::new(BusNotifier::new(Arc::clone(&event_bus)))];
    if let Some(url) = &config.notify_webhook_url {
        let webhook = WebhookNotifier::new(url.clone()).context("Failed to build webhook client")?;
        tracing::info!(url = %webhook.url(), "Webhook completion notifier enabled");
        notifiers.push(Arc::new(webhook));
    }
    let fanout = FanoutNotifier::new(notifiers);
    tracing::info!(count = fanout.len(), "Completion notifiers enabled");
    let notifier: Arc<dyn CompletionNotifier> = Arc::new(fanout);

    // --- App state ---
    let state = AppState {
        pool,
        event_bus: Arc::clone(&event_bus),
        notifier,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last bus handle closes the channel and stops the log task.
    drop(event_bus);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, completion_log_handle).await.is_err() {
        tracing::warn!("Completion log did not stop within the shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fleetflow_api=debug,fleetflow_events=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
