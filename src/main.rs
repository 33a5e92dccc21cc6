//! Campus notification client.
//!
//! Connects to the portal's notification channel with a bearer token and logs
//! every connectivity change, unread-count change, alert and announcement
//! until interrupted.

use std::collections::HashSet;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_realtime::{CredentialSource, RealtimeClient};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "notify-client", version, about = "Campus portfolio notification client")]
struct Args {
    /// Configuration overlay to load from `config/<env>.toml`.
    #[arg(long, env = "NOTIFY_ENV", default_value = "development")]
    env: String,

    /// Overrides `realtime.server_url`.
    #[arg(long)]
    url: Option<String>,

    /// Bearer token used for the channel handshake.
    #[arg(long, env = "NOTIFY_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_configuration(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files, environment and flags
fn load_configuration(args: &Args) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&args.env)?;

    if let Some(url) = &args.url {
        config.realtime.server_url = url.clone();
        config.realtime.validate()?;
    }

    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main client run function
async fn run(config: AppConfig, token: Option<String>) -> Result<(), AppError> {
    tracing::info!(
        "Starting notify-client v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.realtime.server_url
    );

    let credentials = CredentialSource::new();
    let client = RealtimeClient::start(config.realtime, &credentials)?;

    let logged_in = token.is_some_and(|token| credentials.set_token(token));
    if !logged_in {
        tracing::warn!("No token given (--token or NOTIFY_TOKEN); staying disconnected");
    }

    spawn_watchers(&client);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    credentials.clear();
    client.shutdown().await;
    tracing::info!(metrics = ?client.metrics(), "Client stopped");

    Ok(())
}

/// Log every observable change. Each watcher is a plain subscriber.
fn spawn_watchers(client: &RealtimeClient) {
    let mut status = client.subscribe_status();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let s = *status.borrow_and_update();
            tracing::info!(
                state = %s.state,
                attempts = s.reconnect_attempts,
                reconnect_pending = s.reconnect_pending,
                retry_exhausted = s.retry_exhausted,
                "Channel status"
            );
        }
    });

    let mut store = client.store().subscribe();
    tokio::spawn(async move {
        let mut last_unread = store.borrow_and_update().unread_count;
        while store.changed().await.is_ok() {
            let snapshot = store.borrow_and_update().clone();
            if snapshot.unread_count != last_unread {
                last_unread = snapshot.unread_count;
                tracing::info!(unread = last_unread, recent = snapshot.recent.len(), "Unread count");
            }
        }
    });

    let mut alerts = client.alerts().subscribe();
    tokio::spawn(async move {
        let mut shown = HashSet::new();
        while alerts.changed().await.is_ok() {
            let now = tokio::time::Instant::now();
            let current = alerts.borrow_and_update().clone();
            shown.retain(|id| current.iter().any(|a| a.id == *id));
            for alert in current.iter().filter(|a| a.is_live_at(now)) {
                if !shown.insert(alert.id) {
                    continue;
                }
                tracing::info!(
                    id = alert.id,
                    title = %alert.notification.title,
                    message = %alert.notification.message,
                    "Alert"
                );
            }
        }
    });

    let mut announcements = client.announcements();
    tokio::spawn(async move {
        loop {
            match announcements.recv().await {
                Ok(a) => tracing::info!(title = %a.title, message = %a.message, "Announcement"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Announcement watcher lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
