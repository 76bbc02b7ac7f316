//! `sweeparr serve`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::Result;
use crate::reload::{ConfigStore, ConfigWatchHandle, DEFAULT_POLL_INTERVAL};
use crate::server::{self, AppState};
use crate::sonarr::SonarrLibraryManager;
use crate::storage::WatchedStore;

/// Everything `serve` needs before accepting connections
pub struct Startup {
    pub listener: TcpListener,
    pub state: Arc<AppState>,
    pub watch: ConfigWatchHandle,
}

/// Load the config, open the store, bind the listener, and start the watcher
///
/// A missing or invalid config file is not fatal: the server starts with the
/// default configuration and the watcher applies the file once it appears or
/// becomes valid.
pub async fn start(
    config_path: PathBuf,
    db_path: PathBuf,
    bind: &str,
    poll_interval: Duration,
) -> Result<Startup> {
    let config = Arc::new(ConfigStore::new(config_path));
    let loader = Arc::clone(&config);
    if !tokio::task::spawn_blocking(move || loader.load()).await? {
        warn!(
            "Starting with the default configuration; waiting for {} to become loadable",
            config.path().display()
        );
    }

    let store = tokio::task::spawn_blocking(move || WatchedStore::new(db_path)).await??;
    info!(db = %store.path().display(), "Watched-event store ready");

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on {}", listener.local_addr()?);

    let watch = config.watch_with_interval(poll_interval);
    let http = reqwest::Client::builder()
        .user_agent(concat!("sweeparr/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let state = Arc::new(AppState::new(
        config,
        store,
        Arc::new(SonarrLibraryManager::with_client(http)),
    ));

    Ok(Startup {
        listener,
        state,
        watch,
    })
}

/// Run the webhook server until Ctrl-C or SIGTERM
pub async fn run_serve(config_path: PathBuf, db_path: PathBuf, bind: &str) -> Result<()> {
    let Startup {
        listener,
        state,
        watch,
    } = start(config_path, db_path, bind, DEFAULT_POLL_INTERVAL).await?;

    let served = server::serve(listener, state, shutdown_signal()).await;

    info!("Stopping config watcher");
    if let Err(e) = watch.stop().await {
        warn!("Config watcher did not stop cleanly: {:#}", e);
    }

    served
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_dir;
    use serial_test::serial;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[serial]
    async fn test_start_without_config_uses_defaults_then_picks_up_file() {
        let dir = temp_dir();
        let config_path = dir.path().join("config.json");

        let startup = start(
            config_path.clone(),
            dir.path().join("watched.db"),
            "127.0.0.1:0",
            Duration::from_millis(20),
        )
        .await
        .expect("serve starts without a config file");

        assert!(startup.listener.local_addr().is_ok());
        assert_eq!(startup.state.config.get().grace_days, Some(2));

        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::write(&config_path, r#"{"grace_days": 0}"#).unwrap();

        let mut applied = false;
        for _ in 0..100 {
            if startup.state.config.get().grace_days == Some(0) {
                applied = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        startup.watch.stop().await.unwrap();
        assert!(applied, "config written after startup was never applied");
    }

    #[tokio::test]
    #[serial]
    async fn test_start_with_invalid_config_keeps_defaults() {
        let dir = temp_dir();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"grace_days": "#).unwrap();

        let startup = start(
            config_path,
            dir.path().join("watched.db"),
            "127.0.0.1:0",
            Duration::from_millis(20),
        )
        .await
        .unwrap();

        assert_eq!(*startup.state.config.get(), crate::config::Config::default());
        startup.watch.stop().await.unwrap();
    }
}
