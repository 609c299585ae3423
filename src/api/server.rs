use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    services::{generate_qr, health},
    state::AppState,
};
use crate::config::{Config, CorsConfig};
use crate::publisher::{GitHubStore, MemoryStore, RemoteStore};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Start-up options gathered from the command line
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Overrides `server.bind_addr`
    pub address: Option<SocketAddr>,
    /// TOML file to load instead of the default location
    pub config_path: Option<PathBuf>,
    /// Keep images in process memory instead of committing them to GitHub
    pub in_memory_store: bool,
}

pub async fn run(options: ServeOptions) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load_with(options.config_path)
        .map_err(|e| format!("Failed to load config: {}", e))?;

    let (store, store_kind): (Arc<dyn RemoteStore>, &'static str) = if options.in_memory_store {
        warn!("Using in-memory store; published URLs will not resolve");
        (Arc::new(MemoryStore::new()), "memory")
    } else {
        let store = GitHubStore::from_config(&config.github)
            .map_err(|e| format!("Failed to configure GitHub store: {}", e))?;
        info!(
            owner = %config.github.owner,
            repo = %config.github.repo,
            branch = %config.github.branch,
            "Publishing to GitHub"
        );
        (Arc::new(store), "github")
    };

    let address = options.address.unwrap_or(config.server.bind_addr);
    let state = AppState::new(config, store, store_kind);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "qrpages API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Routes and middleware of the public API
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/generate-qr/", post(generate_qr))
        .route("/generate-qr", post(generate_qr))
        .route("/health", get(health))
        .with_state(state)
        .layer(RequestDecompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
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
