//! HTTP server module.
//!
//! Serves the site over axum. Each group of pages lives in its own endpoint
//! module and contributes a router that is merged here:
//! - `site_endpoints`: home, blog, posts, projects and project short links
//! - `conference_endpoints`: the conference abstract explorer, merged only
//!   when the explorer is enabled
//!
//! Static assets (`/static`, `/media`, `/posts/images`, the conference data
//! directory and `/favicon.ico`) are served straight from the content root.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{SiteConfig, SiteIdentity};
use crate::ingestion::{load_conference, ConferenceData};
use crate::storage::{fs::FsContentStore, ContentStore};

mod conference_endpoints;
mod http_error;
mod site_endpoints;

pub use http_error::HttpError;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Content or conference data could not be loaded
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// Listener could not bind to the configured address
    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop terminated with an I/O error
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum number of requests handled at once
    pub max_concurrent_requests: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            max_concurrent_requests: 100,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loaded conference data plus the settings the explorer needs per request.
#[derive(Debug)]
pub struct ConferenceState {
    pub data: ConferenceData,

    /// Number of neighbours returned by "find similar"
    pub similar_count: usize,

    /// URL prefix the data directory is served under, e.g. `/data/acr/2024`
    pub data_url: String,
}

/// Application state shared across all endpoints.
///
/// Conference data is read once at startup and shared read-only. The
/// content store re-lists posts per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub site: Arc<SiteIdentity>,
    pub conference: Option<Arc<ConferenceState>>,
}

impl AppState {
    /// Build state from a content store and optional conference data.
    pub fn new(
        store: Arc<dyn ContentStore>,
        site: SiteIdentity,
        conference: Option<ConferenceState>,
    ) -> Self {
        Self {
            store,
            site: Arc::new(site),
            conference: conference.map(Arc::new),
        }
    }

    /// Load everything the site needs from the content root.
    ///
    /// # Errors
    /// Returns `ServerError::InitializationError` if the conference explorer
    /// is enabled and its data cannot be loaded
    pub async fn load(config: &SiteConfig) -> ServerResult<Self> {
        let store = FsContentStore::new(config.posts_dir(), config.projects_path());

        let conference = match (&config.conference, config.conference_dir()) {
            (Some(conference), Some(dir)) => {
                let (data, _stats) = load_conference(&dir).await.map_err(|e| {
                    ServerError::InitializationError(format!(
                        "conference data in {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                Some(ConferenceState {
                    data,
                    similar_count: conference.similar_count,
                    data_url: data_url(&conference.data_path),
                })
            }
            _ => None,
        };

        Ok(Self::new(Arc::new(store), config.site.clone(), conference))
    }

    /// Whether the conference explorer is served.
    pub fn conference_enabled(&self) -> bool {
        self.conference.is_some()
    }
}

fn data_url(data_path: &str) -> String {
    format!("/{}", data_path.trim_matches('/'))
}

/// Create the application router.
///
/// Endpoint modules are merged first, then static directories are mounted,
/// then tracing, timeout and concurrency layers wrap everything.
pub fn create_router(state: AppState, config: &SiteConfig) -> Router {
    let mut router = Router::new()
        .merge(site_endpoints::routes())
        .route_service("/favicon.ico", ServeFile::new(config.favicon_path()))
        .nest_service("/static", ServeDir::new(config.static_dir()))
        .nest_service("/media", ServeDir::new(config.media_dir()))
        .nest_service("/posts/images", ServeDir::new(config.post_images_dir()));

    if let (Some(conference), Some(dir)) = (&state.conference, config.conference_dir()) {
        router = router
            .merge(conference_endpoints::routes())
            .nest_service(&conference.data_url, ServeDir::new(dir));
    }

    router
        .layer(GlobalConcurrencyLimitLayer::new(
            config.server.max_concurrent_requests,
        ))
        .layer(timeout_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Requests running past the configured timeout answer 408.
fn timeout_layer(config: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    )
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
/// Returns `ServerError::BindError` if the address is unavailable, or
/// `ServerError::Io` if the server loop fails
pub async fn serve(state: AppState, config: &SiteConfig) -> ServerResult<()> {
    let app = create_router(state, config);

    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::BindError {
            addr: addr.clone(),
            source,
        })?;
    info!("Serving on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
