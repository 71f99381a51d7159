//! RheumAI site - a personal website with a blog, a projects page and a
//! conference abstract explorer.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: Core data structures (Post, Project, Abstract, SimilarAbstract, etc.)
//! - **embedding**: Precomputed embedding matrix and its `.npy` loader
//! - **provider**: Abstract and topic summary sources (JSON Lines files)
//! - **ingestion**: Pairs abstracts with embedding rows at startup
//! - **query**: Keyword search and cosine-similarity ranking
//! - **storage**: Posts and projects on disk
//! - **views**: HTML pages and htmx fragments
//! - **server**: axum router, handlers and static file serving
//! - **config**: Deployment configuration
//!
//! # Workflow
//!
//! ## Startup
//!
//! 1. Build a [`SiteConfig`] from flags and environment
//! 2. Load abstracts, topic summaries and the embedding matrix
//! 3. Pair abstracts with embedding rows by position
//!
//! ## Per request
//!
//! 1. Posts are listed and read from disk
//! 2. Keyword search scans titles and abstract text
//! 3. "Find similar" ranks all abstracts by cosine similarity to the target
//!
//! # Example
//!
//! ```ignore
//! use rheumai_site::{server, SiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SiteConfig::with_root("/srv/rheumai");
//!     let state = server::AppState::load(&config).await?;
//!     server::serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod ingestion;
pub mod models;
pub mod provider;
pub mod query;
pub mod server;
pub mod storage;
pub mod views;

// Re-export commonly used types at the crate root
pub use config::{ConferenceConfig, SiteConfig, SiteIdentity};
pub use embedding::EmbeddingMatrix;
pub use models::{Abstract, Post, PostContent, Project, RelevanceLevel, SimilarAbstract, TopicSummary};
pub use provider::AbstractProvider;
pub use query::{AbstractIndex, KeywordQuery, ResultLimit};
pub use storage::ContentStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
