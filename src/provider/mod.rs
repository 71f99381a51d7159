//! Conference data provider module.
//!
//! This module defines the interface for sourcing conference abstracts and
//! topic summaries. The `AbstractProvider` trait keeps the ingestion step
//! independent of where the records come from.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Abstract, TopicSummary};

pub mod json;

/// Errors that can occur when reading conference records.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for sourcing conference abstracts and summaries.
///
/// # Design Notes
///
/// - Records are returned in source order; embedding rows are matched to
///   abstracts by position, so implementations must not reorder them
/// - Providers apply record-level cleanup (heading normalisation) themselves
#[async_trait]
pub trait AbstractProvider: Send + Sync {
    /// Fetch all abstracts in source order.
    ///
    /// # Errors
    /// Returns `ProviderError` if the records cannot be read or parsed
    async fn fetch_abstracts(&self) -> ProviderResult<Vec<Abstract>>;

    /// Fetch at most `limit` abstracts, useful for testing.
    async fn fetch_abstracts_limit(&self, limit: usize) -> ProviderResult<Vec<Abstract>> {
        let all = self.fetch_abstracts().await?;
        Ok(all.into_iter().take(limit).collect())
    }

    /// Fetch topic summaries in their authored order.
    ///
    /// # Errors
    /// Returns `ProviderError` if the summaries cannot be read or parsed
    async fn fetch_summaries(&self) -> ProviderResult<Vec<TopicSummary>>;

    /// Human-readable name of this provider, for logging.
    fn name(&self) -> &str;
}
