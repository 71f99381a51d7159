//! Startup ingestion of conference data.
//!
//! This module pairs the abstract records with the rows of the precomputed
//! embedding matrix and builds the read-only [`AbstractIndex`] the explorer
//! queries.
//!
//! # Usage
//!
//! ```ignore
//! use rheumai_site::ingestion::load_conference;
//!
//! let (conference, stats) = load_conference("data/acr/2024").await?;
//! println!("{} of {} abstracts embedded", stats.with_embedding, stats.total);
//! ```
//!
//! Pairing is positional: abstract `i` receives row `i`. The pipeline does
//! not fail when the counts disagree. Abstracts without a row stay
//! searchable but have no neighbours, and surplus rows are dropped. Both
//! cases are counted in [`IngestionStats`] and logged.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::{npy, EmbeddingError, EmbeddingMatrix};
use crate::models::{Abstract, TopicSummary};
use crate::provider::json::JsonlAbstractProvider;
use crate::provider::{AbstractProvider, ProviderError};
use crate::query::AbstractIndex;

/// File name of the embedding matrix inside a conference directory.
pub const EMBEDDINGS_FILE: &str = "embeddings.npy";

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Embedding matrix could not be loaded
    #[error("Embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    /// Provider operation failed
    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),
}

/// Result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Statistics from an ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionStats {
    /// Total number of abstracts read
    pub total: usize,

    /// Abstracts paired with an embedding row
    pub with_embedding: usize,

    /// Abstracts past the end of the embedding matrix
    pub without_embedding: usize,

    /// Embedding rows with no abstract to pair with
    pub surplus_embeddings: usize,

    /// Abstracts whose number was already taken by an earlier record
    pub duplicate_numbers: usize,

    /// Embedding dimension (0 when the matrix is empty)
    pub dimension: usize,
}

impl IngestionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether abstracts and embedding rows lined up one-to-one.
    pub fn is_aligned(&self) -> bool {
        self.without_embedding == 0 && self.surplus_embeddings == 0
    }
}

/// Everything the explorer serves for one conference.
#[derive(Debug, Clone, Default)]
pub struct ConferenceData {
    /// Abstracts with their embeddings
    pub index: AbstractIndex,

    /// AI-generated topic summaries, in authored order
    pub summaries: Vec<TopicSummary>,
}

/// Ingestion pipeline coordinator.
///
/// Holds the embedding matrix and pairs it with abstract records.
pub struct IngestionPipeline {
    embeddings: EmbeddingMatrix,
}

impl IngestionPipeline {
    /// Create a pipeline over a loaded embedding matrix.
    pub fn new(embeddings: EmbeddingMatrix) -> Self {
        Self { embeddings }
    }

    /// Load the matrix from an `.npy` file and create a pipeline.
    ///
    /// # Errors
    /// Returns `IngestionError::EmbeddingError` if the file cannot be read
    /// or parsed
    pub async fn from_npy(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let embeddings = npy::load(path).await?;
        Ok(Self::new(embeddings))
    }

    /// Pair abstracts with embedding rows and build the index.
    pub fn ingest(&self, abstracts: Vec<Abstract>) -> (AbstractIndex, IngestionStats) {
        let mut stats = IngestionStats::new();
        stats.total = abstracts.len();
        stats.dimension = self.embeddings.dimension();

        let paired = abstracts.len().min(self.embeddings.len());
        stats.with_embedding = paired;
        stats.without_embedding = abstracts.len() - paired;
        stats.surplus_embeddings = self.embeddings.len() - paired;

        let mut seen = HashSet::new();
        for record in &abstracts {
            if !seen.insert(record.abstract_number.as_str()) {
                stats.duplicate_numbers += 1;
            }
        }

        if stats.without_embedding > 0 {
            warn!(
                "{} abstracts have no embedding row and will have no similar results",
                stats.without_embedding
            );
        }
        if stats.surplus_embeddings > 0 {
            warn!(
                "{} embedding rows have no matching abstract and are ignored",
                stats.surplus_embeddings
            );
        }
        if stats.duplicate_numbers > 0 {
            warn!(
                "{} abstracts reuse an earlier abstract number; lookups return the first",
                stats.duplicate_numbers
            );
        }

        let rows = self
            .embeddings
            .iter()
            .take(paired)
            .map(<[f32]>::to_vec)
            .collect();

        (AbstractIndex::new(abstracts, rows), stats)
    }

    /// Fetch abstracts from a provider and ingest them.
    ///
    /// # Errors
    /// Returns `IngestionError::ProviderError` if the provider fails
    pub async fn ingest_from_provider<P>(
        &self,
        provider: &P,
    ) -> IngestionResult<(AbstractIndex, IngestionStats)>
    where
        P: AbstractProvider + ?Sized,
    {
        let abstracts = provider.fetch_abstracts().await?;
        info!("Fetched {} abstracts from {}", abstracts.len(), provider.name());
        Ok(self.ingest(abstracts))
    }
}

/// Load abstracts, summaries and embeddings from a conference directory.
///
/// # Errors
/// Returns `IngestionError` if any of the three files is missing or malformed
pub async fn load_conference(
    dir: impl AsRef<Path>,
) -> IngestionResult<(ConferenceData, IngestionStats)> {
    let dir = dir.as_ref();
    let provider = JsonlAbstractProvider::from_dir(dir);
    let pipeline = IngestionPipeline::from_npy(dir.join(EMBEDDINGS_FILE)).await?;

    let (index, stats) = pipeline.ingest_from_provider(&provider).await?;
    let summaries = provider.fetch_summaries().await?;

    info!(
        "Loaded {} abstracts ({} embedded, dimension {}) and {} topic summaries from {}",
        stats.total,
        stats.with_embedding,
        stats.dimension,
        summaries.len(),
        dir.display()
    );

    Ok((ConferenceData { index, summaries }, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::npy::tests::npy_bytes;
    use crate::provider::ProviderResult;
    use async_trait::async_trait;

    struct MockProvider {
        abstracts: Vec<Abstract>,
        should_fail: bool,
    }

    impl MockProvider {
        fn new(abstracts: Vec<Abstract>) -> Self {
            Self {
                abstracts,
                should_fail: false,
            }
        }

        fn with_failure() -> Self {
            Self {
                abstracts: Vec::new(),
                should_fail: true,
            }
        }
    }

    #[async_trait]
    impl AbstractProvider for MockProvider {
        async fn fetch_abstracts(&self) -> ProviderResult<Vec<Abstract>> {
            if self.should_fail {
                return Err(ProviderError::ParseError("mock failure".to_string()));
            }
            Ok(self.abstracts.clone())
        }

        async fn fetch_summaries(&self) -> ProviderResult<Vec<TopicSummary>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn create_test_abstract(number: &str) -> Abstract {
        Abstract {
            slug: String::new(),
            abstract_number: number.to_string(),
            title: format!("Abstract {}", number),
            body: String::new(),
            link: String::new(),
            topic: String::new(),
        }
    }

    fn matrix(rows: usize) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows((0..rows).map(|i| vec![i as f32, 1.0]).collect()).unwrap()
    }

    #[test]
    fn test_ingest_aligned() {
        let pipeline = IngestionPipeline::new(matrix(2));
        let (index, stats) =
            pipeline.ingest(vec![create_test_abstract("1"), create_test_abstract("2")]);

        assert!(stats.is_aligned());
        assert_eq!(stats.with_embedding, 2);
        assert_eq!(stats.dimension, 2);
        assert_eq!(index.embedded_count(), 2);
        assert_eq!(index.similar_to("1", 5).unwrap().len(), 1);
    }

    #[test]
    fn test_ingest_more_abstracts_than_rows() {
        let pipeline = IngestionPipeline::new(matrix(1));
        let (index, stats) =
            pipeline.ingest(vec![create_test_abstract("1"), create_test_abstract("2")]);

        assert_eq!(stats.with_embedding, 1);
        assert_eq!(stats.without_embedding, 1);
        assert!(!stats.is_aligned());
        assert_eq!(index.len(), 2);
        assert!(index.similar_to("2", 5).is_err());
    }

    #[test]
    fn test_ingest_surplus_rows() {
        let pipeline = IngestionPipeline::new(matrix(3));
        let (index, stats) = pipeline.ingest(vec![create_test_abstract("1")]);

        assert_eq!(stats.surplus_embeddings, 2);
        assert_eq!(index.embedded_count(), 1);
        assert!(index.similar_to("1", 5).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_counts_duplicates() {
        let pipeline = IngestionPipeline::new(matrix(3));
        let (_, stats) = pipeline.ingest(vec![
            create_test_abstract("1"),
            create_test_abstract("1"),
            create_test_abstract("2"),
        ]);
        assert_eq!(stats.duplicate_numbers, 1);
    }

    #[tokio::test]
    async fn test_ingest_from_provider() {
        let pipeline = IngestionPipeline::new(matrix(2));
        let provider = MockProvider::new(vec![create_test_abstract("1"), create_test_abstract("2")]);
        let (index, stats) = pipeline.ingest_from_provider(&provider).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(stats.total, 2);
    }

    #[tokio::test]
    async fn test_provider_error_propagation() {
        let pipeline = IngestionPipeline::new(matrix(0));
        let result = pipeline
            .ingest_from_provider(&MockProvider::with_failure())
            .await;
        assert!(matches!(result, Err(IngestionError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_load_conference_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("abstracts.jsonl"),
            "{\"abstract_number\":\"1\",\"title\":\"A\"}\n{\"abstract_number\":\"2\",\"title\":\"B\"}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("summaries.json"), r#"{"Gout":"text"}"#).unwrap();
        std::fs::write(
            dir.path().join(EMBEDDINGS_FILE),
            npy_bytes(&[vec![1.0, 0.0], vec![0.0, 1.0]]),
        )
        .unwrap();

        let (conference, stats) = load_conference(dir.path()).await.unwrap();
        assert!(stats.is_aligned());
        assert_eq!(conference.index.len(), 2);
        assert_eq!(conference.summaries.len(), 1);
    }

    #[tokio::test]
    async fn test_load_conference_missing_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_conference(dir.path()).await;
        assert!(matches!(result, Err(IngestionError::EmbeddingError(_))));
    }
}
