//! Query processing and ranking module.
//!
//! This module answers the two questions the abstract explorer asks:
//! which abstracts mention a keyword, and which abstracts are nearest to a
//! given one in embedding space.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rheumai_site::embedding::EmbeddingMatrix;
//! use rheumai_site::ingestion::IngestionPipeline;
//! use rheumai_site::query::{KeywordQuery, ResultLimit};
//!
//! # fn example(abstracts: Vec<rheumai_site::Abstract>, matrix: EmbeddingMatrix)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let (index, _stats) = IngestionPipeline::new(matrix).ingest(abstracts);
//!
//! let matches = index.keyword_search(&KeywordQuery::new("gout", ResultLimit::default()))?;
//! println!("{} abstracts mention gout", matches.total);
//!
//! // Neighbours are sorted by descending cosine similarity
//! for similar in index.similar_to("0001", 5)? {
//!     println!("{} - {:.3}", similar.record.title, similar.score);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{Abstract, SimilarAbstract};

/// Number of neighbours returned when the caller does not say.
pub const DEFAULT_SIMILAR_COUNT: usize = 5;

/// Number of keyword matches shown before "Show All".
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Errors that can occur during query processing.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// No abstract carries the requested number
    #[error("Abstract not found: {0}")]
    NotFound(String),

    /// The abstract exists but has no embedding row
    #[error("Abstract {0} has no embedding")]
    MissingEmbedding(String),

    /// Vectors of different lengths were compared
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Keyword search was called with nothing to search for
    #[error("Empty search query")]
    EmptyQuery,

    /// A result limit could not be parsed
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// How many keyword matches to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLimit {
    /// Show at most this many
    First(usize),
    /// Show every match
    All,
}

impl Default for ResultLimit {
    fn default() -> Self {
        ResultLimit::First(DEFAULT_RESULT_LIMIT)
    }
}

impl FromStr for ResultLimit {
    type Err = QueryError;

    /// Parses `all` (any case) or a positive integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(ResultLimit::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(ResultLimit::First(n)),
            _ => Err(QueryError::InvalidLimit(s.to_string())),
        }
    }
}

impl fmt::Display for ResultLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultLimit::First(n) => write!(f, "{}", n),
            ResultLimit::All => f.write_str("all"),
        }
    }
}

/// Keyword search parameters.
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    /// Search text, matched case-insensitively
    pub text: String,

    /// How many matches to return
    pub limit: ResultLimit,
}

impl KeywordQuery {
    pub fn new(text: impl Into<String>, limit: ResultLimit) -> Self {
        Self {
            text: text.into(),
            limit,
        }
    }
}

/// Outcome of a keyword search.
#[derive(Debug)]
pub struct KeywordMatches<'a> {
    /// Total number of matching abstracts
    pub total: usize,

    /// The matches to display, in source order
    pub shown: Vec<&'a Abstract>,
}

/// Compute cosine similarity between two vectors.
///
/// Ranges from -1 to 1. A zero-magnitude vector has similarity 0.0 with
/// everything.
///
/// # Errors
/// Returns `QueryError::DimensionMismatch` if the vectors differ in length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> QueryResult<f32> {
    if a.len() != b.len() {
        return Err(QueryError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

/// In-memory abstract collection with positional embeddings.
///
/// Built once at startup by the ingestion pipeline and shared read-only.
/// `embeddings[i]` belongs to `abstracts[i]`; abstracts past the end of
/// `embeddings` have none.
#[derive(Debug, Clone, Default)]
pub struct AbstractIndex {
    abstracts: Vec<Abstract>,
    embeddings: Vec<Vec<f32>>,
}

impl AbstractIndex {
    /// Create an index. `embeddings` must not be longer than `abstracts`.
    pub(crate) fn new(abstracts: Vec<Abstract>, mut embeddings: Vec<Vec<f32>>) -> Self {
        embeddings.truncate(abstracts.len());
        Self {
            abstracts,
            embeddings,
        }
    }

    /// All abstracts in source order.
    pub fn abstracts(&self) -> &[Abstract] {
        &self.abstracts
    }

    pub fn len(&self) -> usize {
        self.abstracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abstracts.is_empty()
    }

    /// Number of abstracts that have an embedding.
    pub fn embedded_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Embedding dimension, or 0 when nothing is embedded.
    pub fn dimension(&self) -> usize {
        self.embeddings.first().map(Vec::len).unwrap_or(0)
    }

    fn position(&self, abstract_number: &str) -> Option<usize> {
        self.abstracts
            .iter()
            .position(|a| a.abstract_number == abstract_number)
    }

    /// First abstract with the given number.
    pub fn find(&self, abstract_number: &str) -> Option<&Abstract> {
        self.position(abstract_number).map(|i| &self.abstracts[i])
    }

    /// First abstract with the given slug. Empty slugs never match.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Abstract> {
        if slug.is_empty() {
            return None;
        }
        self.abstracts.iter().find(|a| a.slug == slug)
    }

    /// Case-insensitive substring search over titles and bodies.
    ///
    /// # Errors
    /// Returns `QueryError::EmptyQuery` if the query text is empty
    pub fn keyword_search(&self, query: &KeywordQuery) -> QueryResult<KeywordMatches<'_>> {
        if query.text.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let needle = query.text.to_lowercase();
        let matches: Vec<&Abstract> = self
            .abstracts
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle) || a.body.to_lowercase().contains(&needle)
            })
            .collect();

        let total = matches.len();
        let shown = match query.limit {
            ResultLimit::First(n) => matches.into_iter().take(n).collect(),
            ResultLimit::All => matches,
        };

        Ok(KeywordMatches { total, shown })
    }

    /// Nearest neighbours of an abstract by cosine similarity.
    ///
    /// Every embedded abstract except the target itself is scored; results
    /// are sorted by descending similarity and cut to `top_k`. Rows whose
    /// score is NaN are left out.
    ///
    /// # Errors
    /// Returns `QueryError::NotFound` for an unknown number and
    /// `QueryError::MissingEmbedding` if the target has no embedding row
    pub fn similar_to(&self, abstract_number: &str, top_k: usize) -> QueryResult<Vec<SimilarAbstract>> {
        let target = self
            .position(abstract_number)
            .ok_or_else(|| QueryError::NotFound(abstract_number.to_string()))?;
        let target_embedding = self
            .embeddings
            .get(target)
            .ok_or_else(|| QueryError::MissingEmbedding(abstract_number.to_string()))?;

        let mut scored: Vec<(usize, f32)> = Vec::with_capacity(self.embeddings.len());
        for (i, embedding) in self.embeddings.iter().enumerate() {
            if i == target {
                continue;
            }
            let score = cosine_similarity(target_embedding, embedding)?;
            if !score.is_nan() {
                scored.push((i, score));
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SimilarAbstract::new(self.abstracts[i].clone(), score))
            .collect())
    }
}
