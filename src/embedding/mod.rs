//! Precomputed embedding storage.
//!
//! The abstract embeddings are produced offline by an external pipeline and
//! shipped as a NumPy `.npy` matrix with one row per abstract. This module
//! holds the in-memory matrix type and the `.npy` reader.

pub mod npy;

use thiserror::Error;

/// Errors that can occur while loading embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding file could not be read
    #[error("Failed to read embeddings: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a NumPy array file
    #[error("Invalid .npy file: {0}")]
    InvalidFormat(String),

    /// The array uses a layout or dtype this reader does not handle
    #[error("Unsupported .npy content: {0}")]
    Unsupported(String),

    /// Fewer data bytes than the header promises
    #[error("Truncated .npy data: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// Rows handed to the matrix disagree on their length
    #[error("Embedding shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Dense row-major matrix of `f32` embeddings.
///
/// Row `i` is the embedding of abstract `i` in `abstracts.jsonl`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dimension: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Wrap a flat buffer of `rows * dimension` values.
    ///
    /// # Errors
    /// Returns `EmbeddingError::ShapeMismatch` if the buffer length does not
    /// equal `rows * dimension`
    pub fn new(rows: usize, dimension: usize, data: Vec<f32>) -> EmbeddingResult<Self> {
        if rows.checked_mul(dimension) != Some(data.len()) {
            return Err(EmbeddingError::ShapeMismatch(format!(
                "{} values cannot form a {}x{} matrix",
                data.len(),
                rows,
                dimension
            )));
        }

        Ok(Self {
            rows,
            dimension,
            data,
        })
    }

    /// Build a matrix from individual rows, all of the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> EmbeddingResult<Self> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        let count = rows.len();
        let mut data = Vec::with_capacity(count * dimension);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dimension {
                return Err(EmbeddingError::ShapeMismatch(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }
            data.extend(row);
        }

        Self::new(count, dimension, data)
    }

    /// Number of rows (embedded abstracts).
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Length of each embedding vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Borrow row `index`, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Iterate over all rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_rows() {
        let matrix = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.dimension(), 2);
        assert_eq!(matrix.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(matrix.row(2), None);
        assert_eq!(matrix.iter().count(), 2);
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let result = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(EmbeddingError::ShapeMismatch(_))));
    }

    #[test]
    fn test_matrix_rejects_wrong_buffer_length() {
        assert!(EmbeddingMatrix::new(2, 3, vec![0.0; 5]).is_err());
        assert!(EmbeddingMatrix::new(0, 3, Vec::new()).unwrap().is_empty());
    }
}
