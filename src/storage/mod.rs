//! Content storage abstraction.
//!
//! This module defines the interface for reading the blog and project
//! content the site serves. Content is authored offline and is read-only at
//! serve time; there is no write path.

pub mod fs;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Post, PostContent, Project};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No post or project under the requested key
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Reading from disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for content storage backends.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List all posts, newest first.
    ///
    /// # Errors
    /// Returns `StorageError` if the post directory cannot be read
    async fn list_posts(&self) -> StorageResult<Vec<Post>>;

    /// Load the title and body of a single post.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if no post has this slug
    async fn load_post(&self, slug: &str) -> StorageResult<PostContent>;

    /// All projects in authored order.
    async fn projects(&self) -> StorageResult<Vec<Project>>;

    /// Look up a project by its short link.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if no project uses `internal_link`
    async fn find_project(&self, internal_link: &str) -> StorageResult<Project> {
        self.projects()
            .await?
            .into_iter()
            .find(|p| p.internal_link.as_deref() == Some(internal_link))
            .ok_or_else(|| StorageError::NotFound(format!("project '{}'", internal_link)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticStore(Vec<Project>);

    #[async_trait]
    impl ContentStore for StaticStore {
        async fn list_posts(&self) -> StorageResult<Vec<Post>> {
            Ok(Vec::new())
        }

        async fn load_post(&self, slug: &str) -> StorageResult<PostContent> {
            Err(StorageError::NotFound(slug.to_string()))
        }

        async fn projects(&self) -> StorageResult<Vec<Project>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_find_project_by_internal_link() {
        let store = StaticStore(vec![
            Project {
                name: "No link".to_string(),
                description: String::new(),
                external_link: "https://a".to_string(),
                internal_link: None,
            },
            Project {
                name: "Gout".to_string(),
                description: String::new(),
                external_link: "https://gout.example".to_string(),
                internal_link: Some("gout".to_string()),
            },
        ]);

        assert_eq!(store.find_project("gout").await.unwrap().name, "Gout");
        assert!(matches!(
            store.find_project("missing").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
