//! Flat-file content storage.
//!
//! Posts are markdown files under `posts/`; projects come from
//! `data/projects.json`. The post directory is re-read on every listing so
//! newly published posts show up without a restart. Projects are parsed
//! once and kept in memory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{ContentStore, StorageError, StorageResult};
use crate::models::{Post, PostContent, Project};

/// Filesystem-backed content store.
pub struct FsContentStore {
    /// Directory holding `*.md` posts
    posts_dir: PathBuf,

    /// Path to the projects JSON file
    projects_path: PathBuf,

    projects: OnceCell<Vec<Project>>,
}

impl FsContentStore {
    /// Create a store over explicit paths.
    pub fn new(posts_dir: impl Into<PathBuf>, projects_path: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            projects_path: projects_path.into(),
            projects: OnceCell::new(),
        }
    }

    /// Path of the markdown file for `slug`, or `None` if the slug could
    /// escape the post directory.
    fn post_path(&self, slug: &str) -> Option<PathBuf> {
        let valid = !slug.is_empty()
            && !slug.contains(['/', '\\'])
            && slug != "."
            && slug != ".."
            && !slug.starts_with('.');
        valid.then(|| self.posts_dir.join(format!("{}.md", slug)))
    }

    async fn read_post_header(path: &Path) -> StorageResult<Option<Post>> {
        let slug = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => return Ok(None),
        };

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        let date: DateTime<Local> = metadata.modified()?.into();

        let source = tokio::fs::read_to_string(path).await?;
        let title = source.lines().next().unwrap_or_default().trim().to_string();

        Ok(Some(Post {
            slug,
            title,
            date,
            path: path.to_path_buf(),
        }))
    }

    async fn read_projects(&self) -> StorageResult<Vec<Project>> {
        let text = tokio::fs::read_to_string(&self.projects_path).await?;
        let projects: Vec<Project> = serde_json::from_str(&text).map_err(|e| {
            StorageError::SerializationError(format!(
                "{}: {}",
                self.projects_path.display(),
                e
            ))
        })?;
        debug!("Loaded {} projects", projects.len());
        Ok(projects)
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn list_posts(&self) -> StorageResult<Vec<Post>> {
        let mut entries = match tokio::fs::read_dir(&self.posts_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Post directory {} does not exist", self.posts_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut posts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(post) = Self::read_post_header(&path).await? {
                posts.push(post);
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn load_post(&self, slug: &str) -> StorageResult<PostContent> {
        let path = self
            .post_path(slug)
            .ok_or_else(|| StorageError::NotFound(format!("post '{}'", slug)))?;

        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(PostContent::from_source(&source)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("post '{}'", slug)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn projects(&self) -> StorageResult<Vec<Project>> {
        let projects = self
            .projects
            .get_or_try_init(|| self.read_projects())
            .await?;
        Ok(projects.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn write_post(dir: &Path, name: &str, contents: &str, age_secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    fn store(root: &Path) -> FsContentStore {
        FsContentStore::new(root.join("posts"), root.join("projects.json"))
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let root = tempfile::tempdir().unwrap();
        let posts = root.path().join("posts");
        std::fs::create_dir(&posts).unwrap();
        write_post(&posts, "old.md", "Old Post\nbody", 3600);
        write_post(&posts, "new.md", "  New Post  \nbody", 10);
        write_post(&posts, "notes.txt", "ignored", 0);
        std::fs::create_dir(posts.join("images")).unwrap();

        let listed = store(root.path()).list_posts().await.unwrap();
        let slugs: Vec<&str> = listed.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old"]);
        assert_eq!(listed[0].title, "New Post");
    }

    #[tokio::test]
    async fn test_list_posts_missing_dir_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(store(root.path()).list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_post() {
        let root = tempfile::tempdir().unwrap();
        let posts = root.path().join("posts");
        std::fs::create_dir(&posts).unwrap();
        write_post(&posts, "hello.md", "Hello\n# Heading\ntext", 0);

        let content = store(root.path()).load_post("hello").await.unwrap();
        assert_eq!(content.title, "Hello");
        assert_eq!(content.body, "# Heading\ntext");
    }

    #[tokio::test]
    async fn test_load_post_rejects_traversal_and_missing() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("secret.md"), "secret").unwrap();
        let store = store(root.path());

        for slug in ["", "..", "../secret", ".hidden", "missing"] {
            assert!(
                matches!(store.load_post(slug).await, Err(StorageError::NotFound(_))),
                "slug {:?} should be not found",
                slug
            );
        }
    }

    #[tokio::test]
    async fn test_projects_loaded_once() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("projects.json");
        std::fs::write(
            &path,
            r#"[{"name":"Gout","description":"d","external_link":"https://g","internal_link":"gout"}]"#,
        )
        .unwrap();
        let store = store(root.path());

        assert_eq!(store.projects().await.unwrap().len(), 1);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(store.find_project("gout").await.unwrap().external_link, "https://g");
    }

    #[tokio::test]
    async fn test_projects_bad_json() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("projects.json"), "{not json").unwrap();
        assert!(matches!(
            store(root.path()).projects().await,
            Err(StorageError::SerializationError(_))
        ));
    }
}
