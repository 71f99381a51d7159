//! Site configuration.
//!
//! A single [`SiteConfig`] describes one deployment of the site: where the
//! content lives, who the site is for, whether the conference explorer is
//! enabled and how the HTTP server is tuned. The binaries build it from
//! command-line flags with environment fallbacks.

use std::path::{Path, PathBuf};

use crate::server::ServerConfig;

/// Identity shown on the home page and in page titles.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteIdentity {
    /// Short brand used in `<title>` (e.g. "RheumAI")
    pub brand: String,

    /// Name in the home page heading
    pub owner: String,

    /// First line under the name
    pub tagline: String,

    /// Second line under the name
    pub mission: String,
}

impl Default for SiteIdentity {
    fn default() -> Self {
        Self {
            brand: "RheumAI".to_string(),
            owner: "Dr. Chris McMaster".to_string(),
            tagline: "Rheumatologist and Data Scientist".to_string(),
            mission: "Using AI to improve healthcare".to_string(),
        }
    }
}

/// Conference explorer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConferenceConfig {
    /// Data directory relative to the content root, also its URL mount
    pub data_path: String,

    /// Number of neighbours shown by "find similar"
    pub similar_count: usize,
}

impl Default for ConferenceConfig {
    fn default() -> Self {
        Self {
            data_path: "data/acr/2024".to_string(),
            similar_count: crate::query::DEFAULT_SIMILAR_COUNT,
        }
    }
}

/// Complete configuration for one site deployment.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory holding `posts/`, `static/`, `media/` and `data/`
    pub content_root: PathBuf,

    /// Names shown on the pages
    pub site: SiteIdentity,

    /// `None` disables the conference explorer entirely
    pub conference: Option<ConferenceConfig>,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            site: SiteIdentity::default(),
            conference: Some(ConferenceConfig::default()),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Configuration rooted at `content_root` with default settings.
    pub fn with_root(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            ..Self::default()
        }
    }

    fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.content_root.join(path)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.join("posts")
    }

    pub fn post_images_dir(&self) -> PathBuf {
        self.join("posts/images")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.join("static")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.join("media")
    }

    pub fn favicon_path(&self) -> PathBuf {
        self.join("static/favicon.ico")
    }

    pub fn projects_path(&self) -> PathBuf {
        self.join("data/projects.json")
    }

    /// Conference data directory, if the explorer is enabled.
    pub fn conference_dir(&self) -> Option<PathBuf> {
        self.conference.as_ref().map(|c| self.join(&c.data_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = SiteConfig::with_root("/srv/site");
        assert_eq!(config.posts_dir(), PathBuf::from("/srv/site/posts"));
        assert_eq!(config.post_images_dir(), PathBuf::from("/srv/site/posts/images"));
        assert_eq!(config.projects_path(), PathBuf::from("/srv/site/data/projects.json"));
        assert_eq!(config.favicon_path(), PathBuf::from("/srv/site/static/favicon.ico"));
        assert_eq!(
            config.conference_dir(),
            Some(PathBuf::from("/srv/site/data/acr/2024"))
        );
        assert_eq!(config.site.brand, "RheumAI");
    }

    #[test]
    fn test_conference_disabled() {
        let config = SiteConfig {
            conference: None,
            ..SiteConfig::default()
        };
        assert_eq!(config.conference_dir(), None);
    }
}
