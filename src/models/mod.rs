//! Core data models for the site.
//!
//! This module contains the records read from the content directory (blog
//! posts, projects, conference abstracts and topic summaries) and the
//! result types produced by the similarity lookup.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

/// A blog post as shown on the listing page.
///
/// Posts live as markdown files under `posts/`. The file stem is the slug,
/// the first line is the title and the file modification time is the date.
#[derive(Debug, Clone)]
pub struct Post {
    /// URL slug (file stem of the markdown file)
    pub slug: String,

    /// Title taken from the first line of the file
    pub title: String,

    /// Last modification time of the file
    pub date: DateTime<Local>,

    /// Location of the markdown file
    pub path: PathBuf,
}

impl Post {
    /// Date formatted the way the blog listing shows it.
    pub fn display_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Title and markdown body of a single post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub title: String,
    pub body: String,
}

impl PostContent {
    /// Split raw file text into title (first line, trimmed) and body.
    pub fn from_source(source: &str) -> Self {
        let (title, body) = match source.split_once('\n') {
            Some((first, rest)) => (first, rest),
            None => (source, ""),
        };

        Self {
            title: title.trim().to_string(),
            body: body.to_string(),
        }
    }

    /// Point relative image links at the mounted post image directory.
    ///
    /// Both `](images/...)` and `](/images/...)` become
    /// `](/posts/images/...)`.
    pub fn rewrite_image_paths(&mut self) {
        self.body = self
            .body
            .replace("](images/", "](/posts/images/")
            .replace("](/images/", "](/posts/images/");
    }
}

/// A project entry from `data/projects.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Display name
    pub name: String,

    /// Short description shown on the projects page
    pub description: String,

    /// Where the "Visit Project" button and the short link point
    pub external_link: String,

    /// Short link path segment, e.g. `gout` for `/gout`
    #[serde(default)]
    pub internal_link: Option<String>,
}

/// A conference abstract record from `abstracts.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Abstract {
    /// Slug shared with a blog post about the abstract, if any
    #[serde(default)]
    pub slug: String,

    /// Conference abstract number, used as the lookup key
    #[serde(deserialize_with = "string_or_number")]
    pub abstract_number: String,

    /// Abstract title
    pub title: String,

    /// Abstract text (markdown-ish, with section headings)
    #[serde(rename = "abstract", default)]
    pub body: String,

    /// Link to the abstract on the conference site
    #[serde(default)]
    pub link: String,

    /// Conference topic / session category
    #[serde(default)]
    pub topic: String,
}

impl Abstract {
    /// Demote the section headings the scraper emitted as markdown headers.
    pub fn clean_headings(&mut self) {
        self.body = self
            .body
            .replace("## Background/Purpose\n", "Background/Purpose\n")
            .replace("## Methods\n", "Methods\n");
    }

    /// First `chars` characters of the body followed by `...`.
    pub fn excerpt(&self, chars: usize) -> String {
        let mut out: String = self.body.chars().take(chars).collect();
        out.push_str("...");
        out
    }
}

/// Accept `"1234"` or `1234` for the abstract number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

/// An AI-generated summary for one conference topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicSummary {
    pub topic: String,
    /// Markdown text
    pub summary: String,
}

/// Relevance classification for similarity results.
///
/// Neighbours are bucketed by cosine similarity so the page can show a
/// coarse label next to each one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelevanceLevel {
    /// Cosine similarity > 0.95
    Identical,

    /// Cosine similarity > 0.85
    HighlySimilar,

    /// Cosine similarity > 0.70
    Similar,

    /// Anything lower
    Relevant,
}

impl RelevanceLevel {
    /// Determine relevance level from a cosine similarity score.
    pub fn from_score(score: f32) -> Self {
        if score > 0.95 {
            RelevanceLevel::Identical
        } else if score > 0.85 {
            RelevanceLevel::HighlySimilar
        } else if score > 0.70 {
            RelevanceLevel::Similar
        } else {
            RelevanceLevel::Relevant
        }
    }

    /// Lowercase label used in CSS classes and the UI.
    pub fn label(&self) -> &'static str {
        match self {
            RelevanceLevel::Identical => "identical",
            RelevanceLevel::HighlySimilar => "highly similar",
            RelevanceLevel::Similar => "similar",
            RelevanceLevel::Relevant => "relevant",
        }
    }
}

impl fmt::Display for RelevanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One neighbour returned by a "find similar" lookup.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarAbstract {
    /// The neighbouring abstract
    #[serde(rename = "abstract")]
    pub record: Abstract,

    /// Cosine similarity to the target abstract
    pub score: f32,

    /// Bucketed relevance of `score`
    pub relevance: RelevanceLevel,
}

impl SimilarAbstract {
    /// Create a result from a record and its similarity score.
    pub fn new(record: Abstract, score: f32) -> Self {
        Self {
            record,
            score,
            relevance: RelevanceLevel::from_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_level_from_score() {
        assert_eq!(RelevanceLevel::from_score(0.96), RelevanceLevel::Identical);
        assert_eq!(RelevanceLevel::from_score(0.90), RelevanceLevel::HighlySimilar);
        assert_eq!(RelevanceLevel::from_score(0.75), RelevanceLevel::Similar);
        assert_eq!(RelevanceLevel::from_score(0.60), RelevanceLevel::Relevant);
        assert_eq!(RelevanceLevel::from_score(-0.2), RelevanceLevel::Relevant);
    }

    #[test]
    fn test_post_content_split() {
        let content = PostContent::from_source("  My Title  \nFirst line\nSecond line\n");
        assert_eq!(content.title, "My Title");
        assert_eq!(content.body, "First line\nSecond line\n");

        let title_only = PostContent::from_source("Only a title");
        assert_eq!(title_only.title, "Only a title");
        assert_eq!(title_only.body, "");
    }

    #[test]
    fn test_rewrite_image_paths() {
        let mut content = PostContent {
            title: "t".to_string(),
            body: "![a](images/a.png) ![b](/images/b.png) ![c](https://x/images/c.png)"
                .to_string(),
        };
        content.rewrite_image_paths();
        assert_eq!(
            content.body,
            "![a](/posts/images/a.png) ![b](/posts/images/b.png) ![c](https://x/images/c.png)"
        );
    }

    #[test]
    fn test_abstract_deserialize_number_forms() {
        let text: Abstract = serde_json::from_str(
            r#"{"slug":"s","abstract_number":"0123","title":"T","abstract":"A","link":"L","topic":"X"}"#,
        )
        .unwrap();
        assert_eq!(text.abstract_number, "0123");
        assert_eq!(text.body, "A");

        let number: Abstract =
            serde_json::from_str(r#"{"abstract_number":42,"title":"T"}"#).unwrap();
        assert_eq!(number.abstract_number, "42");
        assert_eq!(number.body, "");
        assert_eq!(number.slug, "");
    }

    #[test]
    fn test_clean_headings() {
        let mut record: Abstract = serde_json::from_str(
            r###"{"abstract_number":"1","title":"T","abstract":"## Background/Purpose\nWhy\n## Methods\nHow\n## Results\nWhat"}"###,
        )
        .unwrap();
        record.clean_headings();
        assert_eq!(record.body, "Background/Purpose\nWhy\nMethods\nHow\n## Results\nWhat");
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let record = Abstract {
            slug: String::new(),
            abstract_number: "1".to_string(),
            title: "T".to_string(),
            body: "ééééé".to_string(),
            link: String::new(),
            topic: String::new(),
        };
        assert_eq!(record.excerpt(3), "ééé...");
        assert_eq!(record.excerpt(300), "ééééé...");
    }
}
