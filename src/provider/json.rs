//! JSON Lines abstract provider.
//!
//! Reads `abstracts.jsonl` (one abstract object per line) and
//! `summaries.json` (an object mapping topic to markdown summary) from a
//! conference data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::{AbstractProvider, ProviderError, ProviderResult};
use crate::models::{Abstract, TopicSummary};

/// File name of the abstract records inside a conference directory.
pub const ABSTRACTS_FILE: &str = "abstracts.jsonl";

/// File name of the topic summaries inside a conference directory.
pub const SUMMARIES_FILE: &str = "summaries.json";

/// Provider backed by the JSON files of one conference directory.
#[derive(Debug, Clone)]
pub struct JsonlAbstractProvider {
    abstracts_path: PathBuf,
    summaries_path: PathBuf,
    name: String,
}

impl JsonlAbstractProvider {
    /// Create a provider over `dir/abstracts.jsonl` and `dir/summaries.json`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(ABSTRACTS_FILE), dir.join(SUMMARIES_FILE))
    }

    /// Create a provider from explicit file paths.
    pub fn new(abstracts_path: PathBuf, summaries_path: PathBuf) -> Self {
        let name = format!("jsonl:{}", abstracts_path.display());
        Self {
            abstracts_path,
            summaries_path,
            name,
        }
    }

    /// Parse JSON Lines text into abstracts, skipping blank lines.
    pub fn parse_abstracts(text: &str) -> ProviderResult<Vec<Abstract>> {
        let mut abstracts = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut record: Abstract = serde_json::from_str(line).map_err(|e| {
                ProviderError::ParseError(format!("line {}: {}", index + 1, e))
            })?;
            record.clean_headings();
            abstracts.push(record);
        }

        Ok(abstracts)
    }

    /// Parse the summaries object, preserving key order.
    pub fn parse_summaries(text: &str) -> ProviderResult<Vec<TopicSummary>> {
        let map: Map<String, Value> = serde_json::from_str(text)
            .map_err(|e| ProviderError::ParseError(format!("summaries: {}", e)))?;

        map.into_iter()
            .map(|(topic, value)| match value {
                Value::String(summary) => Ok(TopicSummary { topic, summary }),
                other => Err(ProviderError::ParseError(format!(
                    "summary for '{}' is not a string: {}",
                    topic, other
                ))),
            })
            .collect()
    }
}

#[async_trait]
impl AbstractProvider for JsonlAbstractProvider {
    async fn fetch_abstracts(&self) -> ProviderResult<Vec<Abstract>> {
        let text = tokio::fs::read_to_string(&self.abstracts_path).await?;
        let abstracts = Self::parse_abstracts(&text)?;
        debug!(
            "Parsed {} abstracts from {}",
            abstracts.len(),
            self.abstracts_path.display()
        );
        Ok(abstracts)
    }

    async fn fetch_summaries(&self) -> ProviderResult<Vec<TopicSummary>> {
        let text = tokio::fs::read_to_string(&self.summaries_path).await?;
        Self::parse_summaries(&text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSTRACTS: &str = concat!(
        r###"{"slug":"gout-ai","abstract_number":"0001","title":"Gout and AI","abstract":"## Background/Purpose\nGout.\n## Methods\nModels.","link":"https://acr/1","topic":"Gout"}"###,
        "\n\n",
        r#"{"slug":"lupus","abstract_number":2,"title":"Lupus","abstract":"Lupus text","link":"https://acr/2","topic":"SLE"}"#,
        "\n"
    );

    #[test]
    fn test_parse_abstracts_cleans_and_skips_blank_lines() {
        let abstracts = JsonlAbstractProvider::parse_abstracts(ABSTRACTS).unwrap();
        assert_eq!(abstracts.len(), 2);
        assert_eq!(abstracts[0].body, "Background/Purpose\nGout.\nMethods\nModels.");
        assert_eq!(abstracts[1].abstract_number, "2");
    }

    #[test]
    fn test_parse_abstracts_reports_line_number() {
        let text = "{\"abstract_number\":\"1\",\"title\":\"ok\"}\n{broken";
        match JsonlAbstractProvider::parse_abstracts(text) {
            Err(ProviderError::ParseError(msg)) => assert!(msg.starts_with("line 2")),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_summaries_preserves_order() {
        let summaries = JsonlAbstractProvider::parse_summaries(
            r#"{"Vasculitis": "v", "Gout": "g", "Axial SpA": "a"}"#,
        )
        .unwrap();
        let topics: Vec<&str> = summaries.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(topics, vec!["Vasculitis", "Gout", "Axial SpA"]);
    }

    #[test]
    fn test_parse_summaries_rejects_non_strings() {
        assert!(JsonlAbstractProvider::parse_summaries(r#"{"Gout": 3}"#).is_err());
        assert!(JsonlAbstractProvider::parse_summaries("[]").is_err());
    }

    #[tokio::test]
    async fn test_fetch_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ABSTRACTS_FILE), ABSTRACTS).unwrap();
        std::fs::write(dir.path().join(SUMMARIES_FILE), r#"{"Gout":"**bold**"}"#).unwrap();

        let provider = JsonlAbstractProvider::from_dir(dir.path());
        assert_eq!(provider.fetch_abstracts().await.unwrap().len(), 2);
        assert_eq!(provider.fetch_abstracts_limit(1).await.unwrap().len(), 1);
        assert_eq!(provider.fetch_summaries().await.unwrap()[0].summary, "**bold**");
        assert!(provider.name().starts_with("jsonl:"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonlAbstractProvider::from_dir(dir.path());
        assert!(matches!(
            provider.fetch_abstracts().await,
            Err(ProviderError::IoError(_))
        ));
    }
}
