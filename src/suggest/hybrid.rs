// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Heuristic tags enriched by a remote provider when it answers

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::{HeuristicProvider, Suggestion, SuggestionProvider};
use crate::models::{CategoryDecision, FileInfo, TagCandidate};
use crate::Result;

pub struct HybridProvider {
    heuristic: HeuristicProvider,
    remote: Arc<dyn SuggestionProvider>,
}

impl HybridProvider {
    pub fn new(heuristic: HeuristicProvider, remote: Arc<dyn SuggestionProvider>) -> Self {
        Self { heuristic, remote }
    }
}

#[async_trait]
impl SuggestionProvider for HybridProvider {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn suggest_tags(&self, file: &FileInfo, content: Option<&str>) -> Result<Vec<TagCandidate>> {
        let mut tags = self.heuristic.tags_for(file);
        match self.remote.suggest_tags(file, content).await {
            Ok(remote) => tags.extend(remote),
            Err(e) => warn!("Remote tagging failed for {}, using heuristics only: {}", file.name, e),
        }
        Ok(tags)
    }

    async fn suggest_category(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<CategoryDecision> {
        match self.remote.suggest_category(file, content, existing_folders).await {
            Ok(decision) => Ok(decision),
            Err(e) => {
                warn!("Remote categorization failed for {}, using heuristics: {}", file.name, e);
                Ok(self.heuristic.category_for(file, existing_folders))
            }
        }
    }

    async fn suggest(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<Suggestion> {
        let mut tags = self.heuristic.tags_for(file);
        match self.remote.suggest(file, content, existing_folders).await {
            Ok(remote) => {
                tags.extend(remote.tags);
                Ok(Suggestion {
                    tags,
                    category: remote.category,
                })
            }
            Err(e) => {
                warn!("Remote suggestion failed for {}, using heuristics: {}", file.name, e);
                Ok(Suggestion {
                    tags,
                    category: self.heuristic.category_for(file, existing_folders),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::config::TaggingConfig;
    use crate::models::TagSource;
    use crate::TagvaultError;
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    struct Failing;

    #[async_trait]
    impl SuggestionProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn suggest_tags(&self, _file: &FileInfo, _content: Option<&str>) -> Result<Vec<TagCandidate>> {
            Err(TagvaultError::AiUnavailable("offline".to_string()))
        }

        async fn suggest_category(
            &self,
            _file: &FileInfo,
            _content: Option<&str>,
            _existing_folders: &[String],
        ) -> Result<CategoryDecision> {
            Err(TagvaultError::AiUnavailable("offline".to_string()))
        }
    }

    struct Fixed;

    #[async_trait]
    impl SuggestionProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn suggest_tags(&self, _file: &FileInfo, _content: Option<&str>) -> Result<Vec<TagCandidate>> {
            Ok(vec![TagCandidate::new("topic/agenda", 0.8, TagSource::Content)])
        }

        async fn suggest_category(
            &self,
            _file: &FileInfo,
            _content: Option<&str>,
            _existing_folders: &[String],
        ) -> Result<CategoryDecision> {
            Ok(CategoryDecision {
                category: "Meetings".to_string(),
                confidence: 0.95,
                reasoning: "agenda".to_string(),
            })
        }
    }

    fn info() -> FileInfo {
        let when = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        FileInfo {
            path: PathBuf::from("/inbox/team-sync.txt"),
            name: "team-sync.txt".to_string(),
            extension: "txt".to_string(),
            size: 10,
            created: when,
            modified: when,
            file_type: classify("txt"),
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_heuristics() {
        let heuristic = HeuristicProvider::new(&TaggingConfig::default());
        let expected_tags = heuristic.tags_for(&info());
        let hybrid = HybridProvider::new(heuristic, Arc::new(Failing));

        let suggestion = hybrid.suggest(&info(), Some("text"), &[]).await.unwrap();
        assert_eq!(suggestion.tags, expected_tags);
        assert_eq!(suggestion.category.category, "Document");

        let category = hybrid.suggest_category(&info(), None, &[]).await.unwrap();
        assert_eq!(category.category, "Document");
    }

    #[tokio::test]
    async fn test_merges_remote_answer() {
        let hybrid = HybridProvider::new(HeuristicProvider::new(&TaggingConfig::default()), Arc::new(Fixed));

        let suggestion = hybrid.suggest(&info(), None, &[]).await.unwrap();
        assert_eq!(suggestion.tags.first().map(|t| t.tag.as_str()), Some("type/document"));
        assert_eq!(suggestion.tags.last().map(|t| t.tag.as_str()), Some("topic/agenda"));
        assert_eq!(suggestion.category.category, "Meetings");

        let tags = hybrid.suggest_tags(&info(), None).await.unwrap();
        assert!(tags.iter().any(|t| t.tag == "topic/agenda"));
    }
}
