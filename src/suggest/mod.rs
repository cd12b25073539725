// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tag and category suggestion providers

pub mod heuristic;
pub mod hybrid;
pub mod remote;

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::{AiConfig, AiMode, TaggingConfig};
use crate::models::{CategoryDecision, FileInfo, TagCandidate};
use crate::Result;

pub use heuristic::HeuristicProvider;
pub use hybrid::HybridProvider;
pub use remote::RemoteProvider;

/// Tags plus category for one file
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub tags: Vec<TagCandidate>,
    pub category: CategoryDecision,
}

/// Source of tags and categories
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unranked tag candidates
    async fn suggest_tags(&self, file: &FileInfo, content: Option<&str>) -> Result<Vec<TagCandidate>>;

    /// Best-fit category, preferring one of `existing_folders`
    async fn suggest_category(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<CategoryDecision>;

    /// Both at once; providers that answer in a single round trip override this
    async fn suggest(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<Suggestion> {
        let tags = self.suggest_tags(file, content).await?;
        let category = self.suggest_category(file, content, existing_folders).await?;
        Ok(Suggestion { tags, category })
    }
}

/// Deduplicate by tag (keeping the highest confidence at the first position),
/// sort by descending confidence with ties in emission order, keep `max_tags`
pub fn rank_tags(candidates: Vec<TagCandidate>, max_tags: usize) -> Vec<TagCandidate> {
    let mut ranked: Vec<TagCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match ranked.iter_mut().find(|t| t.tag == candidate.tag) {
            Some(existing) => {
                if candidate.confidence > existing.confidence {
                    existing.confidence = candidate.confidence;
                }
            }
            None => ranked.push(candidate),
        }
    }

    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(max_tags);
    ranked
}

/// Provider for the configured AI mode
pub fn provider_for(ai: &AiConfig, tagging: &TaggingConfig) -> Result<Arc<dyn SuggestionProvider>> {
    let heuristic = HeuristicProvider::new(tagging);
    let provider: Arc<dyn SuggestionProvider> = match ai.mode {
        AiMode::Local | AiMode::ClaudeCode => Arc::new(heuristic),
        AiMode::Api => Arc::new(RemoteProvider::new(ai)?),
        AiMode::Hybrid => Arc::new(HybridProvider::new(
            heuristic,
            Arc::new(RemoteProvider::new(ai)?),
        )),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagSource;

    fn tag(name: &str, confidence: f64) -> TagCandidate {
        TagCandidate::new(name, confidence, TagSource::Filename)
    }

    fn names(tags: &[TagCandidate]) -> Vec<&str> {
        tags.iter().map(|t| t.tag.as_str()).collect()
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank_tags(
            vec![tag("topic/a", 0.7), tag("type/x", 1.0), tag("topic/b", 0.7), tag("format/y", 1.0)],
            10,
        );
        assert_eq!(names(&ranked), vec!["type/x", "format/y", "topic/a", "topic/b"]);
    }

    #[test]
    fn test_rank_dedupes_keeping_max_confidence() {
        let ranked = rank_tags(
            vec![tag("topic/notes", 0.7), tag("type/document", 1.0), tag("topic/notes", 0.9)],
            10,
        );
        assert_eq!(names(&ranked), vec!["type/document", "topic/notes"]);
        assert_eq!(ranked[1].confidence, 0.9);
    }

    #[test]
    fn test_rank_truncates() {
        let ranked = rank_tags(vec![tag("a/1", 0.1), tag("a/2", 0.2), tag("a/3", 0.3)], 2);
        assert_eq!(names(&ranked), vec!["a/3", "a/2"]);
        assert!(rank_tags(vec![tag("a/1", 0.1)], 0).is_empty());
    }

    #[test]
    fn test_provider_for_modes() {
        let tagging = TaggingConfig::default();
        let mut ai = AiConfig::default();

        ai.mode = AiMode::Local;
        assert_eq!(provider_for(&ai, &tagging).unwrap().name(), "heuristic");
        ai.mode = AiMode::ClaudeCode;
        assert_eq!(provider_for(&ai, &tagging).unwrap().name(), "heuristic");
        ai.mode = AiMode::Api;
        assert_eq!(provider_for(&ai, &tagging).unwrap().name(), "remote");
        ai.mode = AiMode::Hybrid;
        assert_eq!(provider_for(&ai, &tagging).unwrap().name(), "hybrid");
    }
}
