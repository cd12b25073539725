// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Offline suggestions from file type, date and name

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

use super::SuggestionProvider;
use crate::config::TaggingConfig;
use crate::models::{CategoryDecision, FileInfo, TagCandidate, TagSource};
use crate::Result;

const CATEGORY_CONFIDENCE: f64 = 0.8;
const CATEGORY_REASONING: &str = "Based on file type and existing folder names";

/// Deterministic provider; never fails and never looks at content
#[derive(Debug, Clone)]
pub struct HeuristicProvider {
    auto_tag_type: bool,
    auto_tag_date: bool,
    auto_tag_filename: bool,
    patterns: Vec<(String, Regex)>,
}

impl HeuristicProvider {
    pub fn new(config: &TaggingConfig) -> Self {
        let patterns = config
            .custom_patterns
            .iter()
            .filter_map(|(tag, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((tag.clone(), re)),
                Err(e) => {
                    warn!("Ignoring invalid pattern for tag {}: {}", tag, e);
                    None
                }
            })
            .collect();

        Self {
            auto_tag_type: config.auto_tag_type,
            auto_tag_date: config.auto_tag_date,
            auto_tag_filename: config.auto_tag_filename,
            patterns,
        }
    }

    pub fn tags_for(&self, file: &FileInfo) -> Vec<TagCandidate> {
        let mut tags = Vec::new();

        if self.auto_tag_type {
            tags.push(TagCandidate::new(format!("type/{}", file.file_type), 1.0, TagSource::Type));
            if !file.extension.is_empty() {
                tags.push(TagCandidate::new(format!("format/{}", file.extension), 1.0, TagSource::Type));
            }
        }

        if self.auto_tag_date {
            tags.push(TagCandidate::new(
                format!("date/{}", file.modified.format("%Y/%m")),
                1.0,
                TagSource::Context,
            ));
        }

        if self.auto_tag_filename {
            for word in filename_words(file.stem()) {
                tags.push(TagCandidate::new(format!("topic/{}", word), 0.7, TagSource::Filename));
            }
        }

        for (tag, re) in &self.patterns {
            if re.is_match(&file.name) {
                tags.push(TagCandidate::new(tag.clone(), 0.9, TagSource::Filename));
            }
        }

        tags
    }

    pub fn category_for(&self, file: &FileInfo, existing_folders: &[String]) -> CategoryDecision {
        let name = file.name.to_lowercase();
        let category = existing_folders
            .iter()
            .find(|folder| !folder.is_empty() && name.contains(&folder.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| file.file_type.display_name());

        CategoryDecision {
            category,
            confidence: CATEGORY_CONFIDENCE,
            reasoning: CATEGORY_REASONING.to_string(),
        }
    }
}

/// Lowercased stem tokens longer than three characters
pub fn filename_words(stem: &str) -> Vec<String> {
    stem.replace(['.', '_', '-'], " ")
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl SuggestionProvider for HeuristicProvider {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn suggest_tags(&self, file: &FileInfo, _content: Option<&str>) -> Result<Vec<TagCandidate>> {
        Ok(self.tags_for(file))
    }

    async fn suggest_category(
        &self,
        file: &FileInfo,
        _content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<CategoryDecision> {
        Ok(self.category_for(file, existing_folders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::suggest::rank_tags;
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    fn info(name: &str) -> FileInfo {
        let when = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let extension = name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
        FileInfo {
            path: PathBuf::from("/inbox").join(name),
            name: name.to_string(),
            file_type: classify(&extension),
            extension,
            size: 42,
            created: when,
            modified: when,
        }
    }

    fn names(tags: &[TagCandidate]) -> Vec<&str> {
        tags.iter().map(|t| t.tag.as_str()).collect()
    }

    #[test]
    fn test_meeting_notes_tags() {
        let provider = HeuristicProvider::new(&TaggingConfig::default());
        let tags = tokio_test::block_on(provider.suggest_tags(&info("project-meeting-notes.txt"), None)).unwrap();
        assert_eq!(
            names(&tags),
            vec![
                "type/document",
                "format/txt",
                "date/2024/03",
                "topic/project",
                "topic/meeting",
                "topic/notes",
            ]
        );
        assert_eq!(tags[2].source, TagSource::Context);
        assert_eq!(tags[3].confidence, 0.7);
    }

    #[test]
    fn test_max_tags_truncation() {
        let provider = HeuristicProvider::new(&TaggingConfig::default());
        let tags = rank_tags(provider.tags_for(&info("project-meeting-notes.txt")), 5);
        assert_eq!(
            names(&tags),
            vec!["type/document", "format/txt", "date/2024/03", "topic/project", "topic/meeting"]
        );
    }

    #[test]
    fn test_short_tokens_dropped() {
        assert_eq!(filename_words("a_big_data.v2"), vec!["data"]);
        assert_eq!(filename_words("Über.Größe"), vec!["über", "größe"]);
    }

    #[test]
    fn test_toggles_and_empty_extension() {
        let config = TaggingConfig {
            auto_tag_date: false,
            auto_tag_filename: false,
            ..TaggingConfig::default()
        };
        let provider = HeuristicProvider::new(&config);
        assert_eq!(names(&provider.tags_for(&info("Makefile"))), vec!["type/unknown"]);
    }

    #[test]
    fn test_custom_patterns() {
        let mut config = TaggingConfig::default();
        config.custom_patterns.insert("project/apollo".to_string(), "(?i)apollo".to_string());
        config.custom_patterns.insert("broken".to_string(), "([".to_string());
        let provider = HeuristicProvider::new(&config);

        let tags = provider.tags_for(&info("Apollo-plan.md"));
        let custom = tags.iter().find(|t| t.tag == "project/apollo").unwrap();
        assert_eq!(custom.confidence, 0.9);
        assert!(!tags.iter().any(|t| t.tag == "broken"));
    }

    #[test]
    fn test_category_prefers_existing_folder() {
        let provider = HeuristicProvider::new(&TaggingConfig::default());
        let folders = vec!["Invoices".to_string(), "Projects".to_string()];

        let decision = provider.category_for(&info("2024-invoices-march.pdf"), &folders);
        assert_eq!(decision.category, "Invoices");
        assert_eq!(decision.confidence, 0.8);

        let decision = provider.category_for(&info("holiday.png"), &folders);
        assert_eq!(decision.category, "Image");
    }
}
