// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Suggestions from a remote language model

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Suggestion, SuggestionProvider};
use crate::config::AiConfig;
use crate::llm::LlmClient;
use crate::models::{CategoryDecision, FileInfo, TagCandidate, TagSource};
use crate::render::format_bytes;
use crate::{Result, TagvaultError};

const CONTENT_EXCERPT: usize = 2000;
const REMOTE_TAG_CONFIDENCE: f64 = 0.8;

pub struct RemoteProvider {
    client: LlmClient,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemoteAnswer {
    tags: Vec<String>,
    category: Option<String>,
    confidence: Option<f64>,
    reasoning: Option<String>,
}

impl RemoteProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        Ok(Self {
            client: LlmClient::new(config)?,
        })
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

/// Prompt asking for a single JSON object
pub fn build_prompt(file: &FileInfo, content: Option<&str>, existing_folders: &[String]) -> String {
    let mut prompt = String::from(
        "You organize files into a personal knowledge vault. \
         Suggest tags and a category for the file below.\n\n",
    );
    prompt.push_str(&format!("File name: {}\n", file.name));
    prompt.push_str(&format!("File type: {}\n", file.file_type));
    prompt.push_str(&format!("Size: {}\n", format_bytes(file.size)));
    if !existing_folders.is_empty() {
        prompt.push_str(&format!("Existing folders: {}\n", existing_folders.join(", ")));
    }
    if let Some(text) = content {
        let excerpt: String = text.chars().take(CONTENT_EXCERPT).collect();
        prompt.push_str(&format!("\nContent excerpt:\n{}\n", excerpt));
    }
    prompt.push_str(
        "\nRespond with JSON only, in this exact shape:\n\
         {\"tags\": [\"tag1\", \"tag2\"], \"category\": \"Category\", \"confidence\": 0.9, \"reasoning\": \"short explanation\"}\n\
         Prefer an existing folder as the category when one fits.",
    );
    prompt
}

/// `namespace/value` form of a model-supplied tag
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').to_lowercase().replace(' ', "-");
    if tag.is_empty() {
        None
    } else if tag.contains('/') {
        Some(tag)
    } else {
        Some(format!("topic/{}", tag))
    }
}

/// Parse the first `{ ... }` span of a model response
fn parse_answer(response: &str) -> Result<RemoteAnswer> {
    let start = response.find('{');
    let end = response.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(serde_json::from_str(&response[s..=e])?),
        _ => Err(TagvaultError::AiUnavailable(
            "Model response contained no JSON object".to_string(),
        )),
    }
}

fn into_suggestion(answer: RemoteAnswer, file: &FileInfo) -> Suggestion {
    let tags = answer
        .tags
        .iter()
        .filter_map(|t| normalize_tag(t))
        .map(|t| TagCandidate::new(t, REMOTE_TAG_CONFIDENCE, TagSource::Content))
        .collect();

    let category = CategoryDecision {
        category: answer
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| file.file_type.display_name()),
        confidence: answer.confidence.unwrap_or(REMOTE_TAG_CONFIDENCE).clamp(0.0, 1.0),
        reasoning: answer.reasoning.unwrap_or_default(),
    };

    Suggestion { tags, category }
}

#[async_trait]
impl SuggestionProvider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn suggest_tags(&self, file: &FileInfo, content: Option<&str>) -> Result<Vec<TagCandidate>> {
        Ok(self.suggest(file, content, &[]).await?.tags)
    }

    async fn suggest_category(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<CategoryDecision> {
        Ok(self.suggest(file, content, existing_folders).await?.category)
    }

    async fn suggest(
        &self,
        file: &FileInfo,
        content: Option<&str>,
        existing_folders: &[String],
    ) -> Result<Suggestion> {
        let prompt = build_prompt(file, content, existing_folders);
        let response = self.client.generate_with_retry(&prompt).await?;
        debug!("Model answered for {}: {}", file.name, response);
        Ok(into_suggestion(parse_answer(&response)?, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use chrono::Local;
    use std::path::PathBuf;

    fn info(name: &str) -> FileInfo {
        let extension = name.rsplit_once('.').map(|(_, e)| e.to_string()).unwrap_or_default();
        FileInfo {
            path: PathBuf::from(name),
            name: name.to_string(),
            file_type: classify(&extension),
            extension,
            size: 2048,
            created: Local::now(),
            modified: Local::now(),
        }
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Machine Learning").as_deref(), Some("topic/machine-learning"));
        assert_eq!(normalize_tag("#Rust").as_deref(), Some("topic/rust"));
        assert_eq!(normalize_tag("project/Apollo").as_deref(), Some("project/apollo"));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_parse_answer_with_chatter() {
        let response = "Sure! Here you go:\n```json\n{\"tags\": [\"Budget\", \"finance/q1\"], \"category\": \"Finance\", \"confidence\": 0.92, \"reasoning\": \"spreadsheet of costs\"}\n```";
        let suggestion = into_suggestion(parse_answer(response).unwrap(), &info("costs.xlsx"));

        let tags: Vec<&str> = suggestion.tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["topic/budget", "finance/q1"]);
        assert!(suggestion.tags.iter().all(|t| t.source == TagSource::Content && t.confidence == 0.8));
        assert_eq!(suggestion.category.category, "Finance");
        assert_eq!(suggestion.category.confidence, 0.92);
    }

    #[test]
    fn test_parse_answer_defaults_category() {
        let suggestion = into_suggestion(parse_answer("{\"tags\": []}").unwrap(), &info("notes.md"));
        assert_eq!(suggestion.category.category, "Document");
        assert!(suggestion.tags.is_empty());
    }

    #[test]
    fn test_parse_answer_without_json() {
        assert!(parse_answer("I cannot help with that").is_err());
        assert!(parse_answer("} backwards {").is_err());
    }

    #[test]
    fn test_prompt_mentions_folders_and_excerpt() {
        let prompt = build_prompt(&info("plan.txt"), Some("launch checklist"), &["Projects".to_string()]);
        assert!(prompt.contains("File name: plan.txt"));
        assert!(prompt.contains("Existing folders: Projects"));
        assert!(prompt.contains("launch checklist"));
        assert!(prompt.contains("2 KB"));
    }
}
