// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for tagvault
//!
//! A profile store holds any number of named [`AppConfig`]s. Components never
//! receive the whole `AppConfig`; each takes the slice it needs
//! ([`VaultConfig`], [`OriginalsConfig`], [`TaggingConfig`], ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::{Result, TagvaultError};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "TAGVAULT_API_KEY";

/// Name of the profile created for a fresh store
pub const DEFAULT_PROFILE: &str = "default";

/// Upper bound for `ai.retries`
pub const MAX_RETRIES: u32 = 10;

/// Named profiles plus the one currently in use
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProfileStore {
    pub active_profile: String,
    pub profiles: BTreeMap<String, AppConfig>,
}

/// Configuration of a single profile
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Destination of generated markdown
    #[serde(default)]
    pub vault: VaultConfig,

    /// Destination of relocated originals
    #[serde(default)]
    pub originals: OriginalsConfig,

    /// Directories to scan
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Suggestion backend settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Placement journal used by `history undo`
    #[serde(default = "default_history_path")]
    pub history_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VaultConfig {
    pub path: String,
    #[serde(default)]
    pub folders: VaultFolders,
}

/// Vault subfolder names per category family
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VaultFolders {
    #[serde(default = "default_documents_folder")]
    pub documents: String,
    #[serde(default = "default_media_folder")]
    pub media: String,
    #[serde(default = "default_code_folder")]
    pub code: String,
    #[serde(default = "default_references_folder")]
    pub references: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OriginalsConfig {
    pub path: String,
    #[serde(default)]
    pub style: OrganizationStyle,
    #[serde(default)]
    pub year_folders: bool,
}

/// Layout of the originals tree
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationStyle {
    #[default]
    TypeBased,
    DateBased,
    ProjectBased,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProcessingConfig {
    #[serde(default = "default_true")]
    pub extract_text: bool,
    /// Files above this size are not picked up by the scanner
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Extension allow-list; empty accepts everything
    #[serde(default)]
    pub supported_formats: Vec<String>,
    /// Accepted for compatibility, processing is always sequential
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_archive_entries")]
    pub max_archive_entries: usize,
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TaggingConfig {
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_true")]
    pub auto_tag_type: bool,
    #[serde(default = "default_true")]
    pub auto_tag_date: bool,
    #[serde(default = "default_true")]
    pub auto_tag_filename: bool,
    /// Tag -> regex matched against the file name
    #[serde(default)]
    pub custom_patterns: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    #[serde(default)]
    pub mode: AiMode,
    #[serde(default = "default_ai_url")]
    pub url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

/// Which suggestion backend to use
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AiMode {
    ClaudeCode,
    Api,
    Hybrid,
    #[default]
    Local,
}

impl AiMode {
    /// Whether this mode talks to the remote service
    pub fn uses_remote(self) -> bool {
        matches!(self, AiMode::Api | AiMode::Hybrid)
    }
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AiMode::ClaudeCode => "claude-code",
            AiMode::Api => "api",
            AiMode::Hybrid => "hybrid",
            AiMode::Local => "local",
        };
        f.write_str(s)
    }
}

impl fmt::Display for OrganizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrganizationStyle::TypeBased => "type-based",
            OrganizationStyle::DateBased => "date-based",
            OrganizationStyle::ProjectBased => "project-based",
        };
        f.write_str(s)
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_history_path() -> String { "tagvault_history.jsonl".to_string() }
fn default_documents_folder() -> String { "Documents".to_string() }
fn default_media_folder() -> String { "Media".to_string() }
fn default_code_folder() -> String { "Code".to_string() }
fn default_references_folder() -> String { "References".to_string() }
fn default_max_file_size() -> u64 { 100 * 1024 * 1024 }
fn default_batch_size() -> usize { 10 }
fn default_max_archive_entries() -> usize { 1000 }
fn default_max_archive_bytes() -> u64 { 512 * 1024 * 1024 }
fn default_max_tags() -> usize { 10 }
fn default_ai_url() -> String { "http://localhost:11434/api/generate".to_string() }
fn default_ai_model() -> String { "llama3.2:3b".to_string() }
fn default_temperature() -> f32 { 0.3 }
fn default_timeout() -> u64 { 120 }
fn default_retries() -> u32 { 2 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vault: VaultConfig::default(),
            originals: OriginalsConfig::default(),
            sources: vec![SourceConfig {
                path: "./inbox".to_string(),
                recursive: false,
                enabled: true,
            }],
            processing: ProcessingConfig::default(),
            tagging: TaggingConfig::default(),
            ai: AiConfig::default(),
            history_path: default_history_path(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: "./vault".to_string(),
            folders: VaultFolders::default(),
        }
    }
}

impl Default for VaultFolders {
    fn default() -> Self {
        Self {
            documents: default_documents_folder(),
            media: default_media_folder(),
            code: default_code_folder(),
            references: default_references_folder(),
        }
    }
}

impl Default for OriginalsConfig {
    fn default() -> Self {
        Self {
            path: "./originals".to_string(),
            style: OrganizationStyle::default(),
            year_folders: false,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            extract_text: true,
            max_file_size: default_max_file_size(),
            supported_formats: Vec::new(),
            batch_size: default_batch_size(),
            max_archive_entries: default_max_archive_entries(),
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            max_tags: default_max_tags(),
            auto_tag_type: true,
            auto_tag_date: true,
            auto_tag_filename: true,
            custom_patterns: BTreeMap::new(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mode: AiMode::default(),
            url: default_ai_url(),
            model: default_ai_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
        }
    }
}

impl AiConfig {
    /// Configured key, or the one from the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

impl AppConfig {
    /// Starter profile rooted at `base`
    pub fn rooted_at(base: &Path) -> Self {
        let mut config = Self::default();
        config.vault.path = base.join("vault").to_string_lossy().to_string();
        config.originals.path = base.join("originals").to_string_lossy().to_string();
        config.sources = vec![SourceConfig {
            path: base.join("inbox").to_string_lossy().to_string(),
            recursive: false,
            enabled: true,
        }];
        config
    }

    /// Check the profile for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.vault.path.trim().is_empty() {
            return Err(TagvaultError::Config("vault.path must not be empty".to_string()));
        }
        if self.originals.path.trim().is_empty() {
            return Err(TagvaultError::Config("originals.path must not be empty".to_string()));
        }
        if self.tagging.max_tags == 0 {
            return Err(TagvaultError::Config("tagging.max_tags must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(TagvaultError::Config(format!(
                "ai.temperature must be between 0 and 2, got {}",
                self.ai.temperature
            )));
        }
        if self.ai.retries > MAX_RETRIES {
            return Err(TagvaultError::Config(format!(
                "ai.retries must be at most {}, got {}",
                MAX_RETRIES, self.ai.retries
            )));
        }
        if self.ai.mode.uses_remote() {
            if self.ai.url.trim().is_empty() {
                return Err(TagvaultError::Config(format!("ai.url is required in {} mode", self.ai.mode)));
            }
            if self.ai.model.trim().is_empty() {
                return Err(TagvaultError::Config(format!("ai.model is required in {} mode", self.ai.mode)));
            }
        }
        for (tag, pattern) in &self.tagging.custom_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                TagvaultError::Config(format!("custom pattern for '{}' is invalid: {}", tag, e))
            })?;
        }
        Ok(())
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), AppConfig::default());
        Self {
            active_profile: DEFAULT_PROFILE.to_string(),
            profiles,
        }
    }
}

impl ProfileStore {
    /// Load the store from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let store: Self = serde_json::from_str(&content)
                .map_err(|e| TagvaultError::Config(format!("Failed to parse config: {}", e)))?;
            if !store.profiles.contains_key(&store.active_profile) {
                return Err(TagvaultError::Profile(format!(
                    "active profile '{}' is not defined",
                    store.active_profile
                )));
            }
            Ok(store)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save the store to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Result<&AppConfig> {
        self.profiles
            .get(name)
            .ok_or_else(|| TagvaultError::Profile(format!("no profile named '{}'", name)))
    }

    /// The profile currently in use
    pub fn active(&self) -> Result<&AppConfig> {
        self.get(&self.active_profile)
    }

    /// Add a profile, copied from `from` or from the defaults
    pub fn create(&mut self, name: &str, from: Option<&str>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(TagvaultError::Profile("profile name must not be empty".to_string()));
        }
        if self.profiles.contains_key(name) {
            return Err(TagvaultError::Profile(format!("profile '{}' already exists", name)));
        }
        let config = match from {
            Some(source) => self.get(source)?.clone(),
            None => AppConfig::default(),
        };
        self.profiles.insert(name.to_string(), config);
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        self.get(name)?;
        self.active_profile = name.to_string();
        Ok(())
    }

    /// Delete a profile; the active one cannot be removed
    pub fn remove(&mut self, name: &str) -> Result<AppConfig> {
        if name == self.active_profile {
            return Err(TagvaultError::Profile(format!(
                "cannot delete the active profile '{}'",
                name
            )));
        }
        self.profiles
            .remove(name)
            .ok_or_else(|| TagvaultError::Profile(format!("no profile named '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_store_has_active_profile() {
        let store = ProfileStore::default();
        assert_eq!(store.active_profile, DEFAULT_PROFILE);
        assert!(store.active().is_ok());
        assert!(store.active().unwrap().validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.names(), vec![DEFAULT_PROFILE]);
    }

    #[test]
    fn test_save_and_load_profiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tagvault.json");

        let mut store = ProfileStore::default();
        store.create("work", Some(DEFAULT_PROFILE)).unwrap();
        store.profiles.get_mut("work").unwrap().originals.style = OrganizationStyle::DateBased;
        store.set_active("work").unwrap();
        store.save(&path).unwrap();

        let loaded = ProfileStore::load(&path).unwrap();
        assert_eq!(loaded.active_profile, "work");
        assert_eq!(loaded.active().unwrap().originals.style, OrganizationStyle::DateBased);
    }

    #[test]
    fn test_profile_lifecycle_errors() {
        let mut store = ProfileStore::default();
        assert!(store.create(DEFAULT_PROFILE, None).is_err());
        assert!(store.set_active("missing").is_err());
        assert!(store.remove(DEFAULT_PROFILE).is_err());

        store.create("scratch", None).unwrap();
        assert!(store.remove("scratch").is_ok());
        assert!(store.get("scratch").is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "active_profile": "p",
            "profiles": {
                "p": {
                    "vault": { "path": "/v" },
                    "originals": { "path": "/o", "style": "project-based" },
                    "ai": { "mode": "hybrid" }
                }
            }
        }"#;
        let store: ProfileStore = serde_json::from_str(json).unwrap();
        let config = store.active().unwrap();
        assert_eq!(config.vault.folders.documents, "Documents");
        assert_eq!(config.originals.style, OrganizationStyle::ProjectBased);
        assert_eq!(config.ai.mode, AiMode::Hybrid);
        assert_eq!(config.tagging.max_tags, 10);
        assert!(config.processing.extract_text);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.tagging.max_tags = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ai.mode = AiMode::Api;
        config.ai.model.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tagging.custom_patterns.insert("project/x".to_string(), "(".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ai.retries = MAX_RETRIES;
        assert!(config.validate().is_ok());
        config.ai.retries = 65;
        assert!(config.validate().is_err());
    }
}
