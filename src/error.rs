// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for tagvault

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tagvault operations
pub type Result<T> = std::result::Result<T, TagvaultError>;

/// tagvault error types
#[derive(Error, Debug)]
pub enum TagvaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("AI service not available: {0}")]
    AiUnavailable(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Source file not found: {}", .0.display())]
    SourceMissing(PathBuf),
}
