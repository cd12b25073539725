// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! tagvault: file organization into a markdown vault
//!
//! Files found in source directories are classified, tagged and categorized,
//! described by a markdown note with frontmatter in the vault, and moved or
//! copied into an organized originals tree.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod history;
pub mod llm;
pub mod models;
pub mod render;
pub mod scanner;
pub mod suggest;

pub use config::{AppConfig, ProfileStore};
pub use engine::{OrganizationEngine, ProcessOptions};
pub use error::{Result, TagvaultError};
