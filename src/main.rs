// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! tagvault command line interface

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use tagvault::config::{AppConfig, ProfileStore, SourceConfig};
use tagvault::extractors::ExtractionCapabilities;
use tagvault::history::{undo_entry, History};
use tagvault::llm::LlmClient;
use tagvault::models::OrganizationResult;
use tagvault::render::format_bytes;
use tagvault::scanner::Scanner;
use tagvault::{OrganizationEngine, ProcessOptions};

/// tagvault CLI - organize files into a tagged markdown vault
#[derive(Parser, Debug)]
#[command(name = "tagvault")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Organize files into a tagged markdown vault", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the profile store (JSON format)
    #[arg(short, long, default_value = "tagvault.json", global = true)]
    config: PathBuf,

    /// Use this profile instead of the active one
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize files from the configured sources
    Organize {
        /// Source directories (overrides the profile)
        #[arg(short, long)]
        source: Vec<PathBuf>,

        /// Descend into subdirectories of overridden sources
        #[arg(short, long)]
        recursive: bool,

        /// Show what would happen without touching any file
        #[arg(long)]
        dry_run: bool,

        /// Copy originals instead of moving them
        #[arg(long)]
        copy: bool,

        /// Batch size (overrides the profile)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// List the files that would be organized
    Scan,

    /// Profile management
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// History and undo operations
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Show suggestion engine status
    Status,

    /// Initialize a new vault layout
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommands {
    /// List profiles
    List,

    /// Show a profile (default: the active one)
    Show { name: Option<String> },

    /// Create a profile
    Create {
        name: String,

        /// Copy settings from this profile
        #[arg(long)]
        from: Option<String>,
    },

    /// Make a profile the active one
    Use { name: String },

    /// Delete a profile
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the selected profile
    Show,

    /// Generate a default profile store
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "tagvault.json")]
        output: PathBuf,
    },

    /// Validate the selected profile
    Validate,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent history entries
    List {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Undo recent placements
    Undo {
        /// Number of placements to undo
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Dry run (show what would be undone)
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear all history
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut store = ProfileStore::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(name) = &cli.profile {
        store.set_active(name)?;
    }

    match cli.command {
        Commands::Organize { source, recursive, dry_run, copy, batch_size } => {
            let config = store.active()?.clone();
            run_organize(config, source, recursive, dry_run, copy, batch_size, &cli.format, cli.quiet).await
        }
        Commands::Scan => run_scan(store.active()?, &cli.format),
        Commands::Profile { action } => run_profile_command(store, action, &cli.config, cli.profile.is_some()),
        Commands::Config { action } => run_config_command(store.active()?, action, &cli.config),
        Commands::History { action } => run_history_command(store.active()?, action),
        Commands::Status => run_status(store.active()?, &store.active_profile).await,
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

/// Run the organization pipeline over the configured sources
#[allow(clippy::too_many_arguments)]
async fn run_organize(
    mut config: AppConfig,
    source_overrides: Vec<PathBuf>,
    recursive: bool,
    dry_run: bool,
    copy: bool,
    batch_size: Option<usize>,
    format: &str,
    quiet: bool,
) -> Result<()> {
    config.validate().context("Invalid profile")?;

    if !source_overrides.is_empty() {
        config.sources = source_overrides
            .iter()
            .map(|p| SourceConfig {
                path: p.to_string_lossy().to_string(),
                recursive,
                enabled: true,
            })
            .collect();
    }

    if dry_run {
        warn!("DRY RUN MODE - no file will be written or moved");
    }

    let files = Scanner::new(&config.sources, &config.processing)
        .scan()
        .context("Failed to scan sources")?;
    if files.is_empty() {
        info!("Nothing to organize");
    }

    let engine = OrganizationEngine::from_config(&config)?;
    info!("Using {} suggestions", engine.provider_name());

    let options = ProcessOptions {
        dry_run,
        copy,
        batch_size: batch_size.unwrap_or(config.processing.batch_size),
        processed_at: None,
    };

    let text_output = format == "text" && !quiet;
    let result = engine
        .process_files(&files, &options, |index, total, file| {
            if text_output {
                println!("[{}/{}] {}", index, total, file.path.display());
            }
        })
        .await;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, dry_run);
    }

    Ok(())
}

fn print_result(result: &OrganizationResult, dry_run: bool) {
    let prefix = if dry_run { "[DRY RUN] " } else { "" };
    for processed in &result.processed {
        println!(
            "{}{} -> {}",
            prefix,
            processed.file.name,
            processed.original_path.display()
        );
        println!("    note: {}", processed.markdown_path.display());
        println!("    tags: {}", processed.tags.join(", "));
    }

    println!(
        "\n{}Organized {} of {} files in {:.2?} ({} failed)",
        prefix,
        result.summary.successful,
        result.summary.total,
        result.summary.duration,
        result.summary.failed
    );
    for failure in &result.failed {
        println!("  FAILED {}: {}", failure.file.path.display(), failure.error);
    }
}

fn run_scan(config: &AppConfig, format: &str) -> Result<()> {
    let files = Scanner::new(&config.sources, &config.processing).scan()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for file in &files {
        println!(
            "{:<10} {:>10}  {}",
            file.file_type,
            format_bytes(file.size),
            file.path.display()
        );
    }
    println!("\n{} files", files.len());
    Ok(())
}

fn run_profile_command(
    mut store: ProfileStore,
    action: ProfileCommands,
    config_path: &Path,
    overridden: bool,
) -> Result<()> {
    match action {
        ProfileCommands::List => {
            for name in store.names() {
                let marker = if name == store.active_profile { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        ProfileCommands::Show { name } => {
            let name = name.unwrap_or_else(|| store.active_profile.clone());
            println!("{}", serde_json::to_string_pretty(store.get(&name)?)?);
        }
        ProfileCommands::Create { name, from } => {
            if overridden {
                bail!("--profile cannot be combined with profile create");
            }
            store.create(&name, from.as_deref())?;
            store.save(config_path)?;
            println!("Created profile '{}'", name);
        }
        ProfileCommands::Use { name } => {
            store.set_active(&name)?;
            store.save(config_path)?;
            println!("Active profile is now '{}'", name);
        }
        ProfileCommands::Delete { name } => {
            if overridden {
                bail!("--profile cannot be combined with profile delete");
            }
            store.remove(&name)?;
            store.save(config_path)?;
            println!("Deleted profile '{}'", name);
        }
    }
    Ok(())
}

fn run_config_command(config: &AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Generate { output } => {
            if output.exists() {
                bail!("{} already exists", output.display());
            }
            ProfileStore::default().save(&output)?;
            println!("Generated config at {}", output.display());
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {} is valid", config_path.display());
            println!("  Vault: {}", config.vault.path);
            println!("  Originals: {} ({})", config.originals.path, config.originals.style);
            println!("  Sources: {}", config.sources.len());
            println!("  AI mode: {}", config.ai.mode);
        }
    }
    Ok(())
}

fn run_history_command(config: &AppConfig, action: HistoryCommands) -> Result<()> {
    let history = History::new(PathBuf::from(&config.history_path));

    match action {
        HistoryCommands::List { count } => {
            let entries = history.get_recent(count)?;
            println!("Recent history ({} entries):", entries.len());
            for entry in entries {
                let status = if entry.undone { "[UNDONE]" } else { "" };
                println!(
                    "  {} {} -> {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.source_path.display(),
                    entry.original_dest.display(),
                    status
                );
            }
        }
        HistoryCommands::Undo { count, dry_run } => {
            let to_undo: Vec<_> = history.get_undoable()?.into_iter().take(count).collect();

            if to_undo.is_empty() {
                println!("Nothing to undo");
                return Ok(());
            }

            for entry in to_undo {
                match undo_entry(&entry, dry_run) {
                    Ok(report) => {
                        if !dry_run {
                            history.mark_undone(&entry.id)?;
                        }
                        let verb = if dry_run { "Would undo" } else { "Undone" };
                        println!(
                            "{}: {} -> {} ({} generated files)",
                            verb,
                            entry.original_dest.display(),
                            entry.source_path.display(),
                            report.removed.len()
                        );
                    }
                    Err(e) => warn!("Cannot undo {:?}: {}", entry.source_path, e),
                }
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            history.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}

async fn run_status(config: &AppConfig, profile: &str) -> Result<()> {
    println!("tagvault v{} Status", env!("CARGO_PKG_VERSION"));
    println!("==================");
    println!("Profile: {}", profile);
    println!("AI mode: {}", config.ai.mode);

    let capabilities = ExtractionCapabilities::detect();
    println!("Extraction: {}", capabilities.names().join(", "));

    if config.ai.mode.uses_remote() {
        let client = LlmClient::new(&config.ai)?;
        match client.health_check().await {
            Ok(()) => println!("Remote LLM: Running at {}", client.base_url()),
            Err(e) => println!("Remote LLM: Error - {}", e),
        }

        match client.list_models().await {
            Ok(models) => {
                println!("\nAvailable models:");
                for m in &models {
                    let marker = if m.starts_with(client.model()) { "→" } else { " " };
                    println!("  {} {}", marker, m);
                }
            }
            Err(e) => println!("  Error listing models: {}", e),
        }
    }

    println!("\nConfiguration:");
    println!("  Vault: {}", config.vault.path);
    println!("  Originals: {}", config.originals.path);
    for source in &config.sources {
        let state = if source.enabled { "" } else { " (disabled)" };
        println!("  Source: {}{}", source.path, state);
    }

    Ok(())
}

fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("tagvault.json");

    if config_path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite", config_path.display());
    }

    let mut store = ProfileStore::default();
    let config = AppConfig::rooted_at(&target);
    for dir in [&config.vault.path, &config.originals.path] {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir))?;
    }
    for source in &config.sources {
        std::fs::create_dir_all(&source.path)
            .with_context(|| format!("Failed to create {}", source.path))?;
    }
    store.profiles.insert(store.active_profile.clone(), config);
    store.save(&config_path)?;

    println!("tagvault initialized in {}", target.display());
    println!("\nCreated:");
    println!("  - tagvault.json");
    println!("  - vault/");
    println!("  - originals/");
    println!("  - inbox/");
    println!("\nNext steps:");
    println!("  1. Drop files into inbox/");
    println!("  2. Preview: tagvault organize --dry-run");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["tagvault"]).is_err());
    }

    #[test]
    fn test_cli_organize_command() {
        let cli = Cli::try_parse_from([
            "tagvault", "organize", "--dry-run", "--source", "/tmp/in", "--batch-size", "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Organize { dry_run, copy, source, batch_size, .. } => {
                assert!(dry_run);
                assert!(!copy);
                assert_eq!(source, vec![PathBuf::from("/tmp/in")]);
                assert_eq!(batch_size, Some(4));
            }
            _ => panic!("Expected Organize command"),
        }
        assert_eq!(cli.config, PathBuf::from("tagvault.json"));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "tagvault", "scan", "--profile", "work", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.profile.as_deref(), Some("work"));
        assert_eq!(cli.format, "json");
        assert!(cli.verbose);
        assert!(Cli::try_parse_from(["tagvault", "scan", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_cli_profile_commands() {
        let cli = Cli::try_parse_from(["tagvault", "profile", "create", "work", "--from", "default"]).unwrap();
        match cli.command {
            Commands::Profile { action: ProfileCommands::Create { name, from } } => {
                assert_eq!(name, "work");
                assert_eq!(from.as_deref(), Some("default"));
            }
            _ => panic!("Expected profile create"),
        }
    }

    #[test]
    fn test_cli_history_undo() {
        let cli = Cli::try_parse_from(["tagvault", "history", "undo", "--count", "3", "--dry-run"]).unwrap();
        match cli.command {
            Commands::History { action: HistoryCommands::Undo { count, dry_run } } => {
                assert_eq!(count, 3);
                assert!(dry_run);
            }
            _ => panic!("Expected history undo"),
        }
    }

    #[test]
    fn test_cli_history_count_short_flag() {
        let cli = Cli::try_parse_from(["tagvault", "history", "list", "-n", "5", "-c", "other.json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.json"));
        match cli.command {
            Commands::History { action: HistoryCommands::List { count } } => assert_eq!(count, 5),
            _ => panic!("Expected history list"),
        }

        let cli = Cli::try_parse_from(["tagvault", "history", "undo", "-n", "2"]).unwrap();
        match cli.command {
            Commands::History { action: HistoryCommands::Undo { count, dry_run } } => {
                assert_eq!(count, 2);
                assert!(!dry_run);
            }
            _ => panic!("Expected history undo"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_init_creates_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        run_init(Some(dir.path().to_path_buf()), false).unwrap();

        assert!(dir.path().join("vault").is_dir());
        assert!(dir.path().join("originals").is_dir());
        assert!(dir.path().join("inbox").is_dir());
        let store = ProfileStore::load(&dir.path().join("tagvault.json")).unwrap();
        assert!(store.active().unwrap().vault.path.ends_with("vault"));

        assert!(run_init(Some(dir.path().to_path_buf()), false).is_err());
        assert!(run_init(Some(dir.path().to_path_buf()), true).is_ok());
    }
}
