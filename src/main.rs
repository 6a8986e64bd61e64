//! # Recaller CLI
//!
//! The `recaller` binary exposes the retrieval backend on the command line:
//! ranked history search, filesystem index management, and command
//! documentation lookup.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recaller history --match <prefix>` | Ranked search over shell history |
//! | `recaller help <command...>` | Fetch documentation for a command |
//! | `recaller fs index [paths...]` | Index directories for filesystem search |
//! | `recaller fs search <query>` | Ranked search over indexed paths |
//! | `recaller fs refresh` | Re-walk every tracked root |
//! | `recaller fs clean` | Remove stale or old index entries |
//! | `recaller settings` | Show the effective configuration |
//!
//! ## Examples
//!
//! ```bash
//! # Rank history entries starting with "git"
//! recaller history --match git
//!
//! # Index the current project and your documents
//! recaller fs index . ~/Documents
//!
//! # Find that notebook you touched last week
//! recaller fs search notes --fuzzy
//!
//! # Documentation for a subcommand
//! recaller help git rebase
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use recaller::config::{self, Config};
use recaller::error::RecallerError;
use recaller::help::cache::HELP_CACHE_SWEEP_INTERVAL;
use recaller::help::{HelpCache, HelpDispatcher};
use recaller::history;
use recaller::index::{CleanupOptions, PathIndex};
use recaller::progress::{ProgressMode, ProgressReporter};
use recaller::timefmt;

/// Recaller — ranked shell-history and filesystem search with instant
/// command documentation.
#[derive(Parser)]
#[command(
    name = "recaller",
    about = "Ranked shell-history and filesystem search with instant command documentation",
    version,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked search over your shell history.
    ///
    /// Ingests the current shell's history file and prints commands ranked
    /// by combined frequency and recency, best first.
    History {
        /// Prefix (or substring, with fuzzy search enabled) to match.
        #[arg(long = "match", default_value = "")]
        query: String,
    },

    /// Fetch documentation for a command.
    ///
    /// Tries the tldr documentation site first, then tool-specific help
    /// (git, go, kubectl, cargo, npm, aws, docker), man pages, and finally
    /// the generic `--help` probe.
    Help {
        /// The command to document, e.g. `git rebase`. A single quoted
        /// argument is split shell-style.
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Filesystem index management and search.
    Fs {
        #[command(subcommand)]
        action: FsAction,
    },

    /// Show the effective configuration.
    Settings,
}

#[derive(Subcommand)]
enum FsAction {
    /// Index one or more directories (default: the current directory).
    Index {
        /// Directories to index.
        paths: Vec<PathBuf>,
    },

    /// Ranked search over indexed paths.
    Search {
        /// Basename prefix to match (or substring anywhere, with --fuzzy).
        query: String,

        /// Match the query as a substring of the basename or full path.
        #[arg(long)]
        fuzzy: bool,
    },

    /// Re-walk every tracked root to pick up new files, then save.
    Refresh,

    /// Remove entries from the index.
    Clean {
        /// Only remove entries under this path prefix.
        path: Option<String>,

        /// Remove entries whose files no longer exist.
        #[arg(long)]
        stale: bool,

        /// Remove entries older than this many days.
        #[arg(long = "older-than", default_value_t = 0)]
        older_than: i64,

        /// Clear the entire index (asks for confirmation).
        #[arg(long)]
        clear: bool,

        /// Report what would be removed without saving anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;

    match cli.command {
        Commands::History { query } => run_history(&config, &query),
        Commands::Help { command } => run_help(command).await,
        Commands::Fs { action } => match action {
            FsAction::Index { paths } => run_fs_index(&config, paths),
            FsAction::Search { query, fuzzy } => run_fs_search(&config, &query, fuzzy),
            FsAction::Refresh => run_fs_refresh(&config),
            FsAction::Clean {
                path,
                stale,
                older_than,
                clear,
                dry_run,
            } => run_fs_clean(&config, path, stale, older_than, clear, dry_run),
        },
        Commands::Settings => run_settings(&config),
    }
}

fn run_history(config: &Config, query: &str) -> Result<()> {
    let store = history::load_store_from_shell()?;
    let ranked = store.search_ranked(query, config.history.enable_fuzzing);

    for hit in ranked {
        println!("{}", hit.command);
    }
    Ok(())
}

async fn run_help(command: Vec<String>) -> Result<()> {
    // `recaller help "git status"` arrives as one token; split it the way a
    // shell would.
    let tokens = if command.len() == 1 && command[0].contains(' ') {
        shell_words::split(&command[0])?
    } else {
        command
    };

    let dispatcher = HelpDispatcher::new();
    let cache = Arc::new(HelpCache::new());
    HelpCache::spawn_eviction(&cache, HELP_CACHE_SWEEP_INTERVAL);

    match dispatcher.dispatch_cached(&cache, &tokens).await {
        Ok(help) => {
            println!("{help}");
            Ok(())
        }
        Err(err @ (RecallerError::NoStrategy(_) | RecallerError::StrategyFailed { .. })) => {
            warn!("{err}");
            println!("No documentation available for {:?}.", tokens.join(" "));
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn progress_for(config: &Config) -> Box<dyn ProgressReporter> {
    if config.quiet {
        ProgressMode::Off.reporter()
    } else {
        ProgressMode::default_for_tty().reporter()
    }
}

fn require_fs_enabled(config: &Config) -> Result<()> {
    if !config.filesystem.enabled {
        bail!(
            "filesystem search is disabled; set `filesystem.enabled = true` in ~/{} to turn it on",
            config::CONFIG_FILE_NAME
        );
    }
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = directories::BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

fn run_fs_index(config: &Config, paths: Vec<PathBuf>) -> Result<()> {
    require_fs_enabled(config)?;

    let requested = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let mut valid = Vec::new();
    for path in &requested {
        let expanded = expand_tilde(&path.to_string_lossy());
        match std::fs::canonicalize(&expanded) {
            Ok(absolute) => valid.push(absolute),
            Err(_) => eprintln!("skipping path that does not exist: {}", expanded.display()),
        }
    }
    if valid.is_empty() {
        bail!("no valid paths to index");
    }

    let reporter = progress_for(config);
    let mut index = PathIndex::new(config.filesystem.clone());
    if let Err(err) = index.load_or_create() {
        warn!("failed to load existing index, starting fresh: {err:#}");
    }

    if let Err(err) = index.index_directories(&valid, reporter.as_ref()) {
        if is_limit_reached(&err) {
            eprintln!(
                "warning: reached the maximum file limit ({} files); partial index kept",
                config.filesystem.max_indexed_files
            );
        } else {
            return Err(err);
        }
    }

    index.persist(reporter.as_ref())?;
    println!("index: {}", index.stats());
    println!("Run 'recaller fs search <query>' to search the index.");
    Ok(())
}

fn run_fs_search(config: &Config, query: &str, fuzzy: bool) -> Result<()> {
    require_fs_enabled(config)?;

    let mut index = PathIndex::new(config.filesystem.clone());
    index.load_or_create()?;

    if index.is_empty() {
        println!("The index is empty. Run 'recaller fs index <path>' first.");
        return Ok(());
    }

    let results = index.search(query, fuzzy);
    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for hit in results {
        let last_access = hit
            .metadata
            .last_access
            .map(|ts| timefmt::format_date(ts.with_timezone(&Local)))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>8.3}  {:10}  {}", hit.score, last_access, hit.path);
    }
    Ok(())
}

fn run_fs_refresh(config: &Config) -> Result<()> {
    require_fs_enabled(config)?;

    let reporter = progress_for(config);
    let mut index = PathIndex::new(config.filesystem.clone());
    index.load_or_create()?;

    match index.refresh(reporter.as_ref()) {
        Ok(()) => {}
        Err(err) if is_limit_reached(&err) => {
            eprintln!(
                "warning: reached the maximum file limit ({} files); partial index saved",
                config.filesystem.max_indexed_files
            );
        }
        Err(err) => return Err(err),
    }

    println!("index: {}", index.stats());
    println!("Refresh completed.");
    Ok(())
}

fn run_fs_clean(
    config: &Config,
    path: Option<String>,
    stale: bool,
    older_than: i64,
    clear: bool,
    dry_run: bool,
) -> Result<()> {
    require_fs_enabled(config)?;

    let reporter = progress_for(config);
    let mut index = PathIndex::new(config.filesystem.clone());
    index.load_or_create()?;

    println!("index: {}", index.stats());
    let file_size = index.index_file_size();
    if file_size > 0 {
        println!("index file: {:.2} KB", file_size as f64 / 1024.0);
    }

    if clear {
        if dry_run {
            println!("[dry run] would clear the entire index ({} entries)", index.len());
            return Ok(());
        }

        print!("This will clear the entire filesystem index. Continue? [y/N]: ");
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        let answer = answer.trim().to_lowercase();
        if answer != "y" && answer != "yes" {
            println!("Cancelled.");
            return Ok(());
        }

        index.clear();
        index.persist(reporter.as_ref())?;
        println!("Index cleared.");
        return Ok(());
    }

    let path_prefix = path.map(|prefix| {
        let expanded = expand_tilde(&prefix);
        std::fs::canonicalize(&expanded)
            .unwrap_or(expanded)
            .to_string_lossy()
            .into_owned()
    });

    let options = CleanupOptions {
        path_prefix,
        remove_stale: stale,
        older_than_days: older_than,
    };
    let stats = index.cleanup(&options);

    println!();
    println!("cleanup results:");
    println!("  total entries:   {}", stats.total_entries);
    if stats.prefix_matches > 0 {
        println!("  prefix matches:  {}", stats.prefix_matches);
    }
    if stats.stale_files > 0 {
        println!("  stale removed:   {}", stats.stale_files);
    }
    if stats.old_files > 0 {
        println!("  old removed:     {}", stats.old_files);
    }
    println!("  total removed:   {}", stats.removed_entries);
    println!("  memory freed:    {:.2} KB", stats.freed_kb);

    if dry_run {
        println!("\n[dry run] nothing was saved; run again without --dry-run to apply.");
    } else if stats.removed_entries > 0 {
        index.persist(reporter.as_ref())?;
        println!("\nindex: {}", index.stats());
    } else {
        println!("\nNothing to clean.");
    }
    Ok(())
}

fn run_settings(config: &Config) -> Result<()> {
    let path = config::config_path()?;

    println!("Recaller — Settings");
    println!("===================");
    println!();
    if path.exists() {
        println!("  config file:  {}", path.display());
    } else {
        println!("  config file:  {} (not found, defaults in effect)", path.display());
    }
    println!();
    println!("  history.enable_fuzzing:        {}", config.history.enable_fuzzing);
    println!("  filesystem.enabled:            {}", config.filesystem.enabled);
    println!(
        "  filesystem.max_indexed_files:  {}",
        config.filesystem.max_indexed_files
    );
    println!(
        "  filesystem.bloom_filter_size:  {}",
        config.filesystem.bloom_filter_size
    );
    println!(
        "  filesystem.bloom_filter_hashes: {}",
        config.filesystem.bloom_filter_hashes
    );
    println!(
        "  filesystem.ignore_patterns:    {}",
        config.filesystem.ignore_patterns.join(", ")
    );
    println!("  quiet:                         {}", config.quiet);
    Ok(())
}

fn is_limit_reached(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RecallerError>()
        .map(RecallerError::is_limit_reached)
        .unwrap_or(false)
}
