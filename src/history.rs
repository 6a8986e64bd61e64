//! Shell-history ingestion.
//!
//! Adapters parse zsh extended history and bash timestamped history into a
//! flat sequence of `(command, optional timestamp)` records; ingestion
//! aggregates that sequence into the command store in a single reverse
//! pass, so the first sighting of each command wins the latest-timestamp
//! slot without a comparison.
//!
//! Zsh lines look like `: 1673291850:0;ls -la`; anything without that
//! metadata prefix is a bare command with no timestamp. Bash writes the
//! epoch on its own `#`-prefixed line that applies to exactly the next
//! command line.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use directories::BaseDirs;

use crate::store::{CommandMetadata, CommandStore};

/// One raw history record as produced by a shell adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Parse zsh extended history.
///
/// A metadata line splits on the first two `:` into the epoch field, then
/// the remainder splits on the first `;` into return-status and command.
/// Lines that fail to parse degrade to bare commands rather than being
/// dropped.
pub fn parse_zsh_history<R: BufRead>(reader: R) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line.context("failed to read zsh history line")?;

        if !line.starts_with(": ") {
            entries.push(HistoryEntry {
                command: line,
                timestamp: None,
            });
            continue;
        }

        let mut parts = line.splitn(3, ':');
        let _empty = parts.next();
        let epoch_field = parts.next();
        let rest = parts.next();

        let (Some(epoch_field), Some(rest)) = (epoch_field, rest) else {
            continue;
        };

        let Ok(epoch) = epoch_field.trim().parse::<i64>() else {
            entries.push(HistoryEntry {
                command: line,
                timestamp: None,
            });
            continue;
        };
        let timestamp = Utc.timestamp_opt(epoch, 0).single();

        // rest is "<status>;<command>"
        let command = match rest.split_once(';') {
            Some((_status, command)) => command.to_string(),
            None => String::new(),
        };

        entries.push(HistoryEntry { command, timestamp });
    }

    Ok(entries)
}

/// Parse bash history with optional `HISTTIMEFORMAT` epoch lines.
///
/// Each `#<epoch>` line arms a timestamp consumed by exactly the next
/// command line; commands without a preceding epoch line carry none.
pub fn parse_bash_history<R: BufRead>(reader: R) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    let mut pending: Option<DateTime<Utc>> = None;

    for line in reader.lines() {
        let line = line.context("failed to read bash history line")?;

        if let Some(stripped) = line.strip_prefix('#') {
            pending = stripped
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single());
            continue;
        }

        entries.push(HistoryEntry {
            command: line,
            timestamp: pending.take(),
        });
    }

    Ok(entries)
}

/// Populate the store from a record sequence.
///
/// Single reverse pass: frequency accumulates per distinct command, and the
/// first observation in reverse order fixes the most recent timestamp.
/// Records with empty commands or missing timestamps are ignored. Ingesting
/// the same sequence into a fresh store is idempotent.
pub fn populate_store(store: &mut CommandStore, entries: &[HistoryEntry]) {
    let mut frequency: HashMap<&str, usize> = HashMap::with_capacity(entries.len() / 4 + 1);
    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::with_capacity(entries.len() / 4 + 1);

    for entry in entries.iter().rev() {
        let Some(timestamp) = entry.timestamp else {
            continue;
        };
        if entry.command.is_empty() {
            continue;
        }

        *frequency.entry(entry.command.as_str()).or_insert(0) += 1;
        latest.entry(entry.command.as_str()).or_insert(timestamp);
    }

    for (command, count) in frequency {
        store.insert(CommandMetadata {
            command: command.to_string(),
            last_seen: latest.get(command).copied(),
            frequency: count,
        });
    }
}

/// Name of the user's shell from `$SHELL`, defaulting to bash when unset.
pub fn detect_shell() -> String {
    match std::env::var("SHELL") {
        Ok(path) => PathBuf::from(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bash".to_string()),
        Err(_) => "bash".to_string(),
    }
}

/// Read and ingest the current shell's history file into a fresh store.
pub fn load_store_from_shell() -> Result<CommandStore> {
    let shell = detect_shell();
    let entries = match shell.as_str() {
        "zsh" => read_history_file(".zsh_history", parse_zsh_history)?,
        "bash" => read_history_file(".bash_history", parse_bash_history)?,
        other => bail!("unsupported shell: {other}"),
    };

    let mut store = CommandStore::new();
    populate_store(&mut store, &entries);
    Ok(store)
}

fn read_history_file<F>(file_name: &str, parse: F) -> Result<Vec<HistoryEntry>>
where
    F: Fn(std::io::BufReader<std::fs::File>) -> Result<Vec<HistoryEntry>>,
{
    let base = BaseDirs::new().context("failed to determine home directory")?;
    let path = base.home_dir().join(file_name);

    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            bail!(
                "history file not found: {}. Run some commands in your shell to create it, then try again",
                path.display()
            );
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to open history file: {}", path.display()));
        }
    };

    parse(std::io::BufReader::new(file))
}
