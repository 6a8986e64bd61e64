//! Progress reporting for long-running index operations.
//!
//! Indexing, refreshing, and cleanup can touch hundreds of thousands of
//! paths; these reporters let the CLI show what is happening without the
//! library printing anything on its own. Progress goes to **stderr** so
//! stdout stays parseable.

use std::io::Write;

/// A single progress event from an index operation.
#[derive(Clone, Debug)]
pub enum IndexEvent {
    /// A directory walk started under this root.
    Walking { root: String },
    /// Running total of entries visited across the current operation.
    Visited { total: u64 },
    /// The configured file cap stopped the walk early.
    LimitReached { cap: usize },
    /// The index is being written to disk.
    Persisting,
    /// The operation finished with this many entries visited.
    Finished { total: u64 },
}

/// Receives progress events. Implementations write to stderr.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IndexEvent);
}

/// Human-friendly one-line updates on stderr.
pub struct StderrProgress;

/// How often `Visited` events are worth printing.
const VISIT_STRIDE: u64 = 1000;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IndexEvent) {
        let line = match &event {
            IndexEvent::Walking { root } => format!("indexing {root}...\n"),
            IndexEvent::Visited { total } => {
                if total % VISIT_STRIDE != 0 {
                    return;
                }
                format!("  {total} entries\n")
            }
            IndexEvent::LimitReached { cap } => {
                format!("warning: max indexed files limit reached ({cap})\n")
            }
            IndexEvent::Persisting => "saving index to disk...\n".to_string(),
            IndexEvent::Finished { total } => format!("done: {total} entries\n"),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IndexEvent) {}
}

/// Progress mode for the CLI: off, or human-readable on stderr.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
        }
    }
}
