//! Core error kinds.
//!
//! Most fallible functions in this crate return `anyhow::Result` with one of
//! these variants at the root, so callers that care can distinguish them via
//! `downcast_ref::<RecallerError>()` while everything else flows through the
//! usual `?` chain.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecallerError {
    /// The help dispatcher was invoked with an empty command list.
    #[error("no command provided")]
    NoInput,

    /// No registered help strategy supported the command.
    #[error("no help strategy found for command {0:?}")]
    NoStrategy(String),

    /// Every supporting strategy was tried and failed; wraps the last error.
    #[error("failed to get help for command {command:?}: {cause}")]
    StrategyFailed {
        command: String,
        cause: anyhow::Error,
    },

    /// The directory walk crossed `max_indexed_files`. Non-fatal: indexing
    /// stops and the partial index remains valid.
    #[error("max indexed files limit reached ({0})")]
    LimitReached(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecallerError {
    /// True for the limit-reached condition, which callers surface as a
    /// warning rather than a failure.
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, RecallerError::LimitReached(_))
    }
}
