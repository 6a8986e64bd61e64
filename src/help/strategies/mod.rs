//! Help-text acquisition strategies.
//!
//! Each strategy pairs an admissibility check with a fetch routine for one
//! documentation source. The dispatcher tries the documentation site first
//! and then every supporting strategy in registration order; `priority` is
//! recorded on each strategy but dispatch deliberately does not re-sort by
//! it, matching the long-standing observable behavior.

pub mod aws;
pub mod cargo;
pub mod docker;
pub mod docs;
pub mod generic;
pub mod git;
pub mod go;
pub mod kubectl;
pub mod man;
pub mod npm;

use async_trait::async_trait;

use super::HelpRequest;

/// One documentation source plus the logic for whether it applies.
#[async_trait]
pub trait HelpStrategy: Send + Sync {
    /// Cheap admissibility check for a base command. May probe the
    /// environment (`which`, `man -w`) but must finish within the probe
    /// deadline.
    async fn supports(&self, base_command: &str) -> bool;

    /// Lower is higher priority. Advisory only: the dispatcher preserves
    /// registration order among supporting strategies.
    fn priority(&self) -> i32;

    /// Produce help text for the command, or fail so the dispatcher moves
    /// on to the next strategy.
    async fn fetch(&self, request: &HelpRequest) -> anyhow::Result<String>;
}
