//! Man-page strategy. Applies to any command whose page `man -w` can
//! locate; minimal environments that print a placeholder instead of a page
//! are treated as not-found.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::text::strip_overstrike;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct ManPageStrategy {
    runner: ProcessRunner,
}

impl ManPageStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for ManPageStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        self.runner.probe("man", &["-w", base_command]).await
    }

    fn priority(&self) -> i32 {
        5
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        let base = request.base();

        match self.runner.run("man", &[base]).await {
            Ok(output) => {
                if output.contains("No manual entry") || output.contains("has been minimized") {
                    bail!("man page not found for {base:?}");
                }
                Ok(strip_overstrike(&output))
            }
            Err(_) => bail!("failed to get man page for {base:?}"),
        }
    }
}
