//! Git help strategy.
//!
//! `git help <sub>` renders through the pager by default, so the child runs
//! with `GIT_PAGER=cat` and its man-style output is overstrike-stripped.
//! Deep invocations like `git remote add` fall back to `git <subs> --help`.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::help::runner::{ProcessRunner, GIT_TIMEOUT};
use crate::help::text::strip_overstrike;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct GitStrategy {
    runner: ProcessRunner,
}

impl GitStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for GitStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        base_command == "git"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        let Some(sub) = request.sub(0) else {
            return self
                .runner
                .run_with(GIT_TIMEOUT, "git", &["help"], &[])
                .await;
        };

        if let Ok(output) = self
            .runner
            .run_with(GIT_TIMEOUT, "git", &["help", sub], &[("GIT_PAGER", "cat")])
            .await
        {
            return Ok(strip_overstrike(&output));
        }

        // "git config --global" style invocations answer to --help instead.
        if request.has_subs(2) {
            let mut args: Vec<&str> = request.subs().iter().map(String::as_str).collect();
            args.push("--help");
            if let Ok(output) = self.runner.run_with(GIT_TIMEOUT, "git", &args, &[]).await {
                return Ok(strip_overstrike(&output));
            }
        }

        bail!("failed to get git help for {:?}", request.full_name());
    }
}
