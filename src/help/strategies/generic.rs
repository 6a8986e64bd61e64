//! Generic fallback strategy for any command on `$PATH`. Tries the common
//! help spellings in order; the first non-empty success wins.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::HelpRequest;

use super::HelpStrategy;

const HELP_FLAGS: [&str; 3] = ["-h", "--help", "help"];

pub struct GenericHelpStrategy {
    runner: ProcessRunner,
}

impl GenericHelpStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for GenericHelpStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        self.runner.command_exists(base_command).await
    }

    fn priority(&self) -> i32 {
        8
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        for flag in HELP_FLAGS {
            let mut args: Vec<&str> = request.subs().iter().map(String::as_str).collect();
            args.push(flag);

            if let Ok(output) = self.runner.run(request.base(), &args).await {
                if !output.is_empty() {
                    return Ok(output);
                }
            }
        }

        bail!("no help found for {:?}", request.full_name());
    }
}
