//! Go toolchain help strategy.

use anyhow::Result;
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct GoStrategy {
    runner: ProcessRunner,
}

impl GoStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for GoStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        base_command == "go"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        match request.sub(0) {
            Some(sub) => self.runner.run("go", &["help", sub]).await,
            None => self.runner.run("go", &["help"]).await,
        }
    }
}
