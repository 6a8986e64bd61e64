//! Npm help strategy. `npm help <sub>` renders man-style output that needs
//! overstrike stripping; when it fails, `npm <sub> --help` usually works.

use anyhow::Result;
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::text::strip_overstrike;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct NpmStrategy {
    runner: ProcessRunner,
}

impl NpmStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for NpmStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        base_command == "npm"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        let Some(sub) = request.sub(0) else {
            return self.runner.run("npm", &["help"]).await;
        };

        if let Ok(output) = self.runner.run("npm", &["help", sub]).await {
            return Ok(strip_overstrike(&output));
        }

        self.runner.run("npm", &[sub, "--help"]).await
    }
}
