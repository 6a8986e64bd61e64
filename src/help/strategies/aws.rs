//! AWS CLI help strategy. The AWS CLI answers `help` at every nesting
//! level (`aws s3 help`, `aws s3 cp help`) with man-style output.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::text::strip_overstrike;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct AwsStrategy {
    runner: ProcessRunner,
}

impl AwsStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for AwsStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        base_command == "aws"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        if !request.has_subs(1) {
            return self.runner.run("aws", &["help"]).await;
        }

        let mut args: Vec<&str> = request.subs().iter().map(String::as_str).collect();
        args.push("help");
        if let Ok(output) = self.runner.run("aws", &args).await {
            return Ok(strip_overstrike(&output));
        }

        bail!(
            "aws command {:?} is invalid or not found",
            request.full_name()
        );
    }
}
