//! Kubectl help strategy. Supports arbitrarily nested subcommands by
//! appending `--help` to the full invocation.

use anyhow::Result;
use async_trait::async_trait;

use crate::help::runner::ProcessRunner;
use crate::help::HelpRequest;

use super::HelpStrategy;

pub struct KubectlStrategy {
    runner: ProcessRunner,
}

impl KubectlStrategy {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HelpStrategy for KubectlStrategy {
    async fn supports(&self, base_command: &str) -> bool {
        base_command == "kubectl"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        if !request.has_subs(1) {
            return self.runner.run("kubectl", &["--help"]).await;
        }

        let mut args: Vec<&str> = request.subs().iter().map(String::as_str).collect();
        args.push("--help");
        self.runner.run("kubectl", &args).await
    }
}
