//! Documentation-site strategy.
//!
//! Fetches the community tldr page for a command (and optionally its first
//! subcommand) over HTTPS. Runs unconditionally before every other
//! strategy because the pages are short, practical, and uniform across
//! tools.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::help::HelpRequest;

use super::HelpStrategy;

pub const DOC_BASE_URL: &str =
    "https://raw.githubusercontent.com/tldr-pages/tldr/refs/heads/main/pages/common";

const DOC_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_DOC_BYTES: usize = 512 * 1024;
const DOC_BANNER: &str = "TLDR Documentation:\n\n";

pub struct DocsStrategy {
    base_url: String,
}

impl Default for DocsStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DocsStrategy {
    pub fn new() -> Self {
        Self::with_base_url(DOC_BASE_URL)
    }

    /// Point at a different page root (used by tests to simulate outages).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, request: &HelpRequest) -> String {
        match request.sub(0) {
            Some(sub) => format!("{}/{}-{}.md", self.base_url, request.base(), sub),
            None => format!("{}/{}.md", self.base_url, request.base()),
        }
    }
}

#[async_trait]
impl HelpStrategy for DocsStrategy {
    async fn supports(&self, _base_command: &str) -> bool {
        true
    }

    fn priority(&self) -> i32 {
        0
    }

    async fn fetch(&self, request: &HelpRequest) -> Result<String> {
        let url = self.page_url(request);

        let client = reqwest::Client::builder()
            .timeout(DOC_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch documentation page {url}"))?;

        if response.status() != reqwest::StatusCode::OK {
            bail!(
                "documentation page not found for {} (HTTP {})",
                request.base(),
                response.status()
            );
        }

        let body = response
            .bytes()
            .await
            .context("failed to read documentation page body")?;
        let body = &body[..body.len().min(MAX_DOC_BYTES)];

        let content = String::from_utf8_lossy(body);
        if content.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{DOC_BANNER}{content}"))
    }
}
