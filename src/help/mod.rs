//! Help-text acquisition.
//!
//! Given a parsed command, the dispatcher returns help text from the best
//! available source within bounded time and output size:
//!
//! 1. The **documentation site** strategy runs unconditionally; a non-empty
//!    page wins outright.
//! 2. Otherwise every registered strategy whose `supports` check passes is
//!    tried **in registration order** (tool-specific helpers first, then man
//!    pages, then the generic `--help` fallback). The first non-empty
//!    success wins.
//! 3. When every attempt fails the last error surfaces as
//!    [`RecallerError::StrategyFailed`]; when nothing supported the command
//!    at all, [`RecallerError::NoStrategy`].
//!
//! One strategy's failure is never propagated to another: each is discarded
//! in favor of the next attempt. Construct a single dispatcher at startup
//! and hand references down; nothing here is a global.

pub mod cache;
pub mod runner;
pub mod strategies;
pub mod text;

pub use cache::HelpCache;
pub use runner::ProcessRunner;

use crate::error::RecallerError;

use strategies::aws::AwsStrategy;
use strategies::cargo::CargoStrategy;
use strategies::docker::DockerStrategy;
use strategies::docs::DocsStrategy;
use strategies::generic::GenericHelpStrategy;
use strategies::git::GitStrategy;
use strategies::go::GoStrategy;
use strategies::kubectl::KubectlStrategy;
use strategies::man::ManPageStrategy;
use strategies::npm::NpmStrategy;
use strategies::HelpStrategy;

/// A command split into its base command and sub-tokens.
#[derive(Debug, Clone)]
pub struct HelpRequest {
    tokens: Vec<String>,
}

impl HelpRequest {
    pub fn new(tokens: &[String]) -> Self {
        Self {
            tokens: tokens.to_vec(),
        }
    }

    pub fn base(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or("")
    }

    pub fn subs(&self) -> &[String] {
        if self.tokens.is_empty() {
            &[]
        } else {
            &self.tokens[1..]
        }
    }

    /// At least `n` sub-tokens present?
    pub fn has_subs(&self, n: usize) -> bool {
        self.subs().len() >= n
    }

    /// The nth sub-token, zero-indexed.
    pub fn sub(&self, n: usize) -> Option<&str> {
        self.subs().get(n).map(String::as_str)
    }

    pub fn full_name(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Ordered strategy registry.
pub struct HelpDispatcher {
    primary: Box<dyn HelpStrategy>,
    fallbacks: Vec<Box<dyn HelpStrategy>>,
}

impl Default for HelpDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpDispatcher {
    /// The standard registry: documentation site as the unconditional
    /// primary, then tool-specific strategies, man pages, and the generic
    /// fallback, in that order.
    pub fn new() -> Self {
        let runner = ProcessRunner::new();

        let mut dispatcher = Self::with_primary(Box::new(DocsStrategy::new()));
        dispatcher.register(Box::new(GitStrategy::new(runner)));
        dispatcher.register(Box::new(GoStrategy::new(runner)));
        dispatcher.register(Box::new(KubectlStrategy::new(runner)));
        dispatcher.register(Box::new(CargoStrategy::new(runner)));
        dispatcher.register(Box::new(NpmStrategy::new(runner)));
        dispatcher.register(Box::new(AwsStrategy::new(runner)));
        dispatcher.register(Box::new(DockerStrategy::new(runner)));
        dispatcher.register(Box::new(ManPageStrategy::new(runner)));
        dispatcher.register(Box::new(GenericHelpStrategy::new(runner)));
        dispatcher
    }

    /// An empty registry with only the unconditional primary strategy.
    pub fn with_primary(primary: Box<dyn HelpStrategy>) -> Self {
        Self {
            primary,
            fallbacks: Vec::new(),
        }
    }

    /// Append a fallback strategy. Dispatch order follows registration
    /// order, not priority.
    pub fn register(&mut self, strategy: Box<dyn HelpStrategy>) {
        self.fallbacks.push(strategy);
    }

    /// Resolve help text for a tokenized command.
    pub async fn dispatch(&self, tokens: &[String]) -> Result<String, RecallerError> {
        if tokens.is_empty() {
            return Err(RecallerError::NoInput);
        }
        let request = HelpRequest::new(tokens);

        if let Ok(page) = self.primary.fetch(&request).await {
            if !page.trim().is_empty() {
                return Ok(page);
            }
        }

        let mut supported = Vec::new();
        for strategy in &self.fallbacks {
            if strategy.supports(request.base()).await {
                supported.push(strategy);
            }
        }

        if supported.is_empty() {
            return Err(RecallerError::NoStrategy(request.full_name()));
        }

        let mut last_error = None;
        for strategy in supported {
            match strategy.fetch(&request).await {
                Ok(help) if !help.trim().is_empty() => return Ok(help),
                Ok(_) => continue,
                Err(err) => last_error = Some(err),
            }
        }

        Err(RecallerError::StrategyFailed {
            command: request.full_name(),
            cause: last_error
                .unwrap_or_else(|| anyhow::anyhow!("no strategy produced help text")),
        })
    }

    /// Cache-fronted dispatch: a fresh cached page short-circuits the
    /// strategies, and successful lookups refresh the cache.
    pub async fn dispatch_cached(
        &self,
        cache: &HelpCache,
        tokens: &[String],
    ) -> Result<String, RecallerError> {
        let key = tokens.join(" ");
        let cached = cache.get(&key);
        if !cached.is_empty() {
            return Ok(cached);
        }

        let help = self.dispatch(tokens).await?;
        if !help.is_empty() {
            cache.set(&key, &help);
        }
        Ok(help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubStrategy {
        base: &'static str,
        result: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl HelpStrategy for StubStrategy {
        async fn supports(&self, base_command: &str) -> bool {
            base_command == self.base
        }

        fn priority(&self) -> i32 {
            2
        }

        async fn fetch(&self, _request: &HelpRequest) -> anyhow::Result<String> {
            match self.result {
                Ok(text) => Ok(text.to_string()),
                Err(message) => Err(anyhow::anyhow!(message)),
            }
        }
    }

    struct FailingPrimary;

    #[async_trait]
    impl HelpStrategy for FailingPrimary {
        async fn supports(&self, _base_command: &str) -> bool {
            true
        }

        fn priority(&self) -> i32 {
            0
        }

        async fn fetch(&self, _request: &HelpRequest) -> anyhow::Result<String> {
            anyhow::bail!("network down")
        }
    }

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn request_splits_base_and_subs() {
        let request = HelpRequest::new(&tokens(&["git", "remote", "add"]));
        assert_eq!(request.base(), "git");
        assert_eq!(request.subs().len(), 2);
        assert!(request.has_subs(2));
        assert!(!request.has_subs(3));
        assert_eq!(request.sub(0), Some("remote"));
        assert_eq!(request.sub(5), None);
        assert_eq!(request.full_name(), "git remote add");
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        let err = dispatcher.dispatch(&[]).await.unwrap_err();
        assert!(matches!(err, RecallerError::NoInput));
    }

    #[tokio::test]
    async fn fallback_answers_when_the_primary_fails() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("HELP"),
        }));

        let help = dispatcher.dispatch(&tokens(&["git", "status"])).await.unwrap();
        assert_eq!(help, "HELP");
    }

    #[tokio::test]
    async fn all_failures_surface_as_strategy_failed() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Err("git help broke"),
        }));

        let err = dispatcher.dispatch(&tokens(&["git", "status"])).await.unwrap_err();
        assert!(matches!(err, RecallerError::StrategyFailed { .. }));
        assert!(err.to_string().contains("git status"));
    }

    #[tokio::test]
    async fn unsupported_commands_surface_no_strategy() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("HELP"),
        }));

        let err = dispatcher
            .dispatch(&tokens(&["unknown-tool"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallerError::NoStrategy(_)));
    }

    #[tokio::test]
    async fn registration_order_decides_among_supporting_strategies() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("FIRST"),
        }));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("SECOND"),
        }));

        let help = dispatcher.dispatch(&tokens(&["git"])).await.unwrap();
        assert_eq!(help, "FIRST");
    }

    #[tokio::test]
    async fn empty_successes_fall_through_to_the_next_strategy() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok(""),
        }));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("REAL"),
        }));

        let help = dispatcher.dispatch(&tokens(&["git"])).await.unwrap();
        assert_eq!(help, "REAL");
    }

    #[tokio::test]
    async fn cached_dispatch_reuses_prior_results() {
        let mut dispatcher = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        dispatcher.register(Box::new(StubStrategy {
            base: "git",
            result: Ok("HELP"),
        }));

        let cache = HelpCache::new();
        let command = tokens(&["git", "status"]);
        let first = dispatcher.dispatch_cached(&cache, &command).await.unwrap();
        assert_eq!(first, "HELP");
        assert_eq!(cache.get("git status"), "HELP");

        // A cache hit answers even if every strategy would now fail.
        let empty = HelpDispatcher::with_primary(Box::new(FailingPrimary));
        let again = empty.dispatch_cached(&cache, &command).await.unwrap();
        assert_eq!(again, "HELP");
    }
}
