//! External process runner.
//!
//! Every help strategy that shells out goes through this runner: child
//! stdout and stderr drain into one shared sink capped at 1 MiB (bytes past
//! the cap are dropped and a truncation footer is appended), and a deadline
//! kills the child if it has not exited in time; whatever the sink captured
//! before the kill still comes back with the failure. The runner keeps
//! reading past the cap so a chatty child never blocks on a full pipe.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const GIT_TIMEOUT: Duration = Duration::from_secs(15);

pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;
const TRUNCATION_FOOTER: &str = "\n[OUTPUT TRUNCATED - Size limit exceeded]";

#[derive(Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run with the default 30-second deadline.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        self.run_with(DEFAULT_TIMEOUT, program, args, &[]).await
    }

    /// Run with an explicit deadline and extra environment pairs on top of
    /// the inherited environment.
    ///
    /// Success returns the merged output (with the truncation footer when
    /// the cap was hit). A non-zero exit becomes an error carrying whatever
    /// the child printed; a deadline overrun kills the child and errors
    /// with the partial output captured up to the kill.
    pub async fn run_with(
        &self,
        timeout: Duration,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<String> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in env {
            command.env(key, value);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdout of {program}"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("failed to capture stderr of {program}"))?;

        let sink = Arc::new(Mutex::new(OutputSink::new(MAX_OUTPUT_BYTES)));
        // None means the deadline expired and the child was killed.
        let status = {
            let waited = async {
                tokio::join!(
                    drain(stdout, Arc::clone(&sink)),
                    drain(stderr, Arc::clone(&sink)),
                );
                child.wait().await
            };

            match tokio::time::timeout(timeout, waited).await {
                Ok(status) => {
                    Some(status.with_context(|| format!("failed to wait for {program}"))?)
                }
                Err(_) => {
                    child.start_kill().ok();
                    let _ = child.wait().await;
                    None
                }
            }
        };

        let (bytes, truncated) = {
            let sink = match sink.lock() {
                Ok(sink) => sink,
                Err(poisoned) => poisoned.into_inner(),
            };
            (sink.bytes.clone(), sink.truncated)
        };

        let mut output = String::from_utf8_lossy(&bytes).into_owned();
        if truncated {
            output.push_str(TRUNCATION_FOOTER);
        }

        match status {
            Some(status) if status.success() => Ok(output),
            Some(status) => {
                if output.trim().is_empty() {
                    Err(anyhow!("{program} exited with {status}"))
                } else {
                    Err(anyhow!(output))
                }
            }
            None => {
                if output.trim().is_empty() {
                    Err(anyhow!("{program} timed out after {}s", timeout.as_secs()))
                } else {
                    Err(anyhow!(
                        "{program} timed out after {}s; partial output:\n{output}",
                        timeout.as_secs()
                    ))
                }
            }
        }
    }

    /// Quietly check whether a command succeeds within the probe deadline.
    pub async fn probe(&self, program: &str, args: &[&str]) -> bool {
        self.run_with(PROBE_TIMEOUT, program, args, &[]).await.is_ok()
    }

    /// `which`-based existence check for a command.
    pub async fn command_exists(&self, command: &str) -> bool {
        self.probe("which", &[command]).await
    }
}

struct OutputSink {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl OutputSink {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, data: &[u8]) {
        if self.bytes.len() >= self.limit {
            self.truncated = true;
            return;
        }
        let room = self.limit - self.bytes.len();
        let take = room.min(data.len());
        self.bytes.extend_from_slice(&data[..take]);
        if take < data.len() {
            self.truncated = true;
        }
    }
}

async fn drain(mut stream: impl AsyncReadExt + Unpin, sink: Arc<Mutex<OutputSink>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let mut sink = match sink.lock() {
                    Ok(sink) => sink,
                    Err(poisoned) => poisoned.into_inner(),
                };
                sink.push(&chunk[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let runner = ProcessRunner::new();
        let out = runner.run("echo", &["hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn merges_stderr_into_the_sink() {
        let runner = ProcessRunner::new();
        let out = runner
            .run("sh", &["-c", "echo to-stderr 1>&2"])
            .await
            .unwrap();
        assert_eq!(out.trim(), "to-stderr");
    }

    #[tokio::test]
    async fn failure_with_output_carries_the_output() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("sh", &["-c", "echo broken; exit 3"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn deadline_kills_slow_commands() {
        let runner = ProcessRunner::new();
        let err = runner
            .run_with(Duration::from_millis(200), "sleep", &["5"], &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn deadline_overrun_preserves_partial_output() {
        let runner = ProcessRunner::new();
        let err = runner
            .run_with(
                Duration::from_millis(500),
                "sh",
                &["-c", "echo partial-result; sleep 5"],
                &[],
            )
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("timed out"));
        assert!(message.contains("partial-result"));
    }

    #[tokio::test]
    async fn oversized_output_is_capped_with_a_footer() {
        let runner = ProcessRunner::new();
        // ~2 MiB of zeroes through head to bound the test.
        let out = runner
            .run("sh", &["-c", "head -c 2097152 /dev/zero | tr '\\0' 'a'"])
            .await
            .unwrap();
        assert!(out.len() <= MAX_OUTPUT_BYTES + TRUNCATION_FOOTER.len());
        assert!(out.ends_with(TRUNCATION_FOOTER));
    }

    #[tokio::test]
    async fn env_pairs_reach_the_child() {
        let runner = ProcessRunner::new();
        let out = runner
            .run_with(
                DEFAULT_TIMEOUT,
                "sh",
                &["-c", "printf '%s' \"$MARKER\""],
                &[("MARKER", "present")],
            )
            .await
            .unwrap();
        assert_eq!(out, "present");
    }

    #[tokio::test]
    async fn which_probe_finds_the_shell() {
        let runner = ProcessRunner::new();
        assert!(runner.command_exists("sh").await);
        assert!(!runner.command_exists("definitely-not-a-real-binary").await);
    }
}
