//! Pull-request diff via the GitHub CLI.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::io::process::run_command_with_timeout;

const GH_TIMEOUT: Duration = Duration::from_secs(120);
const GH_OUTPUT_LIMIT_BYTES: usize = 50_000_000;

/// Source of the diff for the pull request open on the current branch.
pub trait PullRequestDiff {
    /// Unified diff of the open pull request, or an empty string if there is none.
    fn pr_diff(&self) -> Result<String>;
}

/// `gh pr diff` in a working directory.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
}

impl GhCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("gh"),
            workdir: workdir.into(),
            timeout: GH_TIMEOUT,
        }
    }

    /// Use another executable in place of `gh`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PullRequestDiff for GhCli {
    #[instrument(skip_all)]
    fn pr_diff(&self) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["pr", "diff", "--color", "never"])
            .current_dir(&self.workdir)
            .env("GH_PROMPT_DISABLED", "1");
        let output = run_command_with_timeout(cmd, self.timeout, GH_OUTPUT_LIMIT_BYTES)
            .context("run gh pr diff")?;

        if output.timed_out {
            return Err(anyhow!("gh pr diff timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            // No pull request for this branch (or not authenticated): nothing to add.
            debug!(stderr = %output.stderr_lossy(), "no pull request diff");
            return Ok(String::new());
        }
        if output.stdout_truncated > 0 {
            return Err(anyhow!(
                "gh pr diff exceeded {GH_OUTPUT_LIMIT_BYTES} bytes"
            ));
        }
        let diff = output.stdout_lossy();
        debug!(bytes = diff.len(), "pull request diff");
        Ok(diff)
    }
}
