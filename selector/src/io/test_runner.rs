//! Test framework adapter (`bundle exec rspec` by default).

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::test_id::TestId;

/// How a test run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestRunOutcome {
    Passed,
    /// Non-zero exit. `None` when the process was killed by a signal.
    Failed { exit_code: Option<i32> },
    TimedOut,
}

impl TestRunOutcome {
    pub fn passed(self) -> bool {
        self == Self::Passed
    }
}

pub trait TestRunner {
    fn run(&self, tests: &[TestId]) -> Result<TestRunOutcome>;
}

/// Runs a configured command with the identifiers appended as arguments.
///
/// Output is inherited so test progress shows up directly in the terminal.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    workdir: PathBuf,
    command: Vec<String>,
    timeout: Duration,
}

impl CommandTestRunner {
    pub fn new(workdir: impl Into<PathBuf>, command: Vec<String>, timeout: Duration) -> Self {
        Self {
            workdir: workdir.into(),
            command,
            timeout,
        }
    }

    fn build_command(&self, tests: &[TestId]) -> Result<Command> {
        let (program, base_args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("test command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(base_args)
            .args(tests.iter().map(TestId::to_string))
            .current_dir(&self.workdir)
            .stdin(Stdio::null());
        Ok(cmd)
    }
}

impl TestRunner for CommandTestRunner {
    #[instrument(skip_all, fields(count = tests.len()))]
    fn run(&self, tests: &[TestId]) -> Result<TestRunOutcome> {
        info!(command = %self.command.join(" "), "running selected tests");
        let mut child = self
            .build_command(tests)?
            .spawn()
            .with_context(|| format!("spawn {}", self.command.join(" ")))?;

        let status = match child
            .wait_timeout(self.timeout)
            .context("wait for test command")?
        {
            Some(status) => status,
            None => {
                warn!(timeout_secs = self.timeout.as_secs(), "tests timed out, killing");
                child.kill().context("kill test command")?;
                child.wait().context("wait test command after kill")?;
                return Ok(TestRunOutcome::TimedOut);
            }
        };

        if status.success() {
            Ok(TestRunOutcome::Passed)
        } else {
            Ok(TestRunOutcome::Failed {
                exit_code: status.code(),
            })
        }
    }
}
