//! Git adapter for diff collection and spec enumeration.

use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Changes staged in the index (`git diff --cached`).
    #[instrument(skip_all)]
    pub fn diff_staged(&self) -> Result<String> {
        let out = self.run_capture(&["diff", "--cached", "--no-color", "--no-ext-diff"])?;
        debug!(bytes = out.len(), "staged diff");
        Ok(out)
    }

    /// Changes in the worktree not yet staged (`git diff`).
    #[instrument(skip_all)]
    pub fn diff_unstaged(&self) -> Result<String> {
        let out = self.run_capture(&["diff", "--no-color", "--no-ext-diff"])?;
        debug!(bytes = out.len(), "unstaged diff");
        Ok(out)
    }

    /// Tracked files under `dir`, one path per entry, relative to the repository root.
    #[instrument(skip_all, fields(dir))]
    pub fn ls_files(&self, dir: &str) -> Result<Vec<String>> {
        let out = self.run_capture(&["ls-files", "--full-name", "--", dir])?;
        Ok(path_lines(&out))
    }

    /// Tracked files under `dir` that are missing from the worktree.
    #[instrument(skip_all, fields(dir))]
    pub fn ls_deleted(&self, dir: &str) -> Result<Vec<String>> {
        let out = self.run_capture(&["ls-files", "--deleted", "--full-name", "--", dir])?;
        Ok(path_lines(&out))
    }

    /// Stage all changes (respects .gitignore).
    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"])?;
        Ok(())
    }

    /// Commit staged changes with a message.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-q", "-m", message])?;
        Ok(())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

fn path_lines(out: &str) -> Vec<String> {
    out.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
