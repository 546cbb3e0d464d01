//! Test-only doubles for the model, the test runner, and git repositories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::test_id::TestId;
use crate::io::gh::PullRequestDiff;
use crate::io::git::Git;
use crate::io::llm::{ModelClient, ModelRequest};
use crate::io::test_runner::{TestRunOutcome, TestRunner};

/// Model double that replays queued answers and records every request.
pub struct ScriptedModel {
    answers: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.borrow().clone()
    }
}

impl ModelClient for ScriptedModel {
    fn complete(&self, request: &ModelRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted model has no answer left"))
    }
}

/// Test runner double that replays queued outcomes and records each invocation.
pub struct ScriptedTestRunner {
    outcomes: RefCell<VecDeque<TestRunOutcome>>,
    runs: RefCell<Vec<Vec<TestId>>>,
}

impl ScriptedTestRunner {
    pub fn new(outcomes: Vec<TestRunOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            runs: RefCell::new(Vec::new()),
        }
    }

    /// Identifiers passed to each run, oldest first.
    pub fn runs(&self) -> Vec<Vec<TestId>> {
        self.runs.borrow().clone()
    }
}

impl TestRunner for ScriptedTestRunner {
    fn run(&self, tests: &[TestId]) -> Result<TestRunOutcome> {
        self.runs.borrow_mut().push(tests.to_vec());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted test runner has no outcome left"))
    }
}

/// Pull-request source returning a fixed diff.
pub struct StaticPrDiff {
    diff: String,
}

impl StaticPrDiff {
    pub fn new(diff: impl Into<String>) -> Self {
        Self { diff: diff.into() }
    }

    /// No pull request open.
    pub fn empty() -> Self {
        Self::new("")
    }
}

impl PullRequestDiff for StaticPrDiff {
    fn pr_diff(&self) -> Result<String> {
        Ok(self.diff.clone())
    }
}

/// Temporary git repository with a committer identity configured.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo dir")?;
        let repo = Self { dir };
        repo.git_cmd(&["init", "-q"])?;
        repo.git_cmd(&["config", "user.email", "selector@example.com"])?;
        repo.git_cmd(&["config", "user.name", "Selector Tests"])?;
        repo.git_cmd(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self) -> Git {
        Git::new(self.path())
    }

    /// Write a file relative to the repository root, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Stage everything and commit.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        let git = self.git();
        git.add_all()?;
        git.commit(message)
    }

    fn git_cmd(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            return Err(anyhow!("git {} failed", args.join(" ")));
        }
        Ok(())
    }
}
