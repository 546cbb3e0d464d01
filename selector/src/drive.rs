//! Confidence-level driver: select and run tests level by level.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::confidence::ConfidenceLevel;
use crate::core::test_id::TestId;
use crate::exit_codes;
use crate::io::llm::ModelClient;
use crate::io::test_runner::{TestRunOutcome, TestRunner};
use crate::select::Selector;

/// Result of one confidence level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelOutcome {
    Passed {
        level: ConfidenceLevel,
        files: Vec<String>,
        tests: Vec<TestId>,
    },
    /// The model selected no spec files.
    NoFiles { level: ConfidenceLevel },
    /// Files were selected but no test cases inside them.
    NoTests {
        level: ConfidenceLevel,
        files: Vec<String>,
    },
    TestsFailed {
        level: ConfidenceLevel,
        outcome: TestRunOutcome,
    },
}

impl LevelOutcome {
    pub fn level(&self) -> ConfidenceLevel {
        match self {
            Self::Passed { level, .. }
            | Self::NoFiles { level }
            | Self::NoTests { level, .. }
            | Self::TestsFailed { level, .. } => *level,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Level outcomes in the order they were attempted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutcome {
    pub levels: Vec<LevelOutcome>,
}

impl RunOutcome {
    /// The level that stopped the run, if any.
    pub fn failure(&self) -> Option<&LevelOutcome> {
        self.levels.iter().find(|outcome| !outcome.passed())
    }

    /// Process exit code for this run.
    ///
    /// A failed test run keeps the test framework's own code; signals,
    /// timeouts and empty selections map to [`exit_codes::FAILED`].
    pub fn exit_code(&self) -> i32 {
        match self.failure() {
            None => exit_codes::OK,
            Some(LevelOutcome::TestsFailed {
                outcome:
                    TestRunOutcome::Failed {
                        exit_code: Some(code),
                    },
                ..
            }) if *code != 0 => *code,
            Some(_) => exit_codes::FAILED,
        }
    }
}

/// Inputs shared by every level of a run.
pub struct DriveInput<'a> {
    pub diff: &'a str,
    pub spec_files: &'a [String],
}

/// Attempt `levels` in the given order, stopping at the first level that fails.
#[instrument(skip_all, fields(levels = levels.len()))]
pub fn drive<C: ModelClient, R: TestRunner>(
    selector: &Selector<'_, C>,
    runner: &R,
    input: &DriveInput<'_>,
    levels: &[ConfidenceLevel],
) -> Result<RunOutcome> {
    let mut run = RunOutcome::default();
    for &level in levels {
        info!(level = %level, "starting confidence level");
        let outcome = run_level(selector, runner, input, level)?;
        let passed = outcome.passed();
        report(&outcome);
        run.levels.push(outcome);
        if !passed {
            break;
        }
    }
    Ok(run)
}

fn run_level<C: ModelClient, R: TestRunner>(
    selector: &Selector<'_, C>,
    runner: &R,
    input: &DriveInput<'_>,
    level: ConfidenceLevel,
) -> Result<LevelOutcome> {
    let files = selector.select_files(level, input.diff, input.spec_files)?;
    if files.is_empty() {
        return Ok(LevelOutcome::NoFiles { level });
    }
    let tests = selector.select_tests(level, input.diff, &files)?;
    if tests.is_empty() {
        return Ok(LevelOutcome::NoTests { level, files });
    }
    let outcome = runner.run(&tests)?;
    if !outcome.passed() {
        return Ok(LevelOutcome::TestsFailed { level, outcome });
    }
    Ok(LevelOutcome::Passed {
        level,
        files,
        tests,
    })
}

fn report(outcome: &LevelOutcome) {
    match outcome {
        LevelOutcome::Passed {
            level,
            files,
            tests,
        } => info!(
            level = %level,
            files = files.len(),
            tests = tests.len(),
            "confidence level passed"
        ),
        LevelOutcome::NoFiles { level } => {
            warn!(level = %level, "no spec files selected");
        }
        LevelOutcome::NoTests { level, files } => {
            warn!(level = %level, files = files.len(), "no test cases selected");
        }
        LevelOutcome::TestsFailed { level, outcome } => {
            warn!(level = %level, outcome = ?outcome, "selected tests failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_follows_first_failure() {
        let passed = LevelOutcome::Passed {
            level: ConfidenceLevel::P80,
            files: Vec::new(),
            tests: Vec::new(),
        };
        assert_eq!(RunOutcome::default().exit_code(), exit_codes::OK);

        let run = RunOutcome {
            levels: vec![
                passed.clone(),
                LevelOutcome::TestsFailed {
                    level: ConfidenceLevel::P95,
                    outcome: TestRunOutcome::Failed { exit_code: Some(42) },
                },
            ],
        };
        assert_eq!(run.exit_code(), 42);
        assert_eq!(run.failure().map(LevelOutcome::level), Some(ConfidenceLevel::P95));

        let run = RunOutcome {
            levels: vec![LevelOutcome::TestsFailed {
                level: ConfidenceLevel::P80,
                outcome: TestRunOutcome::Failed { exit_code: None },
            }],
        };
        assert_eq!(run.exit_code(), exit_codes::FAILED);

        let run = RunOutcome {
            levels: vec![passed, LevelOutcome::NoFiles {
                level: ConfidenceLevel::P95,
            }],
        };
        assert_eq!(run.exit_code(), exit_codes::FAILED);
    }
}
