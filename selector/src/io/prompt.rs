//! Prompt rendering for the two selection requests.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::confidence::ConfidenceLevel;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const FILE_SELECTION_TEMPLATE: &str = include_str!("prompts/file_selection.md");
const CASE_SELECTION_TEMPLATE: &str = include_str!("prompts/case_selection.md");

const FILE_ANSWER_RULE: &str =
    "Every entry must be a path copied exactly from the <spec_files> list.";
const CASE_ANSWER_RULE: &str =
    "Every entry must be `path:line`, where path is one of the <file> paths and line is a numbered line of that file.";

/// A system instruction and user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// A selected spec file with its line-numbered contents.
#[derive(Debug, Clone, Serialize)]
pub struct NumberedFile {
    pub path: String,
    pub numbered: String,
}

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)?;
        env.add_template("file_selection", FILE_SELECTION_TEMPLATE)?;
        env.add_template("case_selection", CASE_SELECTION_TEMPLATE)?;
        Ok(Self { env })
    }

    fn render_system(&self, level: ConfidenceLevel, answer_rule: &str) -> Result<String> {
        let template = self.env.get_template("system")?;
        Ok(template.render(context! {
            level => level.as_str(),
            level_description => level.description(),
            answer_rule => answer_rule,
        })?)
    }
}

/// Renders selection prompts with the diff held to a byte budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    diff_budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(diff_budget_bytes: usize) -> Self {
        Self { diff_budget_bytes }
    }

    /// Prompt asking which spec files to run.
    pub fn file_selection(
        &self,
        level: ConfidenceLevel,
        diff: &str,
        candidates: &[String],
    ) -> Result<Prompt> {
        let engine = PromptEngine::new()?;
        let user = engine
            .env
            .get_template("file_selection")?
            .render(context! {
                level => level.as_str(),
                diff => truncate_diff(diff, self.diff_budget_bytes),
                candidates => candidates,
            })?;
        let system = engine.render_system(level, FILE_ANSWER_RULE)?;
        debug!(level = %level, user_bytes = user.len(), "rendered file selection prompt");
        Ok(Prompt { system, user })
    }

    /// Prompt asking which test cases inside the selected files to run.
    pub fn case_selection(
        &self,
        level: ConfidenceLevel,
        diff: &str,
        files: &[NumberedFile],
    ) -> Result<Prompt> {
        let engine = PromptEngine::new()?;
        let user = engine
            .env
            .get_template("case_selection")?
            .render(context! {
                level => level.as_str(),
                diff => truncate_diff(diff, self.diff_budget_bytes),
                files => files,
            })?;
        let system = engine.render_system(level, CASE_ANSWER_RULE)?;
        debug!(level = %level, user_bytes = user.len(), "rendered case selection prompt");
        Ok(Prompt { system, user })
    }
}

/// Cut `diff` to at most `budget` bytes on a char boundary, noting what was dropped.
fn truncate_diff(diff: &str, budget: usize) -> String {
    let diff = diff.trim_end();
    if diff.len() <= budget {
        return diff.to_string();
    }
    let mut cut = budget;
    while !diff.is_char_boundary(cut) {
        cut -= 1;
    }
    debug!(before_len = diff.len(), after_len = cut, "truncated diff for budget");
    format!(
        "{}\n[diff truncated {} bytes]",
        &diff[..cut],
        diff.len() - cut
    )
}
