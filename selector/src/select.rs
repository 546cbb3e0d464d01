//! The two model-backed selection steps: spec files, then test cases.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::confidence::ConfidenceLevel;
use crate::core::numbering::{line_count, number_lines};
use crate::core::selection::{Rejected, retain_candidates, retain_test_ids};
use crate::core::test_id::TestId;
use crate::io::llm::{ModelClient, request_selection};
use crate::io::prompt::{NumberedFile, PromptBuilder};

/// Everything a selection request needs besides its per-level inputs.
pub struct Selector<'a, C: ModelClient> {
    client: &'a C,
    model: String,
    prompts: PromptBuilder,
    root: PathBuf,
}

impl<'a, C: ModelClient> Selector<'a, C> {
    pub fn new(
        client: &'a C,
        model: impl Into<String>,
        prompts: PromptBuilder,
        root: &Path,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompts,
            root: root.to_path_buf(),
        }
    }

    /// Ask the model which of `candidates` must run at `level`.
    ///
    /// Returns an empty list without calling the model when there is nothing
    /// to choose from or nothing changed.
    #[instrument(skip_all, fields(level = %level, candidates = candidates.len()))]
    pub fn select_files(
        &self,
        level: ConfidenceLevel,
        diff: &str,
        candidates: &[String],
    ) -> Result<Vec<String>> {
        if candidates.is_empty() || diff.trim().is_empty() {
            debug!("nothing to select from, skipping file selection request");
            return Ok(Vec::new());
        }
        let prompt = self.prompts.file_selection(level, diff, candidates)?;
        let raw = request_selection(self.client, &self.model, prompt)
            .with_context(|| format!("file selection at {level}"))?;
        let filtered = retain_candidates(&raw, candidates);
        log_rejected("file", &filtered.rejected);
        info!(selected = filtered.kept.len(), "selected spec files");
        Ok(filtered.kept)
    }

    /// Ask the model which test cases inside `files` must run at `level`.
    #[instrument(skip_all, fields(level = %level, files = files.len()))]
    pub fn select_tests(
        &self,
        level: ConfidenceLevel,
        diff: &str,
        files: &[String],
    ) -> Result<Vec<TestId>> {
        if files.is_empty() {
            debug!("no files selected, skipping case selection request");
            return Ok(Vec::new());
        }
        let (numbered, line_counts) = self.load_numbered(files)?;
        let prompt = self.prompts.case_selection(level, diff, &numbered)?;
        let raw = request_selection(self.client, &self.model, prompt)
            .with_context(|| format!("case selection at {level}"))?;
        let filtered = retain_test_ids(&raw, &line_counts);
        log_rejected("test", &filtered.rejected);
        info!(selected = filtered.kept.len(), "selected test cases");
        Ok(filtered.kept)
    }

    fn load_numbered(
        &self,
        files: &[String],
    ) -> Result<(Vec<NumberedFile>, BTreeMap<String, usize>)> {
        let mut numbered = Vec::with_capacity(files.len());
        let mut line_counts = BTreeMap::new();
        for path in files {
            let full = self.root.join(path);
            let contents =
                fs::read_to_string(&full).with_context(|| format!("read {}", full.display()))?;
            line_counts.insert(path.clone(), line_count(&contents));
            numbered.push(NumberedFile {
                path: path.clone(),
                numbered: number_lines(&contents),
            });
        }
        Ok((numbered, line_counts))
    }
}

fn log_rejected(kind: &str, rejected: &[Rejected]) {
    for entry in rejected {
        warn!(kind, entry = %entry.entry, reason = %entry.reason, "dropped model selection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use std::fs;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_inputs_skip_the_model() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = ScriptedModel::new(Vec::<&str>::new());
        let selector = Selector::new(&model, "m", PromptBuilder::new(1000), temp.path());

        let files = selector
            .select_files(ConfidenceLevel::P80, "", &[])
            .expect("files");
        assert!(files.is_empty());
        let files = selector
            .select_files(ConfidenceLevel::P80, "", &strings(&["spec/a_spec.rb"]))
            .expect("files");
        assert!(files.is_empty());
        let tests = selector
            .select_tests(ConfidenceLevel::P80, "+x", &[])
            .expect("tests");
        assert!(tests.is_empty());
        assert!(model.requests().is_empty());
    }

    #[test]
    fn file_selection_keeps_only_known_specs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = ScriptedModel::new(vec![
            r#"{"selected":["spec/b_spec.rb","spec/unknown_spec.rb"]}"#,
        ]);
        let selector = Selector::new(&model, "m", PromptBuilder::new(1000), temp.path());

        let files = selector
            .select_files(
                ConfidenceLevel::P95,
                "+change",
                &strings(&["spec/a_spec.rb", "spec/b_spec.rb"]),
            )
            .expect("files");
        assert_eq!(files, strings(&["spec/b_spec.rb"]));
        assert_eq!(model.requests()[0].model, "m");
    }

    #[test]
    fn case_selection_sends_numbered_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("spec")).expect("mkdir");
        fs::write(
            temp.path().join("spec/a_spec.rb"),
            "describe A do\n  it 'works' do\n  end\nend\n",
        )
        .expect("write");
        let model = ScriptedModel::new(vec![
            r#"{"selected":["spec/a_spec.rb:2","spec/a_spec.rb:40"]}"#,
        ]);
        let selector = Selector::new(&model, "m", PromptBuilder::new(1000), temp.path());

        let tests = selector
            .select_tests(ConfidenceLevel::P99, "+change", &strings(&["spec/a_spec.rb"]))
            .expect("tests");
        assert_eq!(tests, vec![TestId::new("spec/a_spec.rb", 2)]);
        let requests = model.requests();
        assert!(requests[0].prompt.user.contains("2:   it 'works' do"));
    }

    #[test]
    fn request_errors_are_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = ScriptedModel::new(vec!["{}"]);
        let selector = Selector::new(&model, "m", PromptBuilder::new(1000), temp.path());
        let err = selector
            .select_files(ConfidenceLevel::P80, "+x", &strings(&["spec/a_spec.rb"]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("file selection at 80%"));
    }
}
