//! Gathering the diff and the spec-file list for a run.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::diff_filter::filter_by_prefixes;
use crate::core::spec_files::filter_spec_paths;
use crate::io::gh::PullRequestDiff;
use crate::io::git::Git;

/// Concatenate staged, unstaged and pull-request diffs, keeping only sections under `prefixes`.
///
/// An empty result is valid: it means nothing relevant changed.
#[instrument(skip_all)]
pub fn collect_diff<P: PullRequestDiff>(git: &Git, pr: &P, prefixes: &[String]) -> Result<String> {
    let staged = git.diff_staged().context("collect staged diff")?;
    let unstaged = git.diff_unstaged().context("collect unstaged diff")?;
    let pull_request = pr.pr_diff().context("collect pull request diff")?;

    let mut combined = String::with_capacity(staged.len() + unstaged.len() + pull_request.len());
    for part in [&staged, &unstaged, &pull_request] {
        combined.push_str(part);
        if !part.is_empty() && !part.ends_with('\n') {
            combined.push('\n');
        }
    }

    let filtered = filter_by_prefixes(&combined, prefixes);
    info!(
        staged_bytes = staged.len(),
        unstaged_bytes = unstaged.len(),
        pr_bytes = pull_request.len(),
        filtered_bytes = filtered.len(),
        "collected diff"
    );
    Ok(filtered)
}

/// Tracked spec files under `dir` whose names end with `suffix`.
///
/// Files deleted in the worktree but still in the index are left out, since
/// there is nothing to show the model or to run.
#[instrument(skip_all, fields(dir, suffix))]
pub fn enumerate_spec_files(git: &Git, dir: &str, suffix: &str) -> Result<Vec<String>> {
    let tracked = git.ls_files(dir).context("list spec files")?;
    let deleted: BTreeSet<String> = git
        .ls_deleted(dir)
        .context("list deleted spec files")?
        .into_iter()
        .collect();
    let present = tracked.iter().filter(|path| !deleted.contains(*path));
    let specs = filter_spec_paths(present.map(String::as_str), dir, suffix);
    info!(
        count = specs.len(),
        deleted = deleted.len(),
        "enumerated spec files"
    );
    Ok(specs)
}
