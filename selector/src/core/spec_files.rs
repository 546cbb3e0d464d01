//! Spec-file naming convention.

use std::collections::BTreeSet;

/// Keep paths under `dir/` whose file name ends with `suffix`, sorted and unique.
pub fn filter_spec_paths<'a, I>(paths: I, dir: &str, suffix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let dir_prefix = format!("{}/", dir.trim_end_matches('/'));
    paths
        .into_iter()
        .map(str::trim)
        .filter(|path| path.starts_with(&dir_prefix) && path.ends_with(suffix))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
