//! Narrowing model answers down to entries the runner can trust.
//!
//! The model is instructed to pick from a fixed list, but its output is still
//! untrusted text. Everything it returns passes through here before reaching
//! the test runner.

use std::collections::{BTreeMap, HashSet};

use crate::core::test_id::TestId;

/// Entries the model returned that were not accepted, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub entry: String,
    pub reason: String,
}

/// Accepted entries plus the ones that were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filtered<T> {
    pub kept: Vec<T>,
    pub rejected: Vec<Rejected>,
}

/// Keep model-selected paths that are in `candidates`, in model order, without duplicates.
pub fn retain_candidates(raw: &[String], candidates: &[String]) -> Filtered<String> {
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut rejected = Vec::new();

    for entry in raw {
        let path = entry.trim();
        if !allowed.contains(path) {
            rejected.push(Rejected {
                entry: entry.clone(),
                reason: "not a known spec file".to_string(),
            });
            continue;
        }
        if seen.insert(path) {
            kept.push(path.to_string());
        }
    }

    Filtered { kept, rejected }
}

/// Keep identifiers that parse and point at a real line of a selected file.
///
/// `line_counts` maps each selected file to its number of lines.
pub fn retain_test_ids(raw: &[String], line_counts: &BTreeMap<String, usize>) -> Filtered<TestId> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut rejected = Vec::new();

    for entry in raw {
        let id = match TestId::parse(entry) {
            Ok(id) => id,
            Err(err) => {
                rejected.push(Rejected {
                    entry: entry.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let Some(&lines) = line_counts.get(&id.path) else {
            rejected.push(Rejected {
                entry: entry.clone(),
                reason: "file was not selected".to_string(),
            });
            continue;
        };
        if id.line > lines {
            rejected.push(Rejected {
                entry: entry.clone(),
                reason: format!("line beyond end of file ({lines} lines)"),
            });
            continue;
        }
        if seen.insert(id.clone()) {
            kept.push(id);
        }
    }

    Filtered { kept, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candidates_outside_list_are_rejected() {
        let candidates = strings(&["spec/a_spec.rb", "spec/b_spec.rb"]);
        let raw = strings(&[
            "spec/b_spec.rb",
            "spec/evil_spec.rb",
            " spec/a_spec.rb ",
            "spec/b_spec.rb",
        ]);
        let filtered = retain_candidates(&raw, &candidates);
        assert_eq!(filtered.kept, strings(&["spec/b_spec.rb", "spec/a_spec.rb"]));
        assert_eq!(filtered.rejected.len(), 1);
        assert_eq!(filtered.rejected[0].entry, "spec/evil_spec.rb");
    }

    #[test]
    fn empty_candidates_keep_nothing() {
        let filtered = retain_candidates(&strings(&["spec/a_spec.rb"]), &[]);
        assert!(filtered.kept.is_empty());
    }

    #[test]
    fn test_ids_are_checked_against_selected_files() {
        let line_counts = BTreeMap::from([("spec/a_spec.rb".to_string(), 10)]);
        let raw = strings(&[
            "spec/a_spec.rb:3",
            "spec/a_spec.rb:11",
            "spec/other_spec.rb:1",
            "nonsense",
            "spec/a_spec.rb:3",
            "spec/a_spec.rb:10",
        ]);
        let filtered = retain_test_ids(&raw, &line_counts);
        assert_eq!(
            filtered.kept,
            vec![
                TestId::new("spec/a_spec.rb", 3),
                TestId::new("spec/a_spec.rb", 10)
            ]
        );
        let reasons: Vec<&str> = filtered
            .rejected
            .iter()
            .map(|r| r.reason.as_str())
            .collect();
        assert!(reasons[0].contains("beyond end of file"));
        assert_eq!(reasons[1], "file was not selected");
        assert!(reasons[2].contains("malformed"));
    }
}
