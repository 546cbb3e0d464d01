//! Path-prefix filtering over unified diff text.

const SECTION_HEADER: &str = "diff --git ";

/// One file's portion of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection<'a> {
    /// Path before the change (`a/` side, prefix stripped).
    pub old_path: String,
    /// Path after the change (`b/` side, prefix stripped).
    pub new_path: String,
    /// Full section text including the header line.
    pub text: &'a str,
}

impl FileSection<'_> {
    /// True if either side of the change lives under one of `prefixes`.
    pub fn touches_any(&self, prefixes: &[String]) -> bool {
        prefixes.iter().any(|prefix| {
            self.old_path.starts_with(prefix.as_str()) || self.new_path.starts_with(prefix.as_str())
        })
    }
}

/// Split diff text into per-file sections.
///
/// Text before the first `diff --git` header (e.g. a PR preamble) is dropped.
pub fn split_file_sections(diff: &str) -> Vec<FileSection<'_>> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in diff.split_inclusive('\n') {
        if line.starts_with(SECTION_HEADER) {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(diff.len());
            let text = &diff[start..end];
            let header = text.lines().next().unwrap_or_default();
            let (old_path, new_path) = parse_header_paths(header);
            FileSection {
                old_path,
                new_path,
                text,
            }
        })
        .collect()
}

/// Keep only the file sections touching one of `prefixes`, in original order.
pub fn filter_by_prefixes(diff: &str, prefixes: &[String]) -> String {
    split_file_sections(diff)
        .into_iter()
        .filter(|section| section.touches_any(prefixes))
        .fold(String::new(), |mut out, section| {
            out.push_str(section.text);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out
        })
}

/// Extract `(old, new)` paths from a `diff --git a/<old> b/<new>` header.
fn parse_header_paths(header: &str) -> (String, String) {
    let rest = header.strip_prefix(SECTION_HEADER).unwrap_or(header).trim();
    let (old, new) = match rest.rfind(" b/").or_else(|| rest.rfind(" \"b/")) {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, rest),
    };
    (strip_side(old, "a/"), strip_side(new, "b/"))
}

fn strip_side(path: &str, side: &str) -> String {
    let unquoted = path.trim().trim_matches('"');
    unquoted.strip_prefix(side).unwrap_or(unquoted).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_CHANGE: &str = concat!(
        "diff --git a/app/models/user.rb b/app/models/user.rb\n",
        "index 1111111..2222222 100644\n",
        "--- a/app/models/user.rb\n",
        "+++ b/app/models/user.rb\n",
        "@@ -1,3 +1,3 @@\n",
        " class User\n",
        "-  validates :name\n",
        "+  validates :name, presence: true\n",
    );

    const README_CHANGE: &str = concat!(
        "diff --git a/README.md b/README.md\n",
        "--- a/README.md\n",
        "+++ b/README.md\n",
        "@@ -1 +1 @@\n",
        "-old\n",
        "+new\n",
    );

    fn prefixes() -> Vec<String> {
        vec!["app/".to_string(), "spec/".to_string()]
    }

    #[test]
    fn splits_sections_and_parses_paths() {
        let diff = format!("{MODEL_CHANGE}{README_CHANGE}");
        let sections = split_file_sections(&diff);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].new_path, "app/models/user.rb");
        assert_eq!(sections[1].old_path, "README.md");
        assert!(sections[1].text.starts_with("diff --git a/README.md"));
    }

    #[test]
    fn excludes_sections_outside_prefixes() {
        let diff = format!("{README_CHANGE}{MODEL_CHANGE}");
        let filtered = filter_by_prefixes(&diff, &prefixes());
        assert_eq!(filtered, MODEL_CHANGE);
    }

    #[test]
    fn keeps_renames_out_of_a_prefix() {
        let diff = concat!(
            "diff --git a/app/old.rb b/vendor/new.rb\n",
            "similarity index 100%\n",
            "rename from app/old.rb\n",
            "rename to vendor/new.rb\n",
        );
        assert_eq!(filter_by_prefixes(diff, &prefixes()), diff);
    }

    #[test]
    fn drops_preamble_before_first_header() {
        let diff = format!("From abc Mon Sep 17 00:00:00 2001\n\n{MODEL_CHANGE}");
        assert_eq!(filter_by_prefixes(&diff, &prefixes()), MODEL_CHANGE);
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        assert_eq!(filter_by_prefixes("", &prefixes()), "");
        assert_eq!(filter_by_prefixes(MODEL_CHANGE, &[]), "");
    }

    #[test]
    fn prefix_match_is_not_substring_match() {
        let diff = "diff --git a/lib_legacy/x.rb b/lib_legacy/x.rb\n+x\n";
        assert_eq!(filter_by_prefixes(diff, &["lib/".to_string()]), "");
    }

    #[test]
    fn terminates_unterminated_final_section() {
        let diff = "diff --git a/app/a.rb b/app/a.rb\n+x";
        assert_eq!(filter_by_prefixes(diff, &prefixes()), format!("{diff}\n"));
    }
}
