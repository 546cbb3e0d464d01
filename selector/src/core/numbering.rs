//! Line numbering for file contents shown to the model.

/// Render contents with 1-based `<n>: ` prefixes, one output line per input line.
pub fn number_lines(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len() + contents.len() / 8);
    for (idx, line) in contents.lines().enumerate() {
        out.push_str(&format!("{}: {}\n", idx + 1, line));
    }
    out
}

/// Number of lines as counted by [`number_lines`].
pub fn line_count(contents: &str) -> usize {
    contents.lines().count()
}
