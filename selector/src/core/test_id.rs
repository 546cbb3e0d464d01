//! `path:line` identifiers accepted by the test runner.

use std::fmt;
use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use regex::Regex;

static TEST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\s]+):([1-9][0-9]*)$").expect("test id regex is valid"));

/// A single test case, addressed by file and line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId {
    pub path: String,
    pub line: usize,
}

impl TestId {
    pub fn new(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// Parse `path:line`. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let caps = TEST_ID_RE
            .captures(trimmed)
            .ok_or_else(|| anyhow!("malformed test identifier '{trimmed}'"))?;
        let line = caps[2]
            .parse()
            .map_err(|e| anyhow!("line number out of range in '{trimmed}': {e}"))?;
        Ok(Self::new(&caps[1], line))
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_and_line() {
        let id = TestId::parse(" spec/models/user_spec.rb:42 ").expect("parse");
        assert_eq!(id, TestId::new("spec/models/user_spec.rb", 42));
        assert_eq!(id.to_string(), "spec/models/user_spec.rb:42");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for raw in [
            "spec/models/user_spec.rb",
            "spec/models/user_spec.rb:0",
            "spec/models/user_spec.rb:-3",
            "spec/models/user_spec.rb:12:3",
            ":12",
            "spec/my file_spec.rb:3",
            "spec/models/user_spec.rb:99999999999999999999999",
        ] {
            assert!(TestId::parse(raw).is_err(), "expected rejection of {raw}");
        }
    }
}
