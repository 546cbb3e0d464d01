//! Reader for dotenv-style credential files such as `.env.development.local`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Parse `KEY=VALUE` pairs.
///
/// Supports blank lines, `#` comments, an optional `export ` prefix and
/// single- or double-quoted values. Lines without `=` are ignored. Later
/// assignments win.
pub fn parse_env(contents: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()));
    }
    vars
}

/// Load and parse an env file. A missing file yields `None`.
pub fn load_env_file(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
    if !path.exists() {
        debug!(path = %path.display(), "env file not found");
        return Ok(None);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(parse_env(&contents)))
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    // Unquoted values may carry a trailing comment.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        let vars = parse_env(
            "# local secrets\n\
             OPENAI_API_KEY=sk-plain\n\
             export QUOTED=\"with spaces\"\n\
             SINGLE='x=y'\n\
             COMMENTED=value # note\n\
             not a pair\n\
             =orphan\n",
        );
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-plain"));
        assert_eq!(vars.get("QUOTED").map(String::as_str), Some("with spaces"));
        assert_eq!(vars.get("SINGLE").map(String::as_str), Some("x=y"));
        assert_eq!(vars.get("COMMENTED").map(String::as_str), Some("value"));
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn later_assignment_wins() {
        let vars = parse_env("KEY=one\nKEY=two\n");
        assert_eq!(vars.get("KEY").map(String::as_str), Some("two"));
    }

    #[test]
    fn missing_file_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = load_env_file(&temp.path().join(".env.development.local")).expect("load");
        assert!(loaded.is_none());
    }
}
