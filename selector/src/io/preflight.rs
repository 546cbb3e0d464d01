//! Checks that required external programs are installed before doing any work.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::debug;

/// Locate `program` on the given search path.
///
/// Programs containing a path separator (e.g. `bin/rspec`) are resolved
/// against `root` instead of the search path.
pub fn find_program(program: &str, root: &Path, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if program.contains('/') {
        let candidate = root.join(program);
        return is_executable(&candidate).then_some(candidate);
    }
    let search_path = search_path?;
    env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// Ensure every program in `programs` resolves, reporting all missing ones at once.
pub fn check_tools(programs: &[&str], root: &Path) -> Result<()> {
    let search_path = env::var_os("PATH");
    let missing: Vec<&str> = programs
        .iter()
        .copied()
        .filter(|program| {
            let found = find_program(program, root, search_path.as_deref());
            debug!(program, found = ?found, "preflight lookup");
            found.is_none()
        })
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(anyhow!(
        "required tool(s) not found on PATH: {}",
        missing.join(", ")
    ))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
