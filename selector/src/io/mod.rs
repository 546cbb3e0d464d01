//! I/O helpers for selector commands.

pub mod config;
pub mod env_file;
pub mod gh;
pub mod git;
pub mod llm;
pub mod preflight;
pub mod process;
pub mod prompt;
pub mod test_runner;
