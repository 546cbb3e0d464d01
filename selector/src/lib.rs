//! Incremental test selection for a Ruby application.
//!
//! The selector gathers the working diff (staged, unstaged and the open pull
//! request), asks a language model which spec files and which test cases are
//! affected, and runs those tests at ascending confidence levels. The layout
//! follows a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (diff filtering, identifier
//!   parsing, candidate filtering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (git, gh, HTTP, test processes).
//!   Isolated behind traits so orchestration can be tested with scripted
//!   doubles.
//!
//! Orchestration modules ([`collect`], [`select`], [`drive`]) combine the two
//! to implement the CLI.

pub mod collect;
pub mod core;
pub mod drive;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod select;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
