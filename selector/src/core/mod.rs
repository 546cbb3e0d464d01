//! Deterministic, pure logic shared by the selector.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod confidence;
pub mod diff_filter;
pub mod numbering;
pub mod selection;
pub mod spec_files;
pub mod test_id;
