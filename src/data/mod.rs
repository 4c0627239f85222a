//! Data loading for sequence inputs
//!
//! Sequences are stored as text, one per line, so that the CLI and the
//! integration tests can feed the path kernel without custom code.

pub mod sequences;

pub use self::sequences::*;
