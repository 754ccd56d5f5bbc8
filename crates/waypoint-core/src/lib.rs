//! waypoint-core: grammar IR, regex/DFA builder, LALR(1) builder, and the
//! binary grammar format (components B, C, D, E, H of the parser toolkit).
//!
//! This crate only ever *builds* and *serializes* grammars; driving one
//! against input text is [`waypoint_runtime`]'s job. Nothing in here reads
//! the environment, the filesystem, or the clock (SPEC_FULL.md §6) — every
//! input arrives as an argument and every output is a value.

pub mod charset;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod grammar;
pub mod lalr;
pub mod regex;
pub mod types;

pub use diagnostics::{BuildCode, Diagnostic, Journal, RuntimeCode, Severity};
pub use error::{BuildResult, Fatal};
pub use format::load_from_bytes;
pub use grammar::{Grammar, GrammarBuilder, ProductionSpec};
pub use types::BuildConfig;
