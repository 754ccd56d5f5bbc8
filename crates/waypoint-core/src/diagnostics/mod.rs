//! Component H: structured build diagnostics (spec §4.H, §7).

pub mod codes;
pub mod journal;

pub use codes::{BuildCode, RuntimeCode, Severity};
pub use journal::{CollectingListener, Diagnostic, DiagnosticListener, Journal};
