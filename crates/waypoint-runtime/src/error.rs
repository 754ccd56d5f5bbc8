//! Runtime error taxonomy (spec §4.H "a disjoint set of runtime codes",
//! §7 "Runtime errors are returned by the parse call with the current
//! position; no partial semantic value is exposed").

use waypoint_core::types::{SourceSpan, SymbolId};
use waypoint_core::RuntimeCode;

/// A parse-time failure. Distinct from [`waypoint_core::Diagnostic`]: those
/// are build-time, collected by a [`waypoint_core::Journal`]; this is
/// returned directly by a parse call, one per failed call.
#[derive(Clone, Debug)]
pub struct RuntimeError {
  pub code: RuntimeCode,
  pub location: SourceSpan,
  pub message: String,
  /// The action map's key set at the failing state, populated only for
  /// `UnexpectedToken` (spec §4.G "missing entry").
  pub expected: Vec<SymbolId>,
}

impl RuntimeError {
  pub fn new(code: RuntimeCode, location: SourceSpan, message: impl Into<String>) -> Self {
    Self { code, location, message: message.into(), expected: Vec::new() }
  }

  pub fn unexpected_token(location: SourceSpan, found: SymbolId, expected: Vec<SymbolId>) -> Self {
    Self { code: RuntimeCode::UnexpectedToken, location, message: format!("unexpected {found:?}"), expected }
  }
}

impl std::fmt::Display for RuntimeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}] {} (at {}..{})", self.code, self.message, self.location.start, self.location.end)
  }
}

impl std::error::Error for RuntimeError {}
