//! Build-time diagnostic collection: this is the crate's logging layer
//! (SPEC_FULL.md §9), grounded on the teacher's `Journal`/`Report`
//! listener-based reporting rather than an external `log`/`tracing`
//! dependency.

use super::codes::{BuildCode, Severity};
use crate::types::SourceSpan;

/// A single diagnostic raised during a build (spec §4.H).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
  pub code: BuildCode,
  pub severity: Severity,
  pub location: SourceSpan,
  pub message: String,
}

impl Diagnostic {
  pub fn new(code: BuildCode, location: SourceSpan, message: impl Into<String>) -> Self {
    Self { code, severity: code.default_severity(), location, message: message.into() }
  }
}

impl std::fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{:?} {}] {}", self.severity, self.code, self.message)?;
    if !self.location.is_empty() {
      write!(f, " (at {}..{})", self.location.start, self.location.end)?;
    }
    Ok(())
  }
}

/// An embedder hook receiving diagnostics synchronously as they are raised,
/// matching the teacher's listener-based reporting rather than buffering
/// everything until the build completes.
pub trait DiagnosticListener {
  fn on_diagnostic(&mut self, diagnostic: &Diagnostic);
}

/// Default listener: just appends to a `Vec`. Most embedders only need the
/// final list, returned from [`Journal::into_diagnostics`].
#[derive(Default)]
pub struct CollectingListener {
  pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticListener for CollectingListener {
  fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
    self.diagnostics.push(diagnostic.clone());
  }
}

/// Accumulates diagnostics for a single build and forwards each one to an
/// optional listener as it is raised.
pub struct Journal {
  diagnostics: Vec<Diagnostic>,
  listener: Option<Box<dyn DiagnosticListener>>,
  /// Tracks which `(state, code)` pairs have already emitted a
  /// once-per-state conflict diagnostic (spec §4.D Open Question,
  /// resolved to once-per-state; see SPEC_FULL.md §9).
  seen_once_per_state: OrderedSet<(u32, BuildCode)>,
}

use crate::types::OrderedSet;

impl Default for Journal {
  fn default() -> Self {
    Self { diagnostics: Vec::new(), listener: None, seen_once_per_state: OrderedSet::new() }
  }
}

impl Journal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_listener(listener: impl DiagnosticListener + 'static) -> Self {
    Self { diagnostics: Vec::new(), listener: Some(Box::new(listener)), seen_once_per_state: OrderedSet::new() }
  }

  pub fn report(&mut self, diagnostic: Diagnostic) {
    if let Some(listener) = self.listener.as_mut() {
      listener.on_diagnostic(&diagnostic);
    }
    self.diagnostics.push(diagnostic);
  }

  /// Report a conflict-resolution diagnostic, collapsing repeats within the
  /// same LALR state down to a single emission when
  /// `once_per_state` is true.
  pub fn report_conflict_once_per_state(&mut self, state: u32, diagnostic: Diagnostic, once_per_state: bool) {
    if once_per_state {
      if !self.seen_once_per_state.insert((state, diagnostic.code)) {
        return;
      }
    }
    self.report(diagnostic);
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
  }

  pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.severity == Severity::Info)
  }

  pub fn has_blocking_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn into_diagnostics(self) -> Vec<Diagnostic> {
    self.diagnostics
  }

  /// Render every diagnostic as a JSON Lines string (one object per line),
  /// for embedders that want a machine-readable build log (SPEC_FULL.md
  /// §9 ambient-stack note).
  pub fn to_json_lines(&self) -> String {
    let mut out = String::new();
    for diagnostic in &self.diagnostics {
      if let Ok(line) = serde_json::to_string(diagnostic) {
        out.push_str(&line);
        out.push('\n');
      }
    }
    out
  }

  /// Merge diagnostics gathered by independent parallel build tasks
  /// (SPEC_FULL.md §5) back into this journal in a fixed order, so
  /// parallelism never changes the emitted diagnostic sequence.
  pub fn merge_ordered(&mut self, mut batches: Vec<(u32, Vec<Diagnostic>)>) {
    batches.sort_by_key(|(order, _)| *order);
    for (_, batch) in batches {
      for diagnostic in batch {
        self.report(diagnostic);
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::types::SourceSpan;

  #[test]
  fn once_per_state_collapses_repeats() {
    let mut journal = Journal::new();
    for _ in 0..5 {
      journal.report_conflict_once_per_state(
        3,
        Diagnostic::new(BuildCode::ShiftReduceResolved, SourceSpan::empty(), "shift wins"),
        true,
      );
    }
    assert_eq!(journal.diagnostics().len(), 1);
  }

  #[test]
  fn once_per_occurrence_keeps_every_emission() {
    let mut journal = Journal::new();
    for _ in 0..5 {
      journal.report_conflict_once_per_state(
        3,
        Diagnostic::new(BuildCode::ShiftReduceResolved, SourceSpan::empty(), "shift wins"),
        false,
      );
    }
    assert_eq!(journal.diagnostics().len(), 5);
  }
}
