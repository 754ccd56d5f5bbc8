//! Shared small types used across the builder: table-row aliases, string
//! interning, index handles, build configuration, and source locations.

pub mod config;
pub mod ids;
pub mod strings;

pub use config::BuildConfig;
pub use ids::{DfaStateId, GroupId, LrStateId, NonTerminalId, ProductionId, SymbolId, TerminalId};
pub use strings::{IString, StringHeap};

use std::collections::{BTreeMap, BTreeSet};

/// A plain growable row table. An alias so table definitions read the same
/// way the teacher's own `Array<T>` does.
pub type Array<T> = Vec<T>;

/// Deterministic-iteration-order map, used anywhere iteration order feeds
/// into diagnostic ordering or table layout (binary search requires sorted
/// keys, spec §4.E).
pub type OrderedMap<K, V> = BTreeMap<K, V>;
pub type OrderedSet<T> = BTreeSet<T>;

/// A half-open or closed span of character offsets within a single source,
/// used for diagnostic locations (spec §4.H) and token spans (spec §3
/// "Parser state").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
  /// Byte (or character-unit) offset of the first character.
  pub start: u32,
  /// Byte (or character-unit) offset one past the last character.
  pub end: u32,
  /// 1-based line number of `start`.
  pub line: u32,
  /// 0-based column (in character units) of `start` within its line.
  pub column: u32,
}

impl SourceSpan {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn len(&self) -> u32 {
    self.end.saturating_sub(self.start)
  }

  pub fn is_empty(&self) -> bool {
    self.end <= self.start
  }

  pub fn join(&self, other: &SourceSpan) -> SourceSpan {
    SourceSpan {
      start: self.start.min(other.start),
      end: self.end.max(other.end),
      line: self.line.min(other.line),
      column: if self.start <= other.start { self.column } else { other.column },
    }
  }
}
