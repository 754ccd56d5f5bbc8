//! Stable diagnostic codes (spec §4.H, the "FARKLEnnnn" family renamed to
//! this crate's own prefix).

use std::fmt::{self, Debug};

/// Severity of a [`super::Diagnostic`]. `Error` marks the grammar
/// not-for-parsing (spec §7) but never prevents serialization.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
  Info,
  Warning,
  Error,
}

/// Build-time diagnostic codes, one per row of spec §7's taxonomy table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, serde::Serialize, serde::Deserialize)]
pub enum BuildCode {
  DfaTooLarge,
  IndistinguishableSymbols,
  RegexMatchesNothing,
  DuplicateSpecialName,
  NonterminalHasNoProductions,
  OperatorDefinedTwice,
  LrConflict,
  SymbolRenamedTwice,
  RegexParseFailure,
  ShiftReduceResolved,
  ReduceReduceResolved,
  LegacyConversionLossy,
  /// A nonterminal that can never derive any terminal string (spec §4.D
  /// "Productivity & reachability analysis"), distinct from
  /// `NonterminalHasNoProductions` which fires only for a recursive
  /// nonterminal with an empty production list.
  UnproductiveNonterminal,
  /// A nonterminal with productions that is never reachable from the
  /// grammar's start symbol (spec §4.D).
  UnreachableNonterminal,
}

impl BuildCode {
  /// Stable machine-readable id, e.g. `WAYP0007`, grounded on the spec's
  /// own "FARKLEnnnn" naming convention.
  pub fn id(self) -> &'static str {
    match self {
      BuildCode::DfaTooLarge => "WAYP0001",
      BuildCode::IndistinguishableSymbols => "WAYP0002",
      BuildCode::RegexMatchesNothing => "WAYP0003",
      BuildCode::DuplicateSpecialName => "WAYP0004",
      BuildCode::NonterminalHasNoProductions => "WAYP0005",
      BuildCode::OperatorDefinedTwice => "WAYP0006",
      BuildCode::LrConflict => "WAYP0007",
      BuildCode::SymbolRenamedTwice => "WAYP0008",
      BuildCode::RegexParseFailure => "WAYP0009",
      BuildCode::ShiftReduceResolved => "WAYP0010",
      BuildCode::ReduceReduceResolved => "WAYP0011",
      BuildCode::LegacyConversionLossy => "WAYP0012",
      BuildCode::UnproductiveNonterminal => "WAYP0013",
      BuildCode::UnreachableNonterminal => "WAYP0014",
    }
  }

  /// The severity a code carries by default (some codes, like
  /// `ShiftReduceResolved`, are intrinsically informational; others are
  /// always errors).
  pub fn default_severity(self) -> Severity {
    use BuildCode::*;
    match self {
      DfaTooLarge | IndistinguishableSymbols | DuplicateSpecialName | LrConflict => Severity::Error,
      RegexMatchesNothing
      | NonterminalHasNoProductions
      | OperatorDefinedTwice
      | SymbolRenamedTwice
      | RegexParseFailure
      | ReduceReduceResolved
      | LegacyConversionLossy
      | UnproductiveNonterminal
      | UnreachableNonterminal => Severity::Warning,
      ShiftReduceResolved => Severity::Info,
    }
  }
}

impl fmt::Display for BuildCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.id())
  }
}

/// Runtime error codes (spec §7), disjoint from the build-time set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, serde::Serialize, serde::Deserialize)]
pub enum RuntimeCode {
  UnrecognizedInput,
  UnexpectedToken,
  UnexpectedEndOfInputInGroup,
  Cancelled,
  GrammarNotForParsing,
  GrammarVersionTooNew,
  GrammarVersionTooOld,
}

impl fmt::Display for RuntimeCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Debug::fmt(self, f)
  }
}
