//! Typed index handles into the tables of a [`crate::artifact::Grammar`].
//!
//! Every table in the grammar artifact (terminals, non-terminals,
//! productions, DFA states, LALR states, groups) is addressed by a newtype
//! wrapper around `u32` rather than a bare index, so that swapping a
//! terminal index for a non-terminal index is a compile error rather than a
//! silent bug. This mirrors the teacher's `DBNonTermKey`/`DBRuleKey` handle
//! style.

use std::fmt::{self, Debug, Display};

macro_rules! id_type {
  ($name:ident, $prefix:literal) => {
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct $name(pub u32);

    impl $name {
      pub const INVALID: $name = $name(u32::MAX);

      #[inline]
      pub fn index(self) -> usize {
        self.0 as usize
      }

      #[inline]
      pub fn is_valid(self) -> bool {
        self.0 != u32::MAX
      }
    }

    impl From<usize> for $name {
      fn from(value: usize) -> Self {
        debug_assert!(value <= u32::MAX as usize, "index overflowed u32");
        $name(value as u32)
      }
    }

    impl From<u32> for $name {
      fn from(value: u32) -> Self {
        $name(value)
      }
    }

    impl Debug for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", $prefix, self.0)
      }
    }

    impl Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
      }
    }
  };
}

id_type!(TerminalId, "T");
id_type!(NonTerminalId, "N");
id_type!(ProductionId, "P");
id_type!(DfaStateId, "D");
id_type!(LrStateId, "S");
id_type!(GroupId, "G");

/// A symbol is either a terminal, a non-terminal, or a group delimiter.
/// This is the disjoint union described in spec §3 "Symbol".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum SymbolId {
  Terminal(TerminalId),
  NonTerminal(NonTerminalId),
  GroupStart(GroupId),
  GroupEnd(GroupId),
  /// The distinguished end-of-input terminal, used in LALR action tables.
  EndOfInput,
}

impl SymbolId {
  pub fn is_terminal(self) -> bool {
    matches!(self, SymbolId::Terminal(_) | SymbolId::EndOfInput | SymbolId::GroupStart(_) | SymbolId::GroupEnd(_))
  }

  pub fn is_nonterminal(self) -> bool {
    matches!(self, SymbolId::NonTerminal(_))
  }

  pub fn as_terminal(self) -> Option<TerminalId> {
    match self {
      SymbolId::Terminal(t) => Some(t),
      _ => None,
    }
  }

  pub fn as_nonterminal(self) -> Option<NonTerminalId> {
    match self {
      SymbolId::NonTerminal(n) => Some(n),
      _ => None,
    }
  }
}
