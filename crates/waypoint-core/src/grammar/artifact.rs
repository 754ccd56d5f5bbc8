//! Component C+: the immutable grammar artifact (spec §3 "Grammar
//! artifact") produced by [`super::builder::GrammarBuilder::build`].
//!
//! A [`Grammar`] is a value object: once built it is never mutated, and
//! every table inside it (terminals, nonterminals, productions, DFA, LALR
//! table, groups, string heap) shares its lifetime. Many readers, no
//! writer (spec §3 "Ownership & lifecycle").

use crate::format::header::SourceTag;
use crate::grammar::group::Group;
use crate::grammar::operator::OperatorScope;
use crate::grammar::production::Production;
use crate::grammar::symbol::{NonTerminal, TerminalInfo};
use crate::lalr::table::LrTable;
use crate::regex::dfa::Dfa;
use crate::types::{Array, IString, NonTerminalId, OrderedMap, StringHeap, TerminalId};

/// The finished, immutable grammar: terminals, nonterminals, productions,
/// DFA, LALR table, groups, operator scope, and string heap, plus whether
/// it is actually usable for parsing (spec §7: an `error`-severity
/// diagnostic marks the grammar not-for-parsing but it is still
/// serializable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar {
  pub(crate) properties: OrderedMap<String, String>,
  pub(crate) terminals: Array<TerminalInfo>,
  pub(crate) nonterminals: Array<NonTerminal>,
  pub(crate) productions: Array<Production>,
  pub(crate) dfa: Dfa,
  pub(crate) lr_table: LrTable,
  pub(crate) groups: Array<Group>,
  pub(crate) operator_scope: OperatorScope,
  pub(crate) strings: StringHeap,
  pub(crate) special_names: OrderedMap<u32, IString>,
  pub(crate) special_names_enabled: bool,
  pub(crate) start: NonTerminalId,
  pub(crate) source_tag: SourceTag,
  pub(crate) for_parsing: bool,
}

impl Grammar {
  pub fn terminals(&self) -> &[TerminalInfo] {
    &self.terminals
  }

  pub fn nonterminals(&self) -> &[NonTerminal] {
    &self.nonterminals
  }

  pub fn productions(&self) -> &[Production] {
    &self.productions
  }

  pub fn dfa(&self) -> &Dfa {
    &self.dfa
  }

  pub fn lr_table(&self) -> &LrTable {
    &self.lr_table
  }

  pub fn groups(&self) -> &[Group] {
    &self.groups
  }

  pub fn operator_scope(&self) -> &OperatorScope {
    &self.operator_scope
  }

  pub fn strings(&self) -> &StringHeap {
    &self.strings
  }

  pub fn properties(&self) -> &OrderedMap<String, String> {
    &self.properties
  }

  pub fn special_name_of(&self, terminal: TerminalId) -> Option<&str> {
    if !self.special_names_enabled {
      return None;
    }
    self.special_names.get(&terminal.0).map(|&name| self.strings.resolve(name))
  }

  pub fn start(&self) -> NonTerminalId {
    self.start
  }

  pub fn source_tag(&self) -> SourceTag {
    self.source_tag
  }

  /// `false` if the build reported an `error`-severity diagnostic (spec
  /// §7): the grammar is still a complete, serializable value, but
  /// [`waypoint_runtime`]'s parser refuses to run it and instead reports
  /// `GrammarNotForParsing`.
  pub fn is_for_parsing(&self) -> bool {
    self.for_parsing
  }

  pub fn terminal_name(&self, id: TerminalId) -> &str {
    self.strings.resolve(self.terminals[id.index()].name)
  }

  pub fn nonterminal_name(&self, id: NonTerminalId) -> &str {
    self.strings.resolve(self.nonterminals[id.index()].name)
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    crate::format::write::serialize(&self.as_write_parts(), self.source_tag)
  }

  fn as_write_parts(&self) -> crate::format::write::GrammarParts<'_> {
    crate::format::write::GrammarParts {
      terminals: &self.terminals,
      nonterminals: &self.nonterminals,
      productions: &self.productions,
      dfa: &self.dfa,
      lr_table: &self.lr_table,
      groups: &self.groups,
      operator_scope: &self.operator_scope,
      strings: &self.strings,
      properties: &self.properties,
      special_names: &self.special_names,
      special_names_enabled: self.special_names_enabled,
      start: self.start,
    }
  }
}
