//! Component D: LALR(1) table construction (spec §4.D).

pub mod items;
pub mod lookahead;
pub mod table;

use crate::diagnostics::Journal;
use crate::grammar::operator::OperatorScope;
use crate::grammar::production::Production;
use crate::types::{BuildConfig, NonTerminalId, ProductionId, SymbolId};

pub use items::{build_lr0_automaton, Item, ItemSet, Lr0Automaton, ProductionsByHead};
pub use lookahead::{compute_lookaheads, LookaheadTable};
pub use table::{Action, LrState, LrTable};

/// Builds the full LALR(1) table for a grammar, augmenting it with a
/// synthetic start production `S' -> start` first (spec §4.D operates on
/// "the augmented grammar").
///
/// `productions` and `start` describe the grammar as already assembled by
/// [`crate::grammar::builder::GrammarBuilder`]; this function appends the
/// augmented production internally and does not mutate its inputs.
pub fn build_lalr_table(
  productions: &[Production],
  nonterminal_count: usize,
  start: NonTerminalId,
  operator_scope: &OperatorScope,
  config: &BuildConfig,
  journal: &mut Journal,
) -> (LrTable, bool) {
  let augmented_head = NonTerminalId::from(nonterminal_count);
  let mut augmented_productions: Vec<Production> = productions.to_vec();
  let accept_production_id = ProductionId::from(augmented_productions.len());
  augmented_productions.push(Production::new(augmented_head, vec![SymbolId::NonTerminal(start)]));

  let productions_by_head = ProductionsByHead::new(&augmented_productions);
  let automaton = build_lr0_automaton(&productions_by_head, accept_production_id);
  let lookaheads = compute_lookaheads(&automaton, &productions_by_head, &augmented_productions, nonterminal_count + 1);

  table::build_table(&automaton, &lookaheads, &augmented_productions, operator_scope, accept_production_id, config, journal)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::operator::OperatorScope;
  use crate::types::TerminalId;

  /// `E := E '+' N | N`, `N := digit` — the S1 scenario's grammar shape,
  /// checked for a clean build with no conflicts.
  #[test]
  fn builds_left_recursive_expression_grammar_without_conflicts() {
    let e = NonTerminalId::from(0u32);
    let n = NonTerminalId::from(1u32);
    let plus = SymbolId::Terminal(TerminalId::from(0u32));
    let digit = SymbolId::Terminal(TerminalId::from(1u32));

    let productions = vec![
      Production::new(e, vec![SymbolId::NonTerminal(e), plus, SymbolId::NonTerminal(n)]),
      Production::new(e, vec![SymbolId::NonTerminal(n)]),
      Production::new(n, vec![digit]),
    ];

    let mut journal = Journal::new();
    let scope = OperatorScope::new();
    let config = BuildConfig::default();
    let (table, not_for_parsing) = build_lalr_table(&productions, 2, e, &scope, &config, &mut journal);

    assert!(!not_for_parsing, "diagnostics: {:?}", journal.diagnostics());
    assert!(!table.states.is_empty());
  }

  /// The classic dangling-`else` grammar: resolved via shift default with a
  /// `ShiftReduceResolved` info diagnostic (spec scenario S6).
  #[test]
  fn dangling_else_resolves_via_shift_default() {
    use crate::diagnostics::BuildCode;

    let stmt = NonTerminalId::from(0u32);
    let if_kw = SymbolId::Terminal(TerminalId::from(0u32));
    let then_kw = SymbolId::Terminal(TerminalId::from(1u32));
    let else_kw = SymbolId::Terminal(TerminalId::from(2u32));
    let other = SymbolId::Terminal(TerminalId::from(3u32));

    let productions = vec![
      Production::new(stmt, vec![if_kw, then_kw, SymbolId::NonTerminal(stmt), else_kw, SymbolId::NonTerminal(stmt)]),
      Production::new(stmt, vec![if_kw, then_kw, SymbolId::NonTerminal(stmt)]),
      Production::new(stmt, vec![other]),
    ];

    let mut journal = Journal::new();
    let scope = OperatorScope::new();
    let config = BuildConfig::default();
    let (_table, not_for_parsing) = build_lalr_table(&productions, 1, stmt, &scope, &config, &mut journal);

    assert!(!not_for_parsing);
    assert!(journal.diagnostics().iter().any(|d| d.code == BuildCode::ShiftReduceResolved));
  }
}
