//! Action/goto table assembly and conflict resolution (spec §4.D).

use std::collections::BTreeMap;

use crate::diagnostics::{BuildCode, Diagnostic, Journal};
use crate::grammar::operator::{Associativity, OperatorScope};
use crate::grammar::production::Production;
use crate::lalr::items::Lr0Automaton;
use crate::lalr::lookahead::LookaheadTable;
use crate::types::{BuildConfig, LrStateId, NonTerminalId, ProductionId, SourceSpan, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
  Shift(LrStateId),
  Reduce(ProductionId),
  Accept,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LrState {
  pub actions: BTreeMap<SymbolId, Action>,
  pub goto: BTreeMap<NonTerminalId, LrStateId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LrTable {
  pub states: Vec<LrState>,
  pub start: LrStateId,
}

impl LrTable {
  /// The set of terminals with no action entry at `state`, used to build
  /// `UnexpectedToken`'s expected-set (spec §4.G).
  pub fn expected_terminals(&self, state: LrStateId) -> Vec<SymbolId> {
    self.states[state.index()].actions.keys().copied().collect()
  }
}

/// Builds the LALR(1) action/goto table, resolving conflicts in the order
/// spec §4.D demands: (1) operator precedence/associativity, (2) shift
/// default / earlier-production reduce, (3) everything else becomes
/// `LrConflict` and marks the grammar not-for-parsing.
pub fn build_table(
  automaton: &Lr0Automaton,
  lookaheads: &LookaheadTable,
  productions: &[Production],
  operator_scope: &OperatorScope,
  accept_production: ProductionId,
  config: &BuildConfig,
  journal: &mut Journal,
) -> (LrTable, bool) {
  let mut states: Vec<LrState> = vec![LrState::default(); automaton.states.len()];
  let mut not_for_parsing = false;

  for (state_index, transitions) in automaton.transitions.iter().enumerate() {
    for (&symbol, &target) in transitions {
      match symbol {
        SymbolId::NonTerminal(nt) => {
          states[state_index].goto.insert(nt, LrStateId::from(target));
        }
        terminal_like => {
          states[state_index].actions.insert(terminal_like, Action::Shift(LrStateId::from(target)));
        }
      }
    }
  }

  for (state_index, items) in automaton.states.iter().enumerate() {
    for item in items {
      let production = &productions[item.production.index()];
      if item.dot != production.symbols.len() {
        continue;
      }
      let is_accept = item.production == accept_production;
      let Some(la) = lookaheads.get(&(state_index, item.production)) else { continue };
      for &lookahead in la {
        let proposed = if is_accept { Action::Accept } else { Action::Reduce(item.production) };
        let entry = states[state_index].actions.get(&lookahead).copied();
        let resolved = match entry {
          None => proposed,
          Some(existing) => resolve_conflict(
            state_index,
            existing,
            proposed,
            lookahead,
            productions,
            operator_scope,
            config,
            journal,
            &mut not_for_parsing,
          ),
        };
        states[state_index].actions.insert(lookahead, resolved);
      }
    }
  }

  (LrTable { states, start: LrStateId::from(0u32) }, not_for_parsing)
}

#[allow(clippy::too_many_arguments)]
fn resolve_conflict(
  state_index: usize,
  existing: Action,
  proposed: Action,
  lookahead: SymbolId,
  productions: &[Production],
  operator_scope: &OperatorScope,
  config: &BuildConfig,
  journal: &mut Journal,
  not_for_parsing: &mut bool,
) -> Action {
  match (existing, proposed) {
    (Action::Shift(_), Action::Reduce(p)) | (Action::Reduce(p), Action::Shift(_)) => {
      let shift_symbol = lookahead;
      if let Some(precedence) = productions[p.index()].precedence {
        if let Some(shift_group) = operator_scope.group_of(shift_symbol) {
          if shift_group as usize > precedence as usize {
            return shift_action(existing, proposed);
          } else if (shift_group as usize) < precedence as usize {
            return Action::Reduce(p);
          } else {
            return match operator_scope.associativity_of(shift_symbol) {
              Some(Associativity::Left) => Action::Reduce(p),
              Some(Associativity::Right) => shift_action(existing, proposed),
              _ => {
                journal.report(Diagnostic::new(
                  BuildCode::LrConflict,
                  SourceSpan::empty(),
                  format!("non-associative operator conflict in state {state_index} on {lookahead:?}"),
                ));
                *not_for_parsing = true;
                shift_action(existing, proposed)
              }
            };
          }
        }
      }
      journal.report_conflict_once_per_state(
        state_index as u32,
        Diagnostic::new(
          BuildCode::ShiftReduceResolved,
          SourceSpan::empty(),
          format!("shift/reduce conflict in state {state_index} on {lookahead:?} resolved in favor of shift"),
        ),
        config.conflict_diagnostics_once_per_state,
      );
      shift_action(existing, proposed)
    }
    (Action::Reduce(a), Action::Reduce(b)) => {
      let winner = a.index().min(b.index());
      journal.report_conflict_once_per_state(
        state_index as u32,
        Diagnostic::new(
          BuildCode::ReduceReduceResolved,
          SourceSpan::empty(),
          format!("reduce/reduce conflict in state {state_index} on {lookahead:?} resolved to the earlier production"),
        ),
        config.conflict_diagnostics_once_per_state,
      );
      Action::Reduce(ProductionId::from(winner))
    }
    _ => {
      journal.report(Diagnostic::new(
        BuildCode::LrConflict,
        SourceSpan::empty(),
        format!("unresolvable conflict in state {state_index} on {lookahead:?}"),
      ));
      *not_for_parsing = true;
      existing
    }
  }
}

fn shift_action(existing: Action, proposed: Action) -> Action {
  match (existing, proposed) {
    (Action::Shift(_), _) => existing,
    (_, Action::Shift(_)) => proposed,
    _ => existing,
  }
}
