//! Efficient LALR(1) lookahead propagation (spec §4.D: "DeRemer-Pennello
//! style digraph"): computes, for every reduce item, the exact set of
//! terminals that may follow it — without the cost of building the full
//! canonical LR(1) automaton first and merging states afterward.
//!
//! This follows the classical four-relation construction (Read, Includes,
//! Follow, Lookback; see DeRemer & Pennello, 1982, and Aho/Sethi/Ullman
//! §4.7): each of Read and Follow is the least fixed point of a relation
//! over a finite node set, computed with one pass of Tarjan's SCC
//! algorithm rather than naive iterate-to-fixpoint.

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::production::Production;
use crate::lalr::items::{Lr0Automaton, ProductionsByHead};
use crate::types::{NonTerminalId, ProductionId, SymbolId};

/// `true` if `symbol` is terminal-like for lookahead purposes: an actual
/// terminal or the distinguished end-of-input marker. Group delimiters
/// never appear inside grammar productions, only in the lexer's group
/// table, so they are not part of this alphabet.
fn is_lookahead_symbol(symbol: SymbolId) -> bool {
  matches!(symbol, SymbolId::Terminal(_) | SymbolId::EndOfInput)
}

fn nullable_set(productions: &[Production], nonterminal_count: usize) -> Vec<bool> {
  let mut nullable = vec![false; nonterminal_count];
  let mut changed = true;
  while changed {
    changed = false;
    for production in productions {
      let head = production.head.index();
      if nullable[head] {
        continue;
      }
      let is_nullable = production.symbols.iter().all(|s| match s {
        SymbolId::NonTerminal(n) => nullable[n.index()],
        _ => false,
      });
      if is_nullable {
        nullable[head] = true;
        changed = true;
      }
    }
  }
  nullable
}

fn sequence_nullable(symbols: &[SymbolId], nullable: &[bool]) -> bool {
  symbols.iter().all(|s| match s {
    SymbolId::NonTerminal(n) => nullable[n.index()],
    _ => false,
  })
}

/// Follows `symbols` from `state` through the LR(0) automaton's goto
/// transitions, returning the resulting state if every step is defined.
fn follow_path(automaton: &Lr0Automaton, state: usize, symbols: &[SymbolId]) -> Option<usize> {
  let mut current = state;
  for symbol in symbols {
    current = *automaton.transitions[current].get(symbol)?;
  }
  Some(current)
}

/// Generic least-fixed-point solver for a relation over a finite node set,
/// using Tarjan's SCC traversal so each node's final value is computed in a
/// single pass (the "digraph algorithm" of DeRemer & Pennello).
fn digraph(
  node_count: usize,
  relation: &[Vec<usize>],
  initial: &[BTreeSet<SymbolId>],
) -> Vec<BTreeSet<SymbolId>> {
  let mut result = initial.to_vec();
  let mut number = vec![0i64; node_count];
  let mut stack: Vec<usize> = Vec::new();
  let mut next_number = 1i64;

  fn traverse(
    x: usize,
    relation: &[Vec<usize>],
    number: &mut [i64],
    stack: &mut Vec<usize>,
    next_number: &mut i64,
    result: &mut [BTreeSet<SymbolId>],
  ) {
    stack.push(x);
    let depth = stack.len() as i64;
    number[x] = depth;
    *next_number += 1;

    for &y in &relation[x] {
      if number[y] == 0 {
        traverse(y, relation, number, stack, next_number, result);
      }
      number[x] = number[x].min(number[y]);
      let addition: Vec<SymbolId> = result[y].iter().copied().collect();
      result[x].extend(addition);
    }

    if number[x] == depth {
      loop {
        let top = *stack.last().unwrap();
        stack.pop();
        number[top] = i64::MAX;
        if top == x {
          break;
        }
        result[top] = result[x].clone();
      }
    }
  }

  for x in 0..node_count {
    if number[x] == 0 {
      traverse(x, relation, &mut number, &mut stack, &mut next_number, &mut result);
    }
  }

  result
}

/// Per-reduce-item lookahead sets, keyed by `(state_index, production)`.
pub type LookaheadTable = BTreeMap<(usize, ProductionId), BTreeSet<SymbolId>>;

pub fn compute_lookaheads(
  automaton: &Lr0Automaton,
  productions_by_head: &ProductionsByHead,
  productions: &[Production],
  nonterminal_count: usize,
) -> LookaheadTable {
  let nullable = nullable_set(productions, nonterminal_count);

  // Dense node ids for every (state, nonterminal) pair with a defined goto.
  let mut node_id: BTreeMap<(usize, NonTerminalId), usize> = BTreeMap::new();
  for (state_index, transitions) in automaton.transitions.iter().enumerate() {
    for (&symbol, _) in transitions {
      if let SymbolId::NonTerminal(nt) = symbol {
        let next_id = node_id.len();
        node_id.insert((state_index, nt), next_id);
      }
    }
  }
  let node_count = node_id.len();

  // DR(p,A): terminals labeling an outgoing edge of goto(p,A).
  let mut dr: Vec<BTreeSet<SymbolId>> = vec![BTreeSet::new(); node_count];
  let mut reads: Vec<Vec<usize>> = vec![Vec::new(); node_count];
  for (&(p, a), &idx) in &node_id {
    let target = automaton.transitions[p][&SymbolId::NonTerminal(a)];
    for (&symbol, _) in &automaton.transitions[target] {
      if is_lookahead_symbol(symbol) {
        dr[idx].insert(symbol);
      }
    }
    for (&symbol, _) in &automaton.transitions[target] {
      if let SymbolId::NonTerminal(c) = symbol {
        if nullable[c.index()] {
          if let Some(&other_idx) = node_id.get(&(target, c)) {
            reads[idx].push(other_idx);
          }
        }
      }
    }
  }

  let read = digraph(node_count, &reads, &dr);

  // includes relation: (p,A) includes (p',B) for each occurrence of A in a
  // production `B -> beta A gamma` with gamma nullable and p' --beta--> p.
  let mut includes: Vec<Vec<usize>> = vec![Vec::new(); node_count];
  for production in productions {
    let head = production.head;
    for (position, symbol) in production.symbols.iter().enumerate() {
      let a = match symbol {
        SymbolId::NonTerminal(n) => *n,
        _ => continue,
      };
      if !sequence_nullable(&production.symbols[position + 1..], &nullable) {
        continue;
      }
      let prefix = &production.symbols[..position];
      for state in 0..automaton.states.len() {
        if let Some(p) = follow_path(automaton, state, prefix) {
          if let (Some(&from_idx), Some(&to_idx)) = (node_id.get(&(p, a)), node_id.get(&(state, head))) {
            includes[from_idx].push(to_idx);
          }
        }
      }
    }
  }

  let follow = digraph(node_count, &includes, &read);

  // lookback: for each reduce item (p, production), find every state p'
  // such that p' --rhs--> p, and accumulate Follow(p', head).
  let mut la: LookaheadTable = LookaheadTable::new();
  for (state_index, items) in automaton.states.iter().enumerate() {
    for item in items {
      if item.dot != productions_by_head.get(item.production).symbols.len() {
        continue;
      }
      let production = productions_by_head.get(item.production);
      let head = production.head;
      let mut set = BTreeSet::new();
      for state in 0..automaton.states.len() {
        if follow_path(automaton, state, &production.symbols) == Some(state_index) {
          if let Some(&idx) = node_id.get(&(state, head)) {
            set.extend(follow[idx].iter().copied());
          } else {
            // `head` is the augmented start symbol with no incoming
            // nonterminal transition recorded (it only ever appears as a
            // production head, never on an rhs): its lookahead is just EOF,
            // contributed directly by the accept item itself.
            set.insert(SymbolId::EndOfInput);
          }
        }
      }
      la.entry((state_index, item.production)).or_default().extend(set);
    }
  }

  la
}
