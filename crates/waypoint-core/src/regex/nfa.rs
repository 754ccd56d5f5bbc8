//! Thompson construction: lowers a [`RegexNode`] into an epsilon-NFA whose
//! accept states carry a priority-ordered marker (spec §4.B: "Thompson
//! ε-NFA with priority"). Each terminal contributes its own fragment;
//! fragments are never merged here — [`crate::regex::dfa::build_dfa`]
//! performs the simultaneous subset construction across all of them.

use crate::charset::CharSet;
use crate::regex::ast::RegexNode;
use crate::types::Array;

pub type NfaStateId = usize;

/// An NFA accept state's priority: lower sorts first, i.e. wins ambiguity
/// resolution (spec §4.B (a)-(c)). `rank` encodes "longest match" only
/// implicitly — the DFA driver establishes that by running every accepting
/// state simultaneously and comparing match length at commit time; `rank`
/// here only breaks ties *between candidates of equal match length*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AcceptPriority {
  /// 0 for a fixed-length branch, 1 for variable-length (spec (b)).
  pub length_class: u8,
  /// Declaration order among symbols (spec (a)-(c) tie-break final step).
  pub declaration_order: u32,
}

#[derive(Clone, Debug)]
pub enum NfaEdge {
  Epsilon,
  OnSet(CharSet),
}

#[derive(Clone, Debug, Default)]
pub struct NfaState {
  pub edges: Vec<(NfaEdge, NfaStateId)>,
  /// `Some((symbol_index, priority))` if accepting for a particular
  /// terminal-like symbol (index into the caller's symbol table).
  pub accept: Option<(u32, AcceptPriority)>,
}

#[derive(Clone, Debug, Default)]
pub struct Nfa {
  pub states: Array<NfaState>,
  pub start: NfaStateId,
}

impl Nfa {
  fn new_state(&mut self) -> NfaStateId {
    self.states.push(NfaState::default());
    self.states.len() - 1
  }

  fn add_edge(&mut self, from: NfaStateId, edge: NfaEdge, to: NfaStateId) {
    self.states[from].edges.push((edge, to));
  }

  /// Builds a single fragment for `node` wired between fresh `start` and
  /// `end` states (end is *not* marked accepting; the caller marks it).
  fn build_fragment(&mut self, node: &RegexNode) -> (NfaStateId, NfaStateId) {
    match node {
      RegexNode::Literal(ch) => {
        let start = self.new_state();
        let end = self.new_state();
        self.add_edge(start, NfaEdge::OnSet(CharSet::single(*ch)), end);
        (start, end)
      }
      RegexNode::Class(set) => {
        let start = self.new_state();
        let end = self.new_state();
        self.add_edge(start, NfaEdge::OnSet(set.clone()), end);
        (start, end)
      }
      RegexNode::Concat(parts) => {
        if parts.is_empty() {
          let start = self.new_state();
          let end = self.new_state();
          self.add_edge(start, NfaEdge::Epsilon, end);
          return (start, end);
        }
        let mut fragments = parts.iter().map(|p| self.build_fragment(p));
        let (start, mut prev_end) = fragments.next().unwrap();
        for (next_start, next_end) in fragments {
          self.add_edge(prev_end, NfaEdge::Epsilon, next_start);
          prev_end = next_end;
        }
        (start, prev_end)
      }
      RegexNode::Alt(parts) => {
        let start = self.new_state();
        let end = self.new_state();
        for part in parts {
          let (p_start, p_end) = self.build_fragment(part);
          self.add_edge(start, NfaEdge::Epsilon, p_start);
          self.add_edge(p_end, NfaEdge::Epsilon, end);
        }
        if parts.is_empty() {
          self.add_edge(start, NfaEdge::Epsilon, end);
        }
        (start, end)
      }
      RegexNode::Repeat { inner, min, max } => self.build_repeat(inner, *min, *max),
    }
  }

  fn build_repeat(&mut self, inner: &RegexNode, min: u32, max: Option<u32>) -> (NfaStateId, NfaStateId) {
    let start = self.new_state();
    let end = self.new_state();
    let mut cursor = start;

    for _ in 0..min {
      let (f_start, f_end) = self.build_fragment(inner);
      self.add_edge(cursor, NfaEdge::Epsilon, f_start);
      cursor = f_end;
    }

    match max {
      None => {
        // Unbounded tail: a looping fragment reachable (and skippable) from
        // `cursor`, per the usual Thompson `*`/`+` construction.
        let (f_start, f_end) = self.build_fragment(inner);
        self.add_edge(cursor, NfaEdge::Epsilon, f_start);
        self.add_edge(f_end, NfaEdge::Epsilon, f_start);
        self.add_edge(f_end, NfaEdge::Epsilon, end);
        self.add_edge(cursor, NfaEdge::Epsilon, end);
      }
      Some(max) => {
        let optional_count = max.saturating_sub(min);
        for _ in 0..optional_count {
          let (f_start, f_end) = self.build_fragment(inner);
          self.add_edge(cursor, NfaEdge::Epsilon, f_start);
          self.add_edge(cursor, NfaEdge::Epsilon, end);
          cursor = f_end;
        }
        self.add_edge(cursor, NfaEdge::Epsilon, end);
      }
    }

    (start, end)
  }

  /// Builds and wires a fragment for `node`, marking `end` as accepting for
  /// `symbol_index` at `priority`.
  pub fn add_symbol(&mut self, node: &RegexNode, symbol_index: u32, priority: AcceptPriority) {
    if self.states.is_empty() {
      self.start = self.new_state();
    }
    let (frag_start, frag_end) = self.build_fragment(node);
    self.add_edge(self.start, NfaEdge::Epsilon, frag_start);
    self.states[frag_end].accept = Some((symbol_index, priority));
  }

  pub fn ensure_start(&mut self) {
    if self.states.is_empty() {
      self.start = self.new_state();
    }
  }

  /// Epsilon-closure of a set of states, as a sorted, deduplicated vector.
  pub fn epsilon_closure(&self, states: &[NfaStateId]) -> Array<NfaStateId> {
    let mut stack: Vec<NfaStateId> = states.to_vec();
    let mut seen: std::collections::BTreeSet<NfaStateId> = states.iter().copied().collect();
    while let Some(s) = stack.pop() {
      for (edge, to) in &self.states[s].edges {
        if matches!(edge, NfaEdge::Epsilon) && seen.insert(*to) {
          stack.push(*to);
        }
      }
    }
    seen.into_iter().collect()
  }

  /// States reachable from `states` by consuming `ch`.
  pub fn step(&self, states: &[NfaStateId], ch: char) -> Array<NfaStateId> {
    let mut out = Vec::new();
    for &s in states {
      for (edge, to) in &self.states[s].edges {
        if let NfaEdge::OnSet(set) = edge {
          if set.contains(ch) {
            out.push(*to);
          }
        }
      }
    }
    out
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::regex::parse::parse_regex;

  #[test]
  fn literal_fragment_accepts_single_char() {
    let mut nfa = Nfa::default();
    let ast = parse_regex("ab").unwrap();
    nfa.add_symbol(&ast, 0, AcceptPriority { length_class: 0, declaration_order: 0 });
    let closure = nfa.epsilon_closure(&[nfa.start]);
    let after_a = nfa.epsilon_closure(&nfa.step(&closure, 'a'));
    assert!(!after_a.is_empty());
    let after_b = nfa.epsilon_closure(&nfa.step(&after_a, 'b'));
    assert!(after_b.iter().any(|&s| nfa.states[s].accept.is_some()));
  }

  #[test]
  fn star_allows_zero_repetitions() {
    let mut nfa = Nfa::default();
    let ast = RegexNode::star(RegexNode::Literal('x'));
    nfa.add_symbol(&ast, 0, AcceptPriority { length_class: 1, declaration_order: 0 });
    let closure = nfa.epsilon_closure(&[nfa.start]);
    assert!(closure.iter().any(|&s| nfa.states[s].accept.is_some()));
  }
}
