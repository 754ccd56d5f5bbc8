//! Regex AST (spec §4.B): literal, any-of (character set), concatenation,
//! alternation, and bounded/unbounded repetition. "Optional" is sugar for
//! `Repeat { min: 0, max: Some(1) }` (spec: "optional sugar").

use crate::charset::CharSet;

#[derive(Clone, Debug)]
pub enum RegexNode {
  /// A single literal character.
  Literal(char),
  /// A character class, e.g. `[a-zA-Z_]`.
  Class(CharSet),
  /// A sequence of sub-expressions, matched in order.
  Concat(Vec<RegexNode>),
  /// A choice between sub-expressions (spec §4.B point (c): each branch of
  /// an alternation root is classified separately for fixed/variable
  /// length during ambiguity resolution).
  Alt(Vec<RegexNode>),
  /// `inner{min,max}`; `max = None` means unbounded (`*`, `+`, `{n,}`).
  Repeat { inner: Box<RegexNode>, min: u32, max: Option<u32> },
}

impl RegexNode {
  pub fn concat(parts: Vec<RegexNode>) -> RegexNode {
    if parts.len() == 1 {
      parts.into_iter().next().unwrap()
    } else {
      RegexNode::Concat(parts)
    }
  }

  pub fn alt(parts: Vec<RegexNode>) -> RegexNode {
    if parts.len() == 1 {
      parts.into_iter().next().unwrap()
    } else {
      RegexNode::Alt(parts)
    }
  }

  pub fn star(inner: RegexNode) -> RegexNode {
    RegexNode::Repeat { inner: Box::new(inner), min: 0, max: None }
  }

  pub fn plus(inner: RegexNode) -> RegexNode {
    RegexNode::Repeat { inner: Box::new(inner), min: 1, max: None }
  }

  /// The "optional" sugar named explicitly in spec §4.B.
  pub fn optional(inner: RegexNode) -> RegexNode {
    RegexNode::Repeat { inner: Box::new(inner), min: 0, max: Some(1) }
  }

  pub fn repeat_exact(inner: RegexNode, n: u32) -> RegexNode {
    RegexNode::Repeat { inner: Box::new(inner), min: n, max: Some(n) }
  }

  pub fn repeat_range(inner: RegexNode, min: u32, max: Option<u32>) -> RegexNode {
    RegexNode::Repeat { inner: Box::new(inner), min, max }
  }

  pub fn empty_class() -> RegexNode {
    RegexNode::Class(CharSet::empty())
  }

  /// True if this node (or any sub-node it is built from) can only ever
  /// denote the empty language: an empty character class, an empty
  /// alternation, or the complement of the full universe. Spec §4.B
  /// "Degenerate regexes".
  pub fn matches_nothing(&self) -> bool {
    match self {
      RegexNode::Literal(_) => false,
      RegexNode::Class(set) => set.is_empty(),
      RegexNode::Concat(parts) => parts.iter().any(RegexNode::matches_nothing),
      RegexNode::Alt(parts) => parts.is_empty() || parts.iter().all(RegexNode::matches_nothing),
      RegexNode::Repeat { inner, min, .. } => *min > 0 && inner.matches_nothing(),
    }
  }

  /// `Some(len)` if every string in `L(self)` has exactly `len` characters;
  /// `None` if the language is variable-length (or empty). Used for the
  /// "fixed-length > variable-length" tie-break priority (spec §4.B).
  pub fn fixed_length(&self) -> Option<u32> {
    match self {
      RegexNode::Literal(_) => Some(1),
      RegexNode::Class(set) => {
        if set.is_empty() {
          None
        } else {
          Some(1)
        }
      }
      RegexNode::Concat(parts) => parts.iter().try_fold(0u32, |acc, p| p.fixed_length().map(|l| acc + l)),
      RegexNode::Alt(parts) => {
        let mut lens = parts.iter().filter(|p| !p.matches_nothing()).map(RegexNode::fixed_length);
        let first = lens.next()??;
        if lens.all(|l| l == Some(first)) {
          Some(first)
        } else {
          None
        }
      }
      RegexNode::Repeat { inner, min, max } => match max {
        Some(max) if *max == *min => inner.fixed_length().map(|l| l * min),
        _ => None,
      },
    }
  }

  /// Number of AST nodes, used to size the DFA state budget (spec §4.B
  /// "Bounded-state safety": the budget scales linearly with summed regex
  /// AST size).
  pub fn node_count(&self) -> usize {
    match self {
      RegexNode::Literal(_) | RegexNode::Class(_) => 1,
      RegexNode::Concat(parts) | RegexNode::Alt(parts) => 1 + parts.iter().map(RegexNode::node_count).sum::<usize>(),
      RegexNode::Repeat { inner, .. } => 1 + inner.node_count(),
    }
  }

  /// For an `Alt` root, the list of branches each classified on their own
  /// (spec §4.B point (c)); for any other root, a single-element slice
  /// containing `self`.
  pub fn classification_branches(&self) -> Vec<&RegexNode> {
    match self {
      RegexNode::Alt(parts) => parts.iter().collect(),
      other => vec![other],
    }
  }
}
