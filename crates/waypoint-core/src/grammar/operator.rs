//! Operator-precedence scope (spec §3 "Operator scope", §4.D (1)): an
//! ordered list of associativity groups used to resolve shift/reduce
//! conflicts that coincide with an operator declaration.

use crate::diagnostics::{BuildCode, Diagnostic};
use crate::types::{OrderedMap, SourceSpan, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Associativity {
  Left,
  Right,
  NonAssoc,
  PrecedenceOnly,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrecedenceGroup {
  pub associativity: Option<Associativity>,
  pub members: Vec<SymbolId>,
}

/// Groups are ordered lowest-to-highest precedence: "lower index = lower
/// precedence" (spec §3). A terminal belongs to at most one group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorScope {
  pub groups: Vec<PrecedenceGroup>,
  owner: OrderedMap<SymbolId, u32>,
}

impl OperatorScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rebuilds a scope from groups read off a mapped artifact (spec §4.E):
  /// the owner lookup is derived, not stored, since it's redundant with
  /// `groups[*].members`.
  pub(crate) fn from_raw_parts(groups: Vec<PrecedenceGroup>) -> Self {
    let mut owner = OrderedMap::new();
    for (index, group) in groups.iter().enumerate() {
      for &member in &group.members {
        owner.entry(member).or_insert(index as u32);
      }
    }
    Self { groups, owner }
  }

  /// Appends a new precedence group one level higher than every group
  /// declared so far, returning its index.
  pub fn push_group(&mut self, associativity: Associativity) -> u32 {
    self.groups.push(PrecedenceGroup { associativity: Some(associativity), members: Vec::new() });
    (self.groups.len() - 1) as u32
  }

  /// Adds `symbol` to `group_index`. A symbol already owned by a different
  /// group is a recoverable `OperatorDefinedTwice` diagnostic and the
  /// second declaration is ignored (spec §3: "a second attempt is a
  /// recoverable diagnostic and is ignored").
  pub fn add_member(&mut self, group_index: u32, symbol: SymbolId, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(&existing) = self.owner.get(&symbol) {
      if existing != group_index {
        diagnostics.push(Diagnostic::new(
          BuildCode::OperatorDefinedTwice,
          SourceSpan::empty(),
          format!("symbol {symbol:?} already belongs to precedence group {existing}; ignoring re-declaration in group {group_index}"),
        ));
      }
      return;
    }
    self.owner.insert(symbol, group_index);
    if let Some(group) = self.groups.get_mut(group_index as usize) {
      group.members.push(symbol);
    }
  }

  pub fn group_of(&self, symbol: SymbolId) -> Option<u32> {
    self.owner.get(&symbol).copied()
  }

  pub fn associativity_of(&self, symbol: SymbolId) -> Option<Associativity> {
    self.group_of(symbol).and_then(|idx| self.groups.get(idx as usize)).and_then(|g| g.associativity)
  }

  /// `Greater`/`Less`/`Equal` by precedence index; `None` if either symbol
  /// has no declared precedence.
  pub fn compare(&self, a: SymbolId, b: SymbolId) -> Option<std::cmp::Ordering> {
    Some(self.group_of(a)?.cmp(&self.group_of(b)?))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::types::TerminalId;

  #[test]
  fn second_distinct_group_is_ignored_with_diagnostic() {
    let mut scope = OperatorScope::new();
    let low = scope.push_group(Associativity::Left);
    let high = scope.push_group(Associativity::Right);
    let mut diagnostics = Vec::new();
    let plus = SymbolId::Terminal(TerminalId::from(0usize));
    scope.add_member(low, plus, &mut diagnostics);
    scope.add_member(high, plus, &mut diagnostics);
    assert_eq!(scope.group_of(plus), Some(low));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, BuildCode::OperatorDefinedTwice);
  }
}
