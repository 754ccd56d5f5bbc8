//! Noise/comment groups (spec §3 "Group", §4.F "Group frames").

use crate::types::{GroupId, OrderedSet, TerminalId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupAdvanceMode {
  /// Advance one character at a time while scanning for the end symbol or a
  /// nested group-start (spec §4.F).
  Character,
  /// Re-enter the outer DFA loop and inspect each produced token symbol.
  Token,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupEndMode {
  /// Pop and resume without consuming the end symbol.
  Open,
  /// Pop and consume the end symbol.
  Closed,
  /// Pop but leave the end symbol unread for the enclosing scope.
  KeepEnd,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
  pub id: GroupId,
  pub start: TerminalId,
  pub end: TerminalId,
  pub advance_mode: GroupAdvanceMode,
  pub end_mode: GroupEndMode,
  /// Groups that may nest inside this one without closing it.
  pub nestable: OrderedSet<GroupId>,
}

impl Group {
  pub fn new(id: GroupId, start: TerminalId, end: TerminalId, advance_mode: GroupAdvanceMode, end_mode: GroupEndMode) -> Self {
    Self { id, start, end, advance_mode, end_mode, nestable: OrderedSet::new() }
  }

  pub fn allow_nested(&mut self, group: GroupId) {
    self.nestable.insert(group);
  }

  pub fn allows_nested(&self, group: GroupId) -> bool {
    self.nestable.contains(&group)
  }
}

pub(crate) type GroupTable = crate::types::Array<Group>;
