//! Serializes a built grammar into the packed binary layout (spec §4.E).
//!
//! Every table is built independently as raw bytes first; once every
//! table's length is known, offsets are assigned left-to-right and the
//! string heap's span table is patched with the string blob's final
//! absolute offset. This two-pass approach is what lets the string heap
//! spans be plain 32-bit absolute offsets rather than needing a pointer
//! fixup format.

use crate::format::codec::{encode_symbol, push_u16, push_u32, push_u8, NONE_U32};
use crate::format::header::{self, DirectoryRow, SourceTag, TableKind};
use crate::grammar::group::{Group, GroupAdvanceMode, GroupEndMode};
use crate::grammar::operator::{Associativity, OperatorScope};
use crate::grammar::production::Production;
use crate::grammar::symbol::{NonTerminal, TerminalInfo};
use crate::lalr::table::{Action, LrTable};
use crate::regex::dfa::Dfa;
use crate::types::{OrderedMap, StringHeap};

pub struct GrammarParts<'a> {
  pub terminals: &'a [TerminalInfo],
  pub nonterminals: &'a [NonTerminal],
  pub productions: &'a [Production],
  pub dfa: &'a Dfa,
  pub lr_table: &'a LrTable,
  pub groups: &'a [Group],
  pub operator_scope: &'a OperatorScope,
  pub strings: &'a StringHeap,
  pub properties: &'a OrderedMap<String, String>,
  pub special_names: &'a OrderedMap<u32, crate::types::IString>,
  pub special_names_enabled: bool,
  pub start: crate::types::NonTerminalId,
}

struct Table {
  kind: TableKind,
  bytes: Vec<u8>,
  row_count: u32,
  row_stride: u16,
}

fn table(kind: TableKind, bytes: Vec<u8>, row_count: u32, row_stride: u16) -> Table {
  Table { kind, bytes, row_count, row_stride }
}

pub fn serialize(parts: &GrammarParts, source_tag: SourceTag) -> Vec<u8> {
  let mut tables = Vec::new();

  // Terminals
  let mut terminals_bytes = Vec::new();
  for t in parts.terminals {
    push_u32(&mut terminals_bytes, t.name.0);
    push_u8(&mut terminals_bytes, t.is_noise as u8);
    terminals_bytes.extend_from_slice(&[0, 0, 0]);
    push_u32(&mut terminals_bytes, t.special_name.map(|s| s.0).unwrap_or(NONE_U32));
  }
  tables.push(table(TableKind::Terminals, terminals_bytes, parts.terminals.len() as u32, 12));

  // NonTerminalProductions blob + NonTerminals
  let mut nt_productions_blob = Vec::new();
  let mut nonterminals_bytes = Vec::new();
  for nt in parts.nonterminals {
    let start = (nt_productions_blob.len() / 4) as u32;
    for production_id in &nt.productions {
      push_u32(&mut nt_productions_blob, production_id.0);
    }
    push_u32(&mut nonterminals_bytes, nt.name.0);
    push_u32(&mut nonterminals_bytes, start);
    push_u32(&mut nonterminals_bytes, nt.productions.len() as u32);
  }
  tables.push(table(TableKind::NonTerminals, nonterminals_bytes, parts.nonterminals.len() as u32, 12));
  let nt_production_count = (nt_productions_blob.len() / 4) as u32;
  tables.push(table(TableKind::NonTerminalProductions, nt_productions_blob, nt_production_count, 4));

  // ProductionSymbols blob + Productions
  let mut symbols_blob = Vec::new();
  let mut productions_bytes = Vec::new();
  for p in parts.productions {
    let start = (symbols_blob.len() / 4) as u32;
    for &symbol in &p.symbols {
      push_u32(&mut symbols_blob, encode_symbol(symbol));
    }
    push_u32(&mut productions_bytes, p.head.0);
    push_u32(&mut productions_bytes, start);
    push_u32(&mut productions_bytes, p.symbols.len() as u32);
    push_u32(&mut productions_bytes, p.precedence.unwrap_or(NONE_U32));
  }
  tables.push(table(TableKind::Productions, productions_bytes, parts.productions.len() as u32, 16));
  let symbol_count = (symbols_blob.len() / 4) as u32;
  tables.push(table(TableKind::ProductionSymbols, symbols_blob, symbol_count, 4));

  // DfaEdges + DfaStates
  let mut dfa_edges_bytes = Vec::new();
  let mut dfa_states_bytes = Vec::new();
  for state in &parts.dfa.states {
    let start = (dfa_edges_bytes.len() / 12) as u32;
    for (range, target) in &state.edges {
      push_u32(&mut dfa_edges_bytes, range.lo);
      push_u32(&mut dfa_edges_bytes, range.hi);
      push_u32(&mut dfa_edges_bytes, *target as u32);
    }
    push_u32(&mut dfa_states_bytes, start);
    push_u32(&mut dfa_states_bytes, state.edges.len() as u32);
    push_u32(&mut dfa_states_bytes, state.accept.unwrap_or(NONE_U32));
  }
  tables.push(table(TableKind::DfaStates, dfa_states_bytes, parts.dfa.states.len() as u32, 12));
  let dfa_edge_count = (dfa_edges_bytes.len() / 12) as u32;
  tables.push(table(TableKind::DfaEdges, dfa_edges_bytes, dfa_edge_count, 12));

  // LrActions + LrGoto + LrStates
  let mut lr_actions_bytes = Vec::new();
  let mut lr_goto_bytes = Vec::new();
  let mut lr_states_bytes = Vec::new();
  for state in &parts.lr_table.states {
    let actions_start = (lr_actions_bytes.len() / 12) as u32;
    for (&symbol, &action) in &state.actions {
      push_u32(&mut lr_actions_bytes, encode_symbol(symbol));
      match action {
        Action::Shift(s) => {
          push_u8(&mut lr_actions_bytes, 0);
          lr_actions_bytes.extend_from_slice(&[0, 0, 0]);
          push_u32(&mut lr_actions_bytes, s.0);
        }
        Action::Reduce(p) => {
          push_u8(&mut lr_actions_bytes, 1);
          lr_actions_bytes.extend_from_slice(&[0, 0, 0]);
          push_u32(&mut lr_actions_bytes, p.0);
        }
        Action::Accept => {
          push_u8(&mut lr_actions_bytes, 2);
          lr_actions_bytes.extend_from_slice(&[0, 0, 0]);
          push_u32(&mut lr_actions_bytes, 0);
        }
      }
    }
    let goto_start = (lr_goto_bytes.len() / 8) as u32;
    for (&nt, &target) in &state.goto {
      push_u32(&mut lr_goto_bytes, nt.0);
      push_u32(&mut lr_goto_bytes, target.0);
    }
    push_u32(&mut lr_states_bytes, actions_start);
    push_u32(&mut lr_states_bytes, state.actions.len() as u32);
    push_u32(&mut lr_states_bytes, goto_start);
    push_u32(&mut lr_states_bytes, state.goto.len() as u32);
  }
  tables.push(table(TableKind::LrStates, lr_states_bytes, parts.lr_table.states.len() as u32, 16));
  let lr_action_count = (lr_actions_bytes.len() / 12) as u32;
  tables.push(table(TableKind::LrActions, lr_actions_bytes, lr_action_count, 12));
  let lr_goto_count = (lr_goto_bytes.len() / 8) as u32;
  tables.push(table(TableKind::LrGoto, lr_goto_bytes, lr_goto_count, 8));

  // GroupNestable + Groups
  let mut group_nestable_bytes = Vec::new();
  let mut groups_bytes = Vec::new();
  for g in parts.groups {
    let start = (group_nestable_bytes.len() / 4) as u32;
    for nested in &g.nestable {
      push_u32(&mut group_nestable_bytes, nested.0);
    }
    push_u32(&mut groups_bytes, g.start.0);
    push_u32(&mut groups_bytes, g.end.0);
    push_u8(&mut groups_bytes, advance_mode_byte(g.advance_mode));
    push_u8(&mut groups_bytes, end_mode_byte(g.end_mode));
    groups_bytes.extend_from_slice(&[0, 0]);
    push_u32(&mut groups_bytes, start);
    push_u32(&mut groups_bytes, g.nestable.len() as u32);
  }
  tables.push(table(TableKind::Groups, groups_bytes, parts.groups.len() as u32, 20));
  let nestable_count = (group_nestable_bytes.len() / 4) as u32;
  tables.push(table(TableKind::GroupNestable, group_nestable_bytes, nestable_count, 4));

  // SpecialNames
  let mut special_names_bytes = Vec::new();
  let mut special_names_rows = 0u32;
  if parts.special_names_enabled {
    for (&terminal, &name) in parts.special_names {
      push_u32(&mut special_names_bytes, terminal);
      push_u32(&mut special_names_bytes, name.0);
      special_names_rows += 1;
    }
  }
  tables.push(table(TableKind::SpecialNames, special_names_bytes, special_names_rows, 8));

  // Properties (raw JSON bytes; not on the hot load-by-mapping path)
  let properties_bytes = serde_json::to_vec(parts.properties).unwrap_or_default();
  let properties_len = properties_bytes.len() as u32;
  tables.push(table(TableKind::Properties, properties_bytes, properties_len, 1));

  // OperatorGroupMembers + OperatorGroups
  let mut operator_members_bytes = Vec::new();
  let mut operator_groups_bytes = Vec::new();
  for group in &parts.operator_scope.groups {
    let start = (operator_members_bytes.len() / 4) as u32;
    for &member in &group.members {
      push_u32(&mut operator_members_bytes, encode_symbol(member));
    }
    push_u8(&mut operator_groups_bytes, associativity_byte(group.associativity));
    operator_groups_bytes.extend_from_slice(&[0, 0, 0]);
    push_u32(&mut operator_groups_bytes, start);
    push_u32(&mut operator_groups_bytes, group.members.len() as u32);
  }
  tables.push(table(TableKind::OperatorGroups, operator_groups_bytes, parts.operator_scope.groups.len() as u32, 12));
  let operator_member_count = (operator_members_bytes.len() / 4) as u32;
  tables.push(table(TableKind::OperatorGroupMembers, operator_members_bytes, operator_member_count, 4));

  // StringHeap spans (local offsets into the blob for now) + blob
  let mut string_spans_bytes = Vec::new();
  let mut string_blob_bytes = Vec::new();
  for local_offset in 0..parts.strings.len() {
    let text = parts.strings.resolve(crate::types::IString(local_offset as u32));
    push_u32(&mut string_spans_bytes, string_blob_bytes.len() as u32);
    push_u32(&mut string_spans_bytes, text.len() as u32);
    string_blob_bytes.extend_from_slice(text.as_bytes());
  }
  tables.push(table(TableKind::StringHeap, string_spans_bytes, parts.strings.len() as u32, 8));
  let string_blob_len = string_blob_bytes.len() as u32;
  tables.push(table(TableKind::StringHeapBlob, string_blob_bytes, string_blob_len, 1));

  // Flags: `special_names_enabled` (the SpecialNames table's row count
  // alone can't distinguish "enabled but empty" from "disabled") plus the
  // start nonterminal, which the production graph alone can't recover
  // once a start nonterminal's own productions reference it recursively,
  // plus the DFA's own start state: `minimize()` remaps it to whatever
  // partition class the initial state lands in, which is not guaranteed
  // to be 0.
  let mut flags_bytes = Vec::with_capacity(9);
  push_u8(&mut flags_bytes, parts.special_names_enabled as u8);
  push_u32(&mut flags_bytes, parts.start.0);
  push_u32(&mut flags_bytes, parts.dfa.start as u32);
  tables.push(table(TableKind::Flags, flags_bytes, 1, 9));

  assemble(tables, source_tag)
}

fn advance_mode_byte(mode: GroupAdvanceMode) -> u8 {
  match mode {
    GroupAdvanceMode::Character => 0,
    GroupAdvanceMode::Token => 1,
  }
}

fn end_mode_byte(mode: GroupEndMode) -> u8 {
  match mode {
    GroupEndMode::Open => 0,
    GroupEndMode::Closed => 1,
    GroupEndMode::KeepEnd => 2,
  }
}

fn associativity_byte(assoc: Option<Associativity>) -> u8 {
  match assoc {
    Some(Associativity::Left) => 0,
    Some(Associativity::Right) => 1,
    Some(Associativity::NonAssoc) => 2,
    Some(Associativity::PrecedenceOnly) | None => 3,
  }
}

fn assemble(tables: Vec<Table>, source_tag: SourceTag) -> Vec<u8> {
  let directory_offset = header::HEADER_LEN as u32;
  let directory_len = tables.len() as u32 * header::DIRECTORY_ROW_LEN as u32;
  let mut payload_offset = directory_offset + directory_len;

  let mut rows = Vec::with_capacity(tables.len());
  let mut string_heap_row_index = None;
  let mut string_heap_blob_offset = 0u32;

  for (index, t) in tables.iter().enumerate() {
    rows.push(DirectoryRow { kind: t.kind, offset: payload_offset, row_count: t.row_count, row_stride: t.row_stride });
    if t.kind == TableKind::StringHeap {
      string_heap_row_index = Some(index);
    }
    if t.kind == TableKind::StringHeapBlob {
      string_heap_blob_offset = payload_offset;
    }
    payload_offset += t.bytes.len() as u32;
  }

  let mut buf = Vec::with_capacity(payload_offset as usize);
  header::write_header_placeholder(&mut buf);
  header::patch_source_tag(&mut buf, source_tag);
  header::patch_directory_location(&mut buf, directory_offset, tables.len() as u32);

  for row in &rows {
    push_u16(&mut buf, row.kind as u16);
    push_u32(&mut buf, row.offset);
    push_u32(&mut buf, row.row_count);
    push_u16(&mut buf, row.row_stride);
  }

  for (index, t) in tables.into_iter().enumerate() {
    if Some(index) == string_heap_row_index {
      // Patch span starts from blob-relative to absolute-in-buffer now
      // that the blob's final offset is known.
      let mut patched = t.bytes;
      let mut cursor = 0;
      while cursor + 8 <= patched.len() {
        let local_start = u32::from_le_bytes(patched[cursor..cursor + 4].try_into().unwrap());
        let absolute = local_start + string_heap_blob_offset;
        patched[cursor..cursor + 4].copy_from_slice(&absolute.to_le_bytes());
        cursor += 8;
      }
      buf.extend_from_slice(&patched);
    } else {
      buf.extend_from_slice(&t.bytes);
    }
  }

  buf
}
