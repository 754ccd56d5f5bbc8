//! Loads a grammar artifact from bytes (spec §4.E "load by mapping"): this
//! validates offsets and type tags against the table directory but never
//! re-derives anything — every table is read back exactly as
//! [`super::write::serialize`] laid it out.

use std::collections::BTreeMap;

use crate::diagnostics::Diagnostic;
use crate::error::Fatal;
use crate::format::codec::{decode_symbol, get_u32, get_u8, NONE_U32};
use crate::format::header::{parse_header, DirectoryRow, HeaderError, TableKind};
use crate::grammar::artifact::Grammar;
use crate::grammar::group::{Group, GroupAdvanceMode, GroupEndMode};
use crate::grammar::operator::{Associativity, OperatorScope, PrecedenceGroup};
use crate::grammar::production::Production;
use crate::grammar::symbol::{NonTerminal, TerminalInfo};
use crate::lalr::table::{Action, LrState, LrTable};
use crate::regex::dfa::{CharRangeKey, Dfa, DfaState};
use crate::types::{IString, NonTerminalId, OrderedMap, ProductionId, StringHeap, TerminalId};

/// Loads a grammar previously written with [`crate::grammar::Grammar::to_bytes`].
/// Fails only on a malformed or version-incompatible buffer (spec §7:
/// these are `Fatal`, not diagnosable — the caller cannot fix them by
/// editing a grammar). The diagnostics list is empty except when loading
/// a converted legacy artifact, which always carries `LegacyConversionLossy`.
pub fn load_from_bytes(bytes: &[u8]) -> Result<(Grammar, Vec<Diagnostic>), Fatal> {
  let header = match parse_header(bytes) {
    Ok(header) => header,
    Err(HeaderError::Legacy) => return super::legacy::convert_legacy(bytes),
    Err(HeaderError::TooShort) | Err(HeaderError::BadMagic) => {
      return Err(Fatal::MalformedArtifact("missing or unrecognized magic".into()))
    }
    Err(HeaderError::VersionTooOld { found_major, found_minor }) => {
      return Err(Fatal::VersionTooOld { found_major, found_minor })
    }
    Err(HeaderError::VersionTooNew { found_major, found_minor, supported_major }) => {
      return Err(Fatal::VersionTooNew { found_major, found_minor, supported_major })
    }
    Err(HeaderError::MalformedDirectory(msg)) => return Err(Fatal::MalformedArtifact(msg)),
  };

  let directory: BTreeMap<TableKind, DirectoryRow> = header.directory.iter().map(|row| (row.kind, *row)).collect();
  let table = |kind: TableKind| -> Result<&[u8], Fatal> {
    let row = directory.get(&kind).ok_or_else(|| Fatal::MalformedArtifact(format!("missing table {kind:?}")))?;
    let start = row.offset as usize;
    let end = start + row.row_count as usize * row.row_stride as usize;
    bytes.get(start..end).ok_or_else(|| Fatal::MalformedArtifact(format!("table {kind:?} out of bounds")))
  };

  let string_blob_offset =
    directory.get(&TableKind::StringHeapBlob).map(|row| row.offset).unwrap_or(0);
  let strings = read_string_heap(table(TableKind::StringHeap)?, table(TableKind::StringHeapBlob)?, string_blob_offset)?;
  let terminals = read_terminals(table(TableKind::Terminals)?)?;
  let nonterminals = read_nonterminals(table(TableKind::NonTerminals)?, table(TableKind::NonTerminalProductions)?)?;
  let productions = read_productions(table(TableKind::Productions)?, table(TableKind::ProductionSymbols)?)?;
  let lr_table = read_lr_table(table(TableKind::LrStates)?, table(TableKind::LrActions)?, table(TableKind::LrGoto)?)?;
  let groups = read_groups(table(TableKind::Groups)?, table(TableKind::GroupNestable)?)?;
  let operator_scope = read_operator_scope(table(TableKind::OperatorGroups)?, table(TableKind::OperatorGroupMembers)?)?;
  let special_names = read_special_names(table(TableKind::SpecialNames)?)?;
  let properties = read_properties(table(TableKind::Properties)?)?;
  let flags_bytes = table(TableKind::Flags)?;
  let special_names_enabled = flags_bytes.first().copied().unwrap_or(0) != 0;
  let start = NonTerminalId::from(get_u32(flags_bytes, 1).ok_or_else(|| Fatal::MalformedArtifact("truncated flags table".into()))?);
  let dfa_start = get_u32(flags_bytes, 5).ok_or_else(|| Fatal::MalformedArtifact("truncated flags table".into()))? as usize;
  let dfa = read_dfa(table(TableKind::DfaStates)?, table(TableKind::DfaEdges)?, dfa_start)?;

  let grammar = Grammar {
    properties,
    terminals,
    nonterminals,
    productions,
    dfa,
    lr_table,
    groups,
    operator_scope,
    strings,
    special_names,
    special_names_enabled,
    start,
    source_tag: header.source_tag,
    for_parsing: true,
  };
  Ok((grammar, Vec::new()))
}

fn read_string_heap(spans_bytes: &[u8], blob: &[u8], blob_offset: u32) -> Result<StringHeap, Fatal> {
  let mut spans = Vec::new();
  let mut cursor = 0;
  while cursor + 8 <= spans_bytes.len() {
    let offset = get_u32(spans_bytes, cursor).ok_or_else(|| Fatal::MalformedArtifact("truncated string heap".into()))?;
    let len = get_u32(spans_bytes, cursor + 4).ok_or_else(|| Fatal::MalformedArtifact("truncated string heap".into()))?;
    spans.push((offset, len));
    cursor += 8;
  }
  // Spans are absolute offsets into the whole buffer; rebase them to be
  // relative to `blob`, which starts at `blob_offset`.
  let rebased: Vec<(u32, u32)> = spans.iter().map(|&(o, l)| (o - blob_offset, l)).collect();
  Ok(StringHeap::from_raw_parts(blob.to_vec(), rebased))
}

fn read_terminals(bytes: &[u8]) -> Result<Vec<TerminalInfo>, Fatal> {
  let mut out = Vec::new();
  let mut cursor = 0;
  while cursor + 12 <= bytes.len() {
    let name = get_u32(bytes, cursor).ok_or_else(malformed("terminal row"))?;
    let is_noise = get_u8(bytes, cursor + 4).ok_or_else(malformed("terminal row"))? != 0;
    let special_name = get_u32(bytes, cursor + 8).ok_or_else(malformed("terminal row"))?;
    out.push(TerminalInfo {
      name: IString(name),
      is_noise,
      special_name: if special_name == NONE_U32 { None } else { Some(IString(special_name)) },
    });
    cursor += 12;
  }
  Ok(out)
}

fn read_nonterminals(bytes: &[u8], production_blob: &[u8]) -> Result<Vec<NonTerminal>, Fatal> {
  let mut out = Vec::new();
  let mut cursor = 0;
  while cursor + 12 <= bytes.len() {
    let name = get_u32(bytes, cursor).ok_or_else(malformed("nonterminal row"))?;
    let start = get_u32(bytes, cursor + 4).ok_or_else(malformed("nonterminal row"))? as usize;
    let count = get_u32(bytes, cursor + 8).ok_or_else(malformed("nonterminal row"))? as usize;
    let mut productions = Vec::with_capacity(count);
    for i in 0..count {
      let p = get_u32(production_blob, (start + i) * 4).ok_or_else(malformed("nonterminal production blob"))?;
      productions.push(ProductionId(p));
    }
    out.push(NonTerminal { name: IString(name), productions });
    cursor += 12;
  }
  Ok(out)
}

fn read_productions(bytes: &[u8], symbol_blob: &[u8]) -> Result<Vec<Production>, Fatal> {
  let mut out = Vec::new();
  let mut cursor = 0;
  while cursor + 16 <= bytes.len() {
    let head = get_u32(bytes, cursor).ok_or_else(malformed("production row"))?;
    let start = get_u32(bytes, cursor + 4).ok_or_else(malformed("production row"))? as usize;
    let count = get_u32(bytes, cursor + 8).ok_or_else(malformed("production row"))? as usize;
    let precedence = get_u32(bytes, cursor + 12).ok_or_else(malformed("production row"))?;
    let mut symbols = Vec::with_capacity(count);
    for i in 0..count {
      let code = get_u32(symbol_blob, (start + i) * 4).ok_or_else(malformed("production symbol blob"))?;
      symbols.push(decode_symbol(code));
    }
    let mut production = Production::new(NonTerminalId::from(head), symbols);
    if precedence != NONE_U32 {
      production = production.with_precedence(precedence);
    }
    out.push(production);
    cursor += 16;
  }
  Ok(out)
}

fn read_dfa(states_bytes: &[u8], edges_bytes: &[u8], start: usize) -> Result<Dfa, Fatal> {
  let mut states = Vec::new();
  let mut cursor = 0;
  while cursor + 12 <= states_bytes.len() {
    let start = get_u32(states_bytes, cursor).ok_or_else(malformed("dfa state row"))? as usize;
    let count = get_u32(states_bytes, cursor + 4).ok_or_else(malformed("dfa state row"))? as usize;
    let accept = get_u32(states_bytes, cursor + 8).ok_or_else(malformed("dfa state row"))?;
    let mut edges = Vec::with_capacity(count);
    for i in 0..count {
      let edge_offset = (start + i) * 12;
      let lo = get_u32(edges_bytes, edge_offset).ok_or_else(malformed("dfa edge"))?;
      let hi = get_u32(edges_bytes, edge_offset + 4).ok_or_else(malformed("dfa edge"))?;
      let target = get_u32(edges_bytes, edge_offset + 8).ok_or_else(malformed("dfa edge"))? as usize;
      edges.push((CharRangeKey { lo, hi }, target));
    }
    states.push(DfaState { edges, accept: if accept == NONE_U32 { None } else { Some(accept) } });
    cursor += 12;
  }
  Ok(Dfa { states, start })
}

fn read_lr_table(states_bytes: &[u8], actions_bytes: &[u8], goto_bytes: &[u8]) -> Result<LrTable, Fatal> {
  let mut states = Vec::new();
  let mut cursor = 0;
  while cursor + 16 <= states_bytes.len() {
    let actions_start = get_u32(states_bytes, cursor).ok_or_else(malformed("lr state row"))? as usize;
    let actions_count = get_u32(states_bytes, cursor + 4).ok_or_else(malformed("lr state row"))? as usize;
    let goto_start = get_u32(states_bytes, cursor + 8).ok_or_else(malformed("lr state row"))? as usize;
    let goto_count = get_u32(states_bytes, cursor + 12).ok_or_else(malformed("lr state row"))? as usize;

    let mut actions = OrderedMap::new();
    for i in 0..actions_count {
      let row = (actions_start + i) * 12;
      let symbol_code = get_u32(actions_bytes, row).ok_or_else(malformed("lr action"))?;
      let tag = get_u8(actions_bytes, row + 4).ok_or_else(malformed("lr action"))?;
      let payload = get_u32(actions_bytes, row + 8).ok_or_else(malformed("lr action"))?;
      let action = match tag {
        0 => Action::Shift(crate::types::LrStateId::from(payload)),
        1 => Action::Reduce(ProductionId(payload)),
        _ => Action::Accept,
      };
      actions.insert(decode_symbol(symbol_code), action);
    }

    let mut goto = OrderedMap::new();
    for i in 0..goto_count {
      let row = (goto_start + i) * 8;
      let nt = get_u32(goto_bytes, row).ok_or_else(malformed("lr goto"))?;
      let target = get_u32(goto_bytes, row + 4).ok_or_else(malformed("lr goto"))?;
      goto.insert(NonTerminalId::from(nt), crate::types::LrStateId::from(target));
    }

    states.push(LrState { actions, goto });
    cursor += 16;
  }
  Ok(LrTable { states, start: crate::types::LrStateId::from(0u32) })
}

fn read_groups(groups_bytes: &[u8], nestable_blob: &[u8]) -> Result<Vec<Group>, Fatal> {
  let mut out = Vec::new();
  let mut cursor = 0;
  let mut index = 0u32;
  while cursor + 20 <= groups_bytes.len() {
    let start = get_u32(groups_bytes, cursor).ok_or_else(malformed("group row"))?;
    let end = get_u32(groups_bytes, cursor + 4).ok_or_else(malformed("group row"))?;
    let advance_mode = get_u8(groups_bytes, cursor + 8).ok_or_else(malformed("group row"))?;
    let end_mode = get_u8(groups_bytes, cursor + 9).ok_or_else(malformed("group row"))?;
    let nestable_start = get_u32(groups_bytes, cursor + 12).ok_or_else(malformed("group row"))? as usize;
    let nestable_count = get_u32(groups_bytes, cursor + 16).ok_or_else(malformed("group row"))? as usize;

    let mut group = Group::new(
      crate::types::GroupId::from(index),
      TerminalId::from(start),
      TerminalId::from(end),
      decode_advance_mode(advance_mode),
      decode_end_mode(end_mode),
    );
    for i in 0..nestable_count {
      let nested = get_u32(nestable_blob, (nestable_start + i) * 4).ok_or_else(malformed("group nestable blob"))?;
      group.allow_nested(crate::types::GroupId::from(nested));
    }
    out.push(group);
    cursor += 20;
    index += 1;
  }
  Ok(out)
}

fn read_operator_scope(groups_bytes: &[u8], members_blob: &[u8]) -> Result<OperatorScope, Fatal> {
  let mut groups = Vec::new();
  let mut cursor = 0;
  while cursor + 12 <= groups_bytes.len() {
    let associativity = get_u8(groups_bytes, cursor).ok_or_else(malformed("operator group row"))?;
    let start = get_u32(groups_bytes, cursor + 4).ok_or_else(malformed("operator group row"))? as usize;
    let count = get_u32(groups_bytes, cursor + 8).ok_or_else(malformed("operator group row"))? as usize;
    let mut members = Vec::with_capacity(count);
    for i in 0..count {
      let code = get_u32(members_blob, (start + i) * 4).ok_or_else(malformed("operator group member blob"))?;
      members.push(decode_symbol(code));
    }
    groups.push(PrecedenceGroup { associativity: decode_associativity(associativity), members });
    cursor += 12;
  }
  Ok(OperatorScope::from_raw_parts(groups))
}

fn read_special_names(bytes: &[u8]) -> Result<OrderedMap<u32, IString>, Fatal> {
  let mut out = OrderedMap::new();
  let mut cursor = 0;
  while cursor + 8 <= bytes.len() {
    let terminal = get_u32(bytes, cursor).ok_or_else(malformed("special name row"))?;
    let name = get_u32(bytes, cursor + 4).ok_or_else(malformed("special name row"))?;
    out.insert(terminal, IString(name));
    cursor += 8;
  }
  Ok(out)
}

fn read_properties(bytes: &[u8]) -> Result<OrderedMap<String, String>, Fatal> {
  if bytes.is_empty() {
    return Ok(OrderedMap::new());
  }
  serde_json::from_slice(bytes).map_err(|err| Fatal::MalformedArtifact(format!("malformed property map: {err}")))
}

fn decode_advance_mode(b: u8) -> GroupAdvanceMode {
  match b {
    1 => GroupAdvanceMode::Token,
    _ => GroupAdvanceMode::Character,
  }
}

fn decode_end_mode(b: u8) -> GroupEndMode {
  match b {
    1 => GroupEndMode::Closed,
    2 => GroupEndMode::KeepEnd,
    _ => GroupEndMode::Open,
  }
}

fn decode_associativity(b: u8) -> Option<Associativity> {
  match b {
    0 => Some(Associativity::Left),
    1 => Some(Associativity::Right),
    2 => Some(Associativity::NonAssoc),
    _ => None,
  }
}

fn malformed(what: &'static str) -> impl FnOnce() -> Fatal {
  move || Fatal::MalformedArtifact(format!("truncated {what}"))
}
