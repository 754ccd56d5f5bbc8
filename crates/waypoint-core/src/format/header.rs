//! Fixed header and table directory (spec §4.E, concrete layout per
//! SPEC_FULL.md §4.E).

use super::codec::{get_u16, get_u32, get_u8, push_u16, push_u32, push_u8};

pub const MAGIC: &[u8; 8] = b"WAYPTGR\0";
pub const LEGACY_MAGIC: &[u8; 8] = b"WAYPTLEG";
pub const CURRENT_MAJOR: u16 = 1;
pub const CURRENT_MINOR: u16 = 0;
pub const HEADER_LEN: usize = 24;
pub const DIRECTORY_ROW_LEN: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceTag {
  Built = 0,
  Precompiled = 1,
  Converted = 2,
}

impl SourceTag {
  pub fn from_u8(tag: u8) -> Option<SourceTag> {
    match tag {
      0 => Some(SourceTag::Built),
      1 => Some(SourceTag::Precompiled),
      2 => Some(SourceTag::Converted),
      _ => None,
    }
  }
}

/// Table-kind tags for the table directory. `ProductionSymbols` and
/// `GroupNestable` are flat blob tables backing variable-length fields
/// (a production's rhs, a group's nestable set) that don't fit a
/// fixed-width row on their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum TableKind {
  Terminals = 0,
  NonTerminals = 1,
  Productions = 2,
  ProductionSymbols = 3,
  DfaStates = 4,
  DfaEdges = 5,
  LrStates = 6,
  LrActions = 7,
  LrGoto = 8,
  Groups = 9,
  GroupNestable = 10,
  SpecialNames = 11,
  Properties = 12,
  StringHeap = 13,
  StringHeapBlob = 14,
  OperatorGroups = 15,
  OperatorGroupMembers = 16,
  NonTerminalProductions = 17,
  Flags = 18,
}

impl TableKind {
  pub fn from_u16(tag: u16) -> Option<TableKind> {
    use TableKind::*;
    let kinds = [
      Terminals,
      NonTerminals,
      Productions,
      ProductionSymbols,
      DfaStates,
      DfaEdges,
      LrStates,
      LrActions,
      LrGoto,
      Groups,
      GroupNestable,
      SpecialNames,
      Properties,
      StringHeap,
      StringHeapBlob,
      OperatorGroups,
      OperatorGroupMembers,
      NonTerminalProductions,
      Flags,
    ];
    kinds.into_iter().find(|k| *k as u16 == tag)
  }
}

#[derive(Clone, Copy, Debug)]
pub struct DirectoryRow {
  pub kind: TableKind,
  pub offset: u32,
  pub row_count: u32,
  pub row_stride: u16,
}

#[derive(Clone, Debug)]
pub struct Header {
  pub version_major: u16,
  pub version_minor: u16,
  pub source_tag: SourceTag,
  pub directory: Vec<DirectoryRow>,
}

pub fn write_header_placeholder(buf: &mut Vec<u8>) {
  buf.extend_from_slice(MAGIC);
  push_u16(buf, CURRENT_MAJOR);
  push_u16(buf, CURRENT_MINOR);
  push_u8(buf, 0); // source_tag, patched later
  buf.extend_from_slice(&[0, 0, 0]); // reserved
  push_u32(buf, 0); // table_directory_offset, patched later
  push_u32(buf, 0); // table_directory_count, patched later
  debug_assert_eq!(buf.len(), HEADER_LEN);
}

pub fn patch_source_tag(buf: &mut [u8], tag: SourceTag) {
  buf[12] = tag as u8;
}

pub fn patch_directory_location(buf: &mut [u8], offset: u32, count: u32) {
  buf[16..20].copy_from_slice(&offset.to_le_bytes());
  buf[20..24].copy_from_slice(&count.to_le_bytes());
}

#[derive(Debug)]
pub enum HeaderError {
  TooShort,
  BadMagic,
  Legacy,
  VersionTooOld { found_major: u16, found_minor: u16 },
  VersionTooNew { found_major: u16, found_minor: u16, supported_major: u16 },
  MalformedDirectory(String),
}

pub fn parse_header(bytes: &[u8]) -> Result<Header, HeaderError> {
  if bytes.len() < HEADER_LEN {
    return Err(HeaderError::TooShort);
  }
  if &bytes[0..8] == LEGACY_MAGIC {
    return Err(HeaderError::Legacy);
  }
  if &bytes[0..8] != MAGIC {
    return Err(HeaderError::BadMagic);
  }
  let version_major = get_u16(bytes, 8).ok_or(HeaderError::TooShort)?;
  let version_minor = get_u16(bytes, 10).ok_or(HeaderError::TooShort)?;
  if version_major < CURRENT_MAJOR {
    return Err(HeaderError::VersionTooOld { found_major: version_major, found_minor: version_minor });
  }
  if version_major > CURRENT_MAJOR {
    return Err(HeaderError::VersionTooNew {
      found_major: version_major,
      found_minor: version_minor,
      supported_major: CURRENT_MAJOR,
    });
  }
  let source_tag_raw = get_u8(bytes, 12).ok_or(HeaderError::TooShort)?;
  let source_tag = SourceTag::from_u8(source_tag_raw)
    .ok_or_else(|| HeaderError::MalformedDirectory(format!("unknown source tag {source_tag_raw}")))?;
  let directory_offset = get_u32(bytes, 16).ok_or(HeaderError::TooShort)? as usize;
  let directory_count = get_u32(bytes, 20).ok_or(HeaderError::TooShort)? as usize;

  let mut directory = Vec::with_capacity(directory_count);
  for i in 0..directory_count {
    let row_offset = directory_offset + i * DIRECTORY_ROW_LEN;
    let kind_raw = get_u16(bytes, row_offset).ok_or_else(|| HeaderError::MalformedDirectory("directory row out of bounds".into()))?;
    let kind = TableKind::from_u16(kind_raw).ok_or_else(|| HeaderError::MalformedDirectory(format!("unknown table kind {kind_raw}")))?;
    let offset = get_u32(bytes, row_offset + 2).ok_or_else(|| HeaderError::MalformedDirectory("truncated directory row".into()))?;
    let row_count = get_u32(bytes, row_offset + 6).ok_or_else(|| HeaderError::MalformedDirectory("truncated directory row".into()))?;
    let row_stride = get_u16(bytes, row_offset + 10).ok_or_else(|| HeaderError::MalformedDirectory("truncated directory row".into()))?;
    let table_end = offset as usize + row_count as usize * row_stride as usize;
    if table_end > bytes.len() {
      return Err(HeaderError::MalformedDirectory(format!("table {kind:?} extends past end of buffer")));
    }
    directory.push(DirectoryRow { kind, offset, row_count, row_stride });
  }

  Ok(Header { version_major, version_minor, source_tag, directory })
}
