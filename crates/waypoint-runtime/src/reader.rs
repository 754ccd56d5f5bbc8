//! Component F input model (spec §4.F): a reader owns a `T`-unit input
//! sequence and exposes a zero-copy view over it, an integer offset
//! advance, and a way to signal that more input may arrive later.
//!
//! Grounded on the teacher's `ByteCharacterReader`/`UTF8CharacterReader`/
//! `ImmutCharacterReader` trait family (`hctk`'s `types/reader.rs`),
//! generalized to be generic over the character unit and rewritten
//! without the teacher's raw-pointer `InputBlock`/dword-packing
//! machinery: every view here is a borrowed slice, decoding is a plain
//! function, and there is no `unsafe`.

use std::ops::Range;

/// The longest a single decoded character can occupy in any unit type this
/// crate ships a reader for (4 bytes of UTF-8, 2 units of UTF-16, 1 `char`).
pub const MAX_UNITS_PER_CHAR: usize = 4;

/// One decoded `char` plus how many `T` units it occupied, so the
/// tokenizer can advance the reader's integer offset correctly regardless
/// of whether `T` is `u8` (UTF-8), `u16` (UTF-16), or `char` (already
/// decoded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedChar {
  pub ch: char,
  pub units: usize,
}

/// A reader over a sequence of `T` units (spec §4.F). The tokenizer only
/// ever reads forward from its own cursor; implementations never need to
/// support random writes or a read head of their own.
pub trait CharacterReader<T: Copy> {
  /// Total number of `T` units currently known to exist, or `None` if the
  /// reader is streaming and the final length isn't known yet (spec §4.F
  /// "partial input").
  fn len_units(&self) -> Option<usize>;

  /// Zero-copy view of the units in `range`, clamped to what is currently
  /// buffered. Never panics on an out-of-bounds range.
  fn slice(&self, range: Range<usize>) -> &[T];

  /// Decode the character starting at `units[0]`, if a whole character is
  /// currently available in `units`. Returns `None` both when `units` is
  /// empty and when it holds an incomplete trailing sequence.
  fn decode(&self, units: &[T]) -> Option<DecodedChar>;

  /// Attempt to pull more input into the buffer (e.g. read another chunk
  /// from a file or socket). Returns `true` if at least one more unit
  /// became available. A reader that already holds the entire input
  /// always returns `false`.
  fn request_more(&mut self) -> bool;

  /// `true` once the reader is known-complete and `cursor` has consumed
  /// everything it holds.
  fn at_end(&self, cursor: usize) -> bool {
    matches!(self.len_units(), Some(len) if cursor >= len)
  }
}

/// A reader over already-decoded `char`s — the simplest case, typically
/// used when the embedder already materialized the input as a `String`.
pub struct CharReader {
  buf: Vec<char>,
  complete: bool,
}

impl CharReader {
  pub fn new(input: impl Into<Vec<char>>) -> Self {
    Self { buf: input.into(), complete: true }
  }

  pub fn from_str(s: &str) -> Self {
    Self { buf: s.chars().collect(), complete: true }
  }

  /// A reader that starts empty and is fed via [`CharReader::push`], for
  /// chunked/streaming input (spec §4.F, §8 property 6).
  pub fn streaming() -> Self {
    Self { buf: Vec::new(), complete: false }
  }

  pub fn push(&mut self, more: impl IntoIterator<Item = char>) {
    self.buf.extend(more);
  }

  /// Marks the buffer as final: no further [`CharReader::push`] will ever
  /// add more, so reaching its end is true end-of-input rather than a
  /// suspension point.
  pub fn mark_complete(&mut self) {
    self.complete = true;
  }
}

impl CharacterReader<char> for CharReader {
  fn len_units(&self) -> Option<usize> {
    self.complete.then_some(self.buf.len())
  }

  fn slice(&self, range: Range<usize>) -> &[char] {
    let end = range.end.min(self.buf.len());
    let start = range.start.min(end);
    &self.buf[start..end]
  }

  fn decode(&self, units: &[char]) -> Option<DecodedChar> {
    units.first().map(|&ch| DecodedChar { ch, units: 1 })
  }

  fn request_more(&mut self) -> bool {
    false
  }
}

/// A reader over raw UTF-8 bytes, decoding one Unicode scalar value at a
/// time. The streaming form is fed with [`Utf8Reader::push`]; an
/// incomplete trailing byte sequence at the end of the currently buffered
/// data is treated the same as "need more input" while the reader isn't
/// yet marked complete.
pub struct Utf8Reader {
  buf: Vec<u8>,
  complete: bool,
}

impl Utf8Reader {
  pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
    Self { buf: bytes.into(), complete: true }
  }

  pub fn streaming() -> Self {
    Self { buf: Vec::new(), complete: false }
  }

  pub fn push(&mut self, bytes: &[u8]) {
    self.buf.extend_from_slice(bytes);
  }

  pub fn mark_complete(&mut self) {
    self.complete = true;
  }
}

impl CharacterReader<u8> for Utf8Reader {
  fn len_units(&self) -> Option<usize> {
    self.complete.then_some(self.buf.len())
  }

  fn slice(&self, range: Range<usize>) -> &[u8] {
    let end = range.end.min(self.buf.len());
    let start = range.start.min(end);
    &self.buf[start..end]
  }

  fn decode(&self, units: &[u8]) -> Option<DecodedChar> {
    if units.is_empty() {
      return None;
    }
    let take = units.len().min(MAX_UNITS_PER_CHAR);
    match std::str::from_utf8(&units[..take]) {
      Ok(s) => s.chars().next().map(|ch| DecodedChar { ch, units: ch.len_utf8() }),
      Err(e) => {
        let valid = e.valid_up_to();
        if valid > 0 {
          let s = std::str::from_utf8(&units[..valid]).expect("validated prefix is valid UTF-8");
          s.chars().next().map(|ch| DecodedChar { ch, units: ch.len_utf8() })
        } else {
          // Either a genuinely invalid byte, or a truncated sequence at
          // the tail of what's buffered so far; either way the caller
          // decides (more input vs. true end) from `request_more`/`at_end`.
          None
        }
      }
    }
  }

  fn request_more(&mut self) -> bool {
    false
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn char_reader_decodes_one_unit_at_a_time() {
    let reader = CharReader::from_str("ab");
    assert_eq!(reader.decode(reader.slice(0..4)), Some(DecodedChar { ch: 'a', units: 1 }));
    assert_eq!(reader.decode(reader.slice(1..4)), Some(DecodedChar { ch: 'b', units: 1 }));
    assert_eq!(reader.decode(reader.slice(2..4)), None);
  }

  #[test]
  fn utf8_reader_decodes_multibyte_sequences() {
    let reader = Utf8Reader::new("a\u{20AC}".as_bytes().to_vec());
    let first = reader.decode(reader.slice(0..4)).unwrap();
    assert_eq!(first, DecodedChar { ch: 'a', units: 1 });
    let second = reader.decode(reader.slice(1..4)).unwrap();
    assert_eq!(second, DecodedChar { ch: '\u{20AC}', units: 3 });
  }

  #[test]
  fn utf8_reader_reports_incomplete_tail_as_undecodable() {
    let bytes = "\u{20AC}".as_bytes();
    let mut reader = Utf8Reader::streaming();
    reader.push(&bytes[..1]);
    assert_eq!(reader.decode(reader.slice(0..4)), None);
    assert!(!reader.at_end(0));
  }
}
