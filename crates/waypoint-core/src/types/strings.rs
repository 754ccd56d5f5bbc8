//! A single UTF-8 string heap shared by the in-memory [`crate::grammar::Grammar`]
//! and the serialized [`crate::format`] artifact, so strings never need to be
//! re-interned when crossing that boundary.

use std::collections::HashMap;

/// An interned string. Cheap to copy/compare; resolve back to text with
/// [`StringHeap::resolve`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct IString(pub u32);

/// Append-only string interner backing both the builder and the binary
/// format's string heap (component E). Offsets returned by [`StringHeap::intern`]
/// are stable for the lifetime of the heap: later inserts only append.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringHeap {
  bytes: Vec<u8>,
  /// (offset, length) per interned string, indexed by `IString.0`.
  spans: Vec<(u32, u32)>,
  lookup: HashMap<String, IString>,
}

impl StringHeap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn intern(&mut self, s: &str) -> IString {
    if let Some(id) = self.lookup.get(s) {
      return *id;
    }
    let offset = self.bytes.len() as u32;
    self.bytes.extend_from_slice(s.as_bytes());
    let id = IString(self.spans.len() as u32);
    self.spans.push((offset, s.len() as u32));
    self.lookup.insert(s.to_string(), id);
    id
  }

  pub fn resolve(&self, id: IString) -> &str {
    let (offset, len) = self.spans[id.0 as usize];
    std::str::from_utf8(&self.bytes[offset as usize..(offset + len) as usize]).expect("string heap holds only valid UTF-8")
  }

  pub fn len(&self) -> usize {
    self.spans.len()
  }

  pub fn is_empty(&self) -> bool {
    self.spans.is_empty()
  }

  /// Raw byte payload, for the binary format's string-heap table.
  pub fn raw_bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// `(offset, length)` rows, for the binary format's string-heap directory.
  pub fn raw_spans(&self) -> &[(u32, u32)] {
    &self.spans
  }

  /// Rebuild a `StringHeap` from raw parts read off a mapped artifact.
  pub fn from_raw_parts(bytes: Vec<u8>, spans: Vec<(u32, u32)>) -> Self {
    let mut lookup = HashMap::with_capacity(spans.len());
    for (idx, (offset, len)) in spans.iter().enumerate() {
      let s = std::str::from_utf8(&bytes[*offset as usize..(*offset + *len) as usize]).expect("string heap holds only valid UTF-8");
      lookup.insert(s.to_string(), IString(idx as u32));
    }
    Self { bytes, spans, lookup }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn interning_is_idempotent() {
    let mut heap = StringHeap::new();
    let a = heap.intern("hello");
    let b = heap.intern("world");
    let c = heap.intern("hello");
    assert_eq!(a, c);
    assert_ne!(a, b);
    assert_eq!(heap.resolve(a), "hello");
    assert_eq!(heap.resolve(b), "world");
  }
}
