//! Best-effort conversion of the one hypothetical legacy artifact format
//! (magic `WAYPTLEG`, spec §4.E "Legacy format"): an older generation of
//! grammar artifact that never carried operator-precedence groups, so
//! converting one always discards whatever an embedder layered on top of
//! the wire format for that purpose and reports `LegacyConversionLossy`.

use crate::diagnostics::{BuildCode, Diagnostic, Severity};
use crate::error::Fatal;
use crate::format::codec::get_u32;
use crate::format::header::SourceTag;
use crate::format::read::load_from_bytes;
use crate::grammar::artifact::Grammar;
use crate::grammar::operator::OperatorScope;
use crate::types::SourceSpan;

/// The legacy header: 8-byte magic followed by a `u32` giving the length of
/// an embedded modern-shaped payload. Legacy writers always emitted an
/// empty operator-scope table, but a hand-edited or hand-rolled legacy
/// blob might not, so conversion always clears it explicitly rather than
/// trusting the payload.
pub fn convert_legacy(bytes: &[u8]) -> Result<(Grammar, Vec<Diagnostic>), Fatal> {
  const LEGACY_HEADER_LEN: usize = 12;
  if bytes.len() < LEGACY_HEADER_LEN {
    return Err(Fatal::MalformedArtifact("legacy artifact shorter than its own header".into()));
  }
  let payload_len = get_u32(bytes, 8).ok_or_else(|| Fatal::MalformedArtifact("truncated legacy header".into()))? as usize;
  let payload = bytes
    .get(LEGACY_HEADER_LEN..LEGACY_HEADER_LEN + payload_len)
    .ok_or_else(|| Fatal::MalformedArtifact("legacy payload extends past end of buffer".into()))?;

  let (mut grammar, mut diagnostics) = load_from_bytes(payload)?;
  grammar.operator_scope = OperatorScope::new();
  grammar.source_tag = SourceTag::Converted;

  let diagnostic = Diagnostic::new(
    BuildCode::LegacyConversionLossy,
    SourceSpan::empty(),
    "converted a legacy-format grammar artifact; operator precedence/associativity was not carried forward",
  );
  debug_assert_eq!(diagnostic.severity, Severity::Warning);
  diagnostics.push(diagnostic);

  Ok((grammar, diagnostics))
}
