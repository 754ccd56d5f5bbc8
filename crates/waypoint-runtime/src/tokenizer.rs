//! Component F: the streaming tokenizer (spec §4.F) — a DFA driver with
//! longest-match + priority tie-break, noise/group disposition, and
//! partial-input suspension.
//!
//! Grounded on the teacher's outer/inner scan-loop split between its
//! token scanner and its group/comment handling (`hctk`'s lexer), rewired
//! around `waypoint_core`'s single shared DFA instead of the teacher's
//! per-symbol scan functions.

use std::collections::HashMap;

use waypoint_core::grammar::{Grammar, GroupAdvanceMode, GroupEndMode};
use waypoint_core::regex::dfa::DfaStateIndex;
use waypoint_core::types::{GroupId, SourceSpan, TerminalId};
use waypoint_core::RuntimeCode;

use crate::error::RuntimeError;
use crate::reader::{CharacterReader, MAX_UNITS_PER_CHAR};

/// A committed, non-noise, non-group-delimiter token (spec §3 "Symbol").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
  pub terminal: TerminalId,
  pub span: SourceSpan,
}

/// What [`Tokenizer::next_token`] produced on one call.
#[derive(Clone, Copy, Debug)]
pub enum TokenizerEvent {
  Token(Token),
  EndOfInput,
  /// The reader ran out of buffered input before a match could be
  /// resolved one way or another; internal scan state is preserved and
  /// the same call resumes exactly where it left off once the reader has
  /// more (spec §4.F "Partial input / suspension").
  NeedMoreInput,
}

#[derive(Clone, Copy, Debug)]
struct GroupFrame {
  group: GroupId,
  end: TerminalId,
  advance_mode: GroupAdvanceMode,
  end_mode: GroupEndMode,
}

/// An in-progress maximal-munch DFA walk, kept on the tokenizer itself so a
/// `NeedMoreInput` return leaves it resumable.
#[derive(Clone, Copy, Debug)]
struct ScanState {
  start: usize,
  cursor: usize,
  dfa_state: DfaStateIndex,
  best: Option<(usize, TerminalId)>,
  first_char_units: Option<usize>,
}

enum MatchOutcome {
  Accepted { symbol: TerminalId, end: usize },
  /// Nothing was ever accepted along this walk; `advance` is the width
  /// (in reader units) of the single character the walk started on, per
  /// spec §4.F (a): "advance one character", not the whole failed walk.
  NoMatch { advance: usize },
  NeedMoreInput,
  EndOfInput,
}

/// Drives a grammar's shared DFA over a reader, applying noise/group
/// disposition and maintaining the group stack (spec §4.F).
pub struct Tokenizer<'g> {
  grammar: &'g Grammar,
  cursor: usize,
  group_stack: Vec<GroupFrame>,
  group_by_start: HashMap<TerminalId, GroupId>,
  group_by_end: HashMap<TerminalId, GroupId>,
  pending_scan: Option<ScanState>,
  suspended: bool,
}

impl<'g> Tokenizer<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    let mut group_by_start = HashMap::new();
    let mut group_by_end = HashMap::new();
    for group in grammar.groups() {
      group_by_start.insert(group.start, group.id);
      group_by_end.insert(group.end, group.id);
    }
    Self { grammar, cursor: 0, group_stack: Vec::new(), group_by_start, group_by_end, pending_scan: None, suspended: false }
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  /// Explicit suspension hook for a user rule the DFA can't express
  /// directly (spec §4.F, e.g. offside/indentation rules). While
  /// suspended, every call to [`Tokenizer::next_token`] reports
  /// `NeedMoreInput` without touching reader or scan state; resuming
  /// either emits the token the suspension interrupted or requests more
  /// input, exactly as an ordinary suspension would.
  pub fn suspend(&mut self) {
    self.suspended = true;
  }

  pub fn resume(&mut self) {
    self.suspended = false;
  }

  pub fn next_token<T: Copy, R: CharacterReader<T>>(&mut self, reader: &mut R) -> Result<TokenizerEvent, RuntimeError> {
    if self.suspended {
      return Ok(TokenizerEvent::NeedMoreInput);
    }
    loop {
      if let Some(&frame) = self.group_stack.last() {
        if let Some(event) = self.step_inside_group(reader, frame)? {
          return Ok(event);
        }
        continue;
      }
      match self.drive_dfa(reader) {
        MatchOutcome::NeedMoreInput => return Ok(TokenizerEvent::NeedMoreInput),
        MatchOutcome::EndOfInput => return Ok(TokenizerEvent::EndOfInput),
        MatchOutcome::NoMatch { advance } => {
          let start = self.cursor;
          self.cursor += advance;
          return Err(RuntimeError::new(
            RuntimeCode::UnrecognizedInput,
            span(start, self.cursor),
            "no terminal matches the input at this position",
          ));
        }
        MatchOutcome::Accepted { symbol, end } => {
          let start = self.cursor;
          self.cursor = end;
          if let Some(&group) = self.group_by_start.get(&symbol) {
            self.push_group(group);
            continue;
          }
          if self.grammar.terminals()[symbol.index()].is_noise {
            continue;
          }
          return Ok(TokenizerEvent::Token(Token { terminal: symbol, span: span(start, end) }));
        }
      }
    }
  }

  fn push_group(&mut self, group: GroupId) {
    let g = &self.grammar.groups()[group.index()];
    self.group_stack.push(GroupFrame { group: g.id, end: g.end, advance_mode: g.advance_mode, end_mode: g.end_mode });
  }

  /// Handles exactly one group-frame step. `Ok(None)` means "make no
  /// externally visible progress, loop `next_token` again" (a nested
  /// group pushed, content discarded, or an end-symbol popped); `Ok(Some)`
  /// is a value to return from `next_token` as-is.
  fn step_inside_group<T: Copy, R: CharacterReader<T>>(
    &mut self,
    reader: &mut R,
    frame: GroupFrame,
  ) -> Result<Option<TokenizerEvent>, RuntimeError> {
    match frame.advance_mode {
      GroupAdvanceMode::Character => self.step_group_character_mode(reader, frame),
      GroupAdvanceMode::Token => self.step_group_token_mode(reader, frame),
    }
  }

  /// Closes the current group frame per its end mode, and reports whether
  /// the end-symbol's span was consumed (spec §4.F "On end-symbol").
  fn close_group(&mut self, frame: GroupFrame, start: usize, end: usize) {
    self.group_stack.pop();
    match frame.end_mode {
      // `open`/`closed` both read past the delimiter on exit; the
      // difference the spec draws between them (§9 Open Question,
      // resolved) isn't observable at the tokenizer-mechanics level we
      // model here, only `keep-end`'s refusal to consume is.
      GroupEndMode::Open | GroupEndMode::Closed => self.cursor = end,
      GroupEndMode::KeepEnd => self.cursor = start,
    }
  }

  fn step_group_character_mode<T: Copy, R: CharacterReader<T>>(
    &mut self,
    reader: &mut R,
    frame: GroupFrame,
  ) -> Result<Option<TokenizerEvent>, RuntimeError> {
    match self.drive_dfa(reader) {
      MatchOutcome::NeedMoreInput => Ok(Some(TokenizerEvent::NeedMoreInput)),
      MatchOutcome::EndOfInput => Err(RuntimeError::new(
        RuntimeCode::UnexpectedEndOfInputInGroup,
        span(self.cursor, self.cursor),
        "end of input reached while scanning inside a group",
      )),
      MatchOutcome::NoMatch { advance } => {
        // Character-advance mode is explicitly tolerant of content that
        // matches nothing: it is only ever looking for the end-symbol or
        // an allowed nested group-start (spec §4.F), so an unmatched
        // character is just skipped, never `UnrecognizedInput`.
        self.cursor += advance;
        Ok(None)
      }
      MatchOutcome::Accepted { symbol, end } => {
        let start = self.cursor;
        if symbol == frame.end {
          self.close_group(frame, start, end);
          Ok(None)
        } else if let Some(&nested) = self.group_by_start.get(&symbol) {
          if self.grammar.groups()[frame.group.index()].allows_nested(nested) {
            self.cursor = end;
            self.push_group(nested);
            Ok(None)
          } else {
            // Not an allowed nested group-start: ignore it like any other
            // unmatched content and advance a single character.
            self.cursor += single_char_width(reader, start);
            Ok(None)
          }
        } else {
          self.cursor += single_char_width(reader, start);
          Ok(None)
        }
      }
    }
  }

  fn step_group_token_mode<T: Copy, R: CharacterReader<T>>(
    &mut self,
    reader: &mut R,
    frame: GroupFrame,
  ) -> Result<Option<TokenizerEvent>, RuntimeError> {
    match self.drive_dfa(reader) {
      MatchOutcome::NeedMoreInput => Ok(Some(TokenizerEvent::NeedMoreInput)),
      MatchOutcome::EndOfInput => Err(RuntimeError::new(
        RuntimeCode::UnexpectedEndOfInputInGroup,
        span(self.cursor, self.cursor),
        "end of input reached while scanning inside a group",
      )),
      MatchOutcome::NoMatch { advance } => {
        let start = self.cursor;
        self.cursor += advance;
        Err(RuntimeError::new(RuntimeCode::UnrecognizedInput, span(start, self.cursor), "no terminal matches the input at this position"))
      }
      MatchOutcome::Accepted { symbol, end } => {
        let start = self.cursor;
        self.cursor = end;
        if symbol == frame.end {
          self.close_group(frame, start, end);
        } else if let Some(&nested) = self.group_by_start.get(&symbol) {
          if self.grammar.groups()[frame.group.index()].allows_nested(nested) {
            self.push_group(nested);
          }
          // else: a group-start for a group this one doesn't allow to
          // nest is just discarded content, same as any other token.
        }
        // Every other committed token inside a group (noise or not) is
        // discarded; group content is never surfaced to the parser.
        Ok(None)
      }
    }
  }

  /// One maximal-munch walk of the shared DFA from `self.cursor` (or a
  /// resumed [`ScanState`] if the previous call suspended mid-walk).
  fn drive_dfa<T: Copy, R: CharacterReader<T>>(&mut self, reader: &mut R) -> MatchOutcome {
    let dfa = self.grammar.dfa();
    let mut scan = self.pending_scan.take().unwrap_or(ScanState {
      start: self.cursor,
      cursor: self.cursor,
      dfa_state: dfa.start,
      best: None,
      first_char_units: None,
    });

    loop {
      let units = reader.slice(scan.cursor..scan.cursor + MAX_UNITS_PER_CHAR);
      let Some(decoded) = reader.decode(units) else {
        if reader.request_more() {
          continue;
        }
        if reader.len_units().is_none() {
          self.pending_scan = Some(scan);
          return MatchOutcome::NeedMoreInput;
        }
        // Known-complete reader: either true end of input or an
        // unrecoverable trailing byte sequence. Either way nothing more
        // will ever decode here, so finish with whatever's accepted.
        return finish_scan(scan);
      };

      if scan.first_char_units.is_none() {
        scan.first_char_units = Some(decoded.units);
      }

      let state = &dfa.states[scan.dfa_state];
      match find_edge(&state.edges, decoded.ch as u32) {
        Some(next) => {
          scan.cursor += decoded.units;
          scan.dfa_state = next;
          if let Some(symbol) = dfa.states[next].accept {
            scan.best = Some((scan.cursor, TerminalId::from(symbol)));
          }
        }
        None => return finish_scan(scan),
      }
    }
  }
}

fn finish_scan(scan: ScanState) -> MatchOutcome {
  match scan.best {
    Some((end, symbol)) => MatchOutcome::Accepted { symbol, end },
    None => match scan.first_char_units {
      Some(units) => MatchOutcome::NoMatch { advance: units },
      None => MatchOutcome::EndOfInput,
    },
  }
}

fn find_edge(edges: &[(waypoint_core::regex::dfa::CharRangeKey, DfaStateIndex)], cp: u32) -> Option<DfaStateIndex> {
  edges
    .binary_search_by(|(range, _)| {
      if cp < range.lo {
        std::cmp::Ordering::Greater
      } else if cp > range.hi {
        std::cmp::Ordering::Less
      } else {
        std::cmp::Ordering::Equal
      }
    })
    .ok()
    .map(|idx| edges[idx].1)
}

/// The width, in reader units, of the single character at `at`. Used when
/// a match is deliberately discarded and only one character should be
/// skipped rather than the whole matched span.
fn single_char_width<T: Copy, R: CharacterReader<T>>(reader: &R, at: usize) -> usize {
  reader.decode(reader.slice(at..at + MAX_UNITS_PER_CHAR)).map(|d| d.units).unwrap_or(1)
}

fn span(start: usize, end: usize) -> SourceSpan {
  SourceSpan { start: start as u32, end: end as u32, line: 0, column: 0 }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::reader::CharReader;
  use waypoint_core::charset::CharSet;
  use waypoint_core::grammar::{GrammarBuilder, ProductionSpec};
  use waypoint_core::regex::RegexNode;
  use waypoint_core::types::{BuildConfig, SymbolId};

  fn digit_grammar() -> Grammar {
    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let plus = builder.add_terminal("Plus", RegexNode::Literal('+'), false);
    let digits = builder.add_terminal("Digits", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
    let ws = builder.add_terminal("Ws", RegexNode::plus(RegexNode::Class(CharSet::single(' '))), true);
    let n = builder.declare_nonterminal("N");
    let e = builder.declare_nonterminal("E");
    builder.set_productions(n, vec![ProductionSpec::new(vec![SymbolId::Terminal(digits)])]);
    builder.set_productions(
      e,
      vec![
        ProductionSpec::new(vec![SymbolId::NonTerminal(e), SymbolId::Terminal(plus), SymbolId::NonTerminal(n)]),
        ProductionSpec::new(vec![SymbolId::NonTerminal(n)]),
      ],
    );
    let _ = ws;
    let (grammar, diagnostics) = builder.build(e);
    assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
    grammar
  }

  #[test]
  fn emits_tokens_and_skips_noise() {
    let grammar = digit_grammar();
    let mut tokenizer = Tokenizer::new(&grammar);
    let mut reader = CharReader::from_str("12 + 3");

    let mut symbols = Vec::new();
    loop {
      match tokenizer.next_token(&mut reader).unwrap() {
        TokenizerEvent::Token(tok) => symbols.push(tok.terminal),
        TokenizerEvent::EndOfInput => break,
        TokenizerEvent::NeedMoreInput => panic!("complete reader should never suspend"),
      }
    }
    assert_eq!(symbols.len(), 3, "expected Digits, Plus, Digits: {symbols:?}");
  }

  #[test]
  fn unrecognized_input_reports_and_advances_one_character() {
    let grammar = digit_grammar();
    let mut tokenizer = Tokenizer::new(&grammar);
    let mut reader = CharReader::from_str("#1");

    let err = tokenizer.next_token(&mut reader).unwrap_err();
    assert_eq!(err.code, RuntimeCode::UnrecognizedInput);
    assert_eq!(tokenizer.cursor(), 1);

    match tokenizer.next_token(&mut reader).unwrap() {
      TokenizerEvent::Token(tok) => assert_eq!(tok.span, span(1, 2)),
      other => panic!("expected a Digits token, got {other:?}"),
    }
  }

  #[test]
  fn suspension_resumes_a_partially_buffered_token() {
    let grammar = digit_grammar();
    let mut tokenizer = Tokenizer::new(&grammar);
    let mut reader = CharReader::streaming();
    reader.push("12".chars());

    match tokenizer.next_token(&mut reader).unwrap() {
      TokenizerEvent::NeedMoreInput => {}
      other => panic!("expected suspension on an unterminated digit run, got {other:?}"),
    }

    reader.push(" ".chars());
    reader.mark_complete();
    match tokenizer.next_token(&mut reader).unwrap() {
      TokenizerEvent::Token(tok) => assert_eq!(tok.span, span(0, 2)),
      other => panic!("expected the Digits token to resolve once more input arrived, got {other:?}"),
    }
  }
}
