//! Component G: the LALR(1) parser runtime (spec §4.G) — shift/reduce
//! loop, value stack, semantic-callback dispatch, chunked input, and
//! cancellation.
//!
//! Grounded on the teacher's bytecode VM loop (`hctk`'s
//! `ParseContext`/`step` split between shift and reduce instructions),
//! rewritten here as a plain Rust loop over [`waypoint_core`]'s LALR
//! table instead of interpreting bytecode: this crate never generates
//! native code for the table (spec §1 Non-goals).

use waypoint_core::grammar::Grammar;
use waypoint_core::lalr::table::Action;
use waypoint_core::types::{LrStateId, SourceSpan, SymbolId};
use waypoint_core::RuntimeCode;

use crate::error::RuntimeError;
use crate::reader::CharacterReader;
use crate::tokenizer::{Tokenizer, TokenizerEvent};

/// Embedder-supplied pair of semantic callbacks (spec §4.G "Semantic
/// provider"). `V` is the embedder's value type; a syntax-checking
/// provider is `SemanticProvider<()>` returning `()` from both hooks.
pub trait SemanticProvider<V> {
  /// Invoked inside the tokenizer for each surfaced terminal. `chars` is
  /// the matched source slice, borrowed for the duration of this call
  /// only (spec §5 "token character slices ... must not outlive the
  /// current tokenizer call").
  fn transform(&mut self, terminal: waypoint_core::types::TerminalId, chars: &[char]) -> V;

  /// Invoked on each reduction. `values` is the scratch span holding the
  /// popped right-hand-side values in order; the provider may overwrite
  /// it freely but must return the fused value rather than relying on
  /// the final contents of the slice (spec §5 "reductions receive a
  /// scratch span they may overwrite").
  fn fuse(&mut self, production: waypoint_core::types::ProductionId, values: &mut [V]) -> V;
}

/// A no-op provider for pure syntax checking (spec §4.G "A
/// syntax-checking provider returns `null`/unit from both").
pub struct SyntaxCheckProvider;

impl SemanticProvider<()> for SyntaxCheckProvider {
  fn transform(&mut self, _terminal: waypoint_core::types::TerminalId, _chars: &[char]) {}
  fn fuse(&mut self, _production: waypoint_core::types::ProductionId, _values: &mut [()]) {}
}

/// Polled at every token boundary (spec §4.G "Cancellation & budget",
/// §5). `true` means "stop now".
pub trait CancellationToken {
  fn is_cancelled(&self) -> bool;
}

impl CancellationToken for () {
  fn is_cancelled(&self) -> bool {
    false
  }
}

impl<F: Fn() -> bool> CancellationToken for F {
  fn is_cancelled(&self) -> bool {
    self()
  }
}

/// Outcome of a completed parse call (spec §8 invariant 1: "exactly one
/// semantic value or exactly one runtime error").
#[derive(Debug)]
pub enum ParseOutcome<V> {
  Accepted(V),
  Error(RuntimeError),
  /// The reader has not reached end-of-input and the tokenizer asked for
  /// more before the parse could finish (spec §4.F "Partial input").
  NeedMoreInput,
  Cancelled,
}

/// A pluggable source of [`TokenizerEvent`]s (spec §4.I "chained
/// tokenizer"). The default source is the DFA-driven [`Tokenizer`] itself;
/// [`crate::chain::ChainedTokenizer`] wraps one to let custom components
/// intercept before falling back to it.
pub trait TokenSource<T: Copy, R: CharacterReader<T>> {
  fn next_token(&mut self, reader: &mut R) -> Result<TokenizerEvent, RuntimeError>;
}

impl<'g, T: Copy, R: CharacterReader<T>> TokenSource<T, R> for Tokenizer<'g> {
  fn next_token(&mut self, reader: &mut R) -> Result<TokenizerEvent, RuntimeError> {
    Tokenizer::next_token(self, reader)
  }
}

/// The current input offset of a token source, split out from
/// [`TokenSource`] (which is generic over the reader unit/type) so
/// [`ParserState::offset`] doesn't need them to call it.
pub trait HasCursor {
  fn cursor(&self) -> usize;
}

impl<'g> HasCursor for Tokenizer<'g> {
  fn cursor(&self) -> usize {
    Tokenizer::cursor(self)
  }
}

/// A runtime parse-state value (spec §3 "Parser state"): current LALR
/// state stack, parallel value stack, the token source driving it (the
/// default DFA tokenizer, or a chained/custom one, spec §4.I), and a
/// user scratch dictionary. Owned exclusively by one parse at a time
/// (spec §5); a [`Tokenizer`] source may be suspended via
/// [`ParserState::token_source_mut`] and resumed, never accessed
/// concurrently.
pub struct ParserState<'g, V, S = Tokenizer<'g>> {
  grammar: &'g Grammar,
  token_source: S,
  state_stack: Vec<LrStateId>,
  value_stack: Vec<V>,
  /// Free-form storage an embedder's semantic provider or custom
  /// tokenizer component may use across calls (spec §3 "a user-attached
  /// scratch dictionary").
  pub scratch: std::collections::HashMap<String, String>,
  lookahead: Option<(SymbolId, Vec<char>, SourceSpan)>,
}

impl<'g, V> ParserState<'g, V, Tokenizer<'g>> {
  pub fn new(grammar: &'g Grammar) -> Self {
    Self::with_token_source(grammar, Tokenizer::new(grammar))
  }
}

impl<'g, V, S> ParserState<'g, V, S> {
  pub fn with_token_source(grammar: &'g Grammar, token_source: S) -> Self {
    Self {
      grammar,
      token_source,
      state_stack: vec![grammar.lr_table().start],
      value_stack: Vec::new(),
      scratch: std::collections::HashMap::new(),
      lookahead: None,
    }
  }

  pub fn token_source_mut(&mut self) -> &mut S {
    &mut self.token_source
  }

  fn top_state(&self) -> LrStateId {
    *self.state_stack.last().expect("state stack is never empty: the initial state is pushed at construction and the accept action ends the parse before it could be popped")
  }
}

impl<'g, V, S: HasCursor> ParserState<'g, V, S> {
  pub fn offset(&self) -> usize {
    self.token_source.cursor()
  }
}

/// Drives a [`ParserState`] to completion (or suspension) against `reader`,
/// invoking `provider`'s hooks and checking `cancel` at every token
/// boundary (spec §4.G, §5).
pub fn parse<'g, T, R, V, P, C, S>(
  state: &mut ParserState<'g, V, S>,
  reader: &mut R,
  provider: &mut P,
  cancel: &C,
) -> ParseOutcome<V>
where
  T: Copy,
  R: CharacterReader<T>,
  P: SemanticProvider<V>,
  C: CancellationToken,
  S: TokenSource<T, R> + HasCursor,
{
  if !state.grammar.is_for_parsing() {
    return ParseOutcome::Error(RuntimeError::new(
      RuntimeCode::GrammarNotForParsing,
      SourceSpan::empty(),
      "grammar was built with blocking errors and is not usable for parsing",
    ));
  }

  loop {
    if cancel.is_cancelled() {
      return ParseOutcome::Cancelled;
    }

    let (symbol, chars, span) = match next_lookahead(state, reader) {
      Ok(Some(entry)) => entry,
      Ok(None) => return ParseOutcome::NeedMoreInput,
      Err(err) => return ParseOutcome::Error(err),
    };

    let action = state.grammar.lr_table().states[state.top_state().index()].actions.get(&symbol).copied();
    match action {
      Some(Action::Shift(next)) => {
        state.lookahead = None;
        let value = provider.transform(symbol.as_terminal().expect("shift actions are only ever keyed by terminal/EOF symbols"), &chars);
        state.state_stack.push(next);
        state.value_stack.push(value);
      }
      Some(Action::Reduce(production_id)) => {
        let production = &state.grammar.productions()[production_id.index()];
        let arity = production.len();
        let head = production.head;
        let new_len = state.value_stack.len() - arity;
        let fused = {
          let scratch = &mut state.value_stack[new_len..];
          provider.fuse(production_id, scratch)
        };
        state.value_stack.truncate(new_len);
        state.state_stack.truncate(state.state_stack.len() - arity);
        let goto = state
          .grammar
          .lr_table()
          .states[state.top_state().index()]
          .goto
          .get(&head)
          .copied()
          .expect("a reduce action's goto target is always populated by the builder for a for-parsing grammar");
        state.state_stack.push(goto);
        state.value_stack.push(fused);
      }
      Some(Action::Accept) => {
        return ParseOutcome::Accepted(state.value_stack.pop().expect("accept is only reachable after the start symbol's single value was pushed"));
      }
      None => {
        let expected = state.grammar.lr_table().expected_terminals(state.top_state());
        return ParseOutcome::Error(RuntimeError::unexpected_token(span, symbol, expected));
      }
    }
  }
}

/// Pulls (and caches) the next lookahead symbol's terminal/chars/span.
/// `transform` is deliberately *not* called here: a lookahead may be
/// peeked across several reduces before the parser finally shifts it, and
/// `transform` must run exactly once per token, at shift time (spec §5),
/// so the character slice is decoded and cached here but only handed to
/// the semantic provider in the `Action::Shift` arm above. Returns
/// `Ok(None)` on suspension.
fn next_lookahead<'g, T, R, V, S>(
  state: &mut ParserState<'g, V, S>,
  reader: &mut R,
) -> Result<Option<(SymbolId, Vec<char>, SourceSpan)>, RuntimeError>
where
  T: Copy,
  R: CharacterReader<T>,
  S: TokenSource<T, R> + HasCursor,
{
  if let Some(entry) = state.lookahead.clone() {
    return Ok(Some(entry));
  }
  match state.token_source.next_token(reader)? {
    TokenizerEvent::Token(token) => {
      let chars = decode_span(reader, token.span);
      let entry = (SymbolId::Terminal(token.terminal), chars, token.span);
      state.lookahead = Some(entry.clone());
      Ok(Some(entry))
    }
    TokenizerEvent::EndOfInput => {
      let cursor = state.token_source.cursor() as u32;
      let span = SourceSpan { start: cursor, end: cursor, line: 0, column: 0 };
      let entry = (SymbolId::EndOfInput, Vec::new(), span);
      state.lookahead = Some(entry.clone());
      Ok(Some(entry))
    }
    TokenizerEvent::NeedMoreInput => Ok(None),
  }
}

fn decode_span<T: Copy, R: CharacterReader<T>>(reader: &R, span: SourceSpan) -> Vec<char> {
  let mut chars = Vec::new();
  let mut cursor = span.start as usize;
  let end = span.end as usize;
  while cursor < end {
    let units = reader.slice(cursor..cursor + crate::reader::MAX_UNITS_PER_CHAR);
    match reader.decode(units) {
      Some(decoded) => {
        chars.push(decoded.ch);
        cursor += decoded.units;
      }
      None => break,
    }
  }
  chars
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::reader::CharReader;
  use waypoint_core::charset::CharSet;
  use waypoint_core::grammar::{GrammarBuilder, ProductionSpec};
  use waypoint_core::regex::RegexNode;
  use waypoint_core::types::{BuildConfig, ProductionId, SymbolId as SymId, TerminalId};

  /// Builds the spec's S1 scenario: `E := E '+' N | N`, `N := [0-9]+`,
  /// fuses digit runs to `i64` and sums on `+`.
  fn sum_grammar() -> (Grammar, TerminalId, TerminalId, ProductionId, ProductionId, ProductionId) {
    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let plus = builder.add_terminal("Plus", RegexNode::Literal('+'), false);
    let digits = builder.add_terminal("Digits", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
    let n = builder.declare_nonterminal("N");
    let e = builder.declare_nonterminal("E");
    builder.set_productions(n, vec![ProductionSpec::new(vec![SymId::Terminal(digits)])]);
    builder.set_productions(
      e,
      vec![
        ProductionSpec::new(vec![SymId::NonTerminal(e), SymId::Terminal(plus), SymId::NonTerminal(n)]),
        ProductionSpec::new(vec![SymId::NonTerminal(n)]),
      ],
    );
    let (grammar, diagnostics) = builder.build(e);
    assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
    let n_prod = grammar.nonterminals()[n.index()].productions[0];
    let e_prods = grammar.nonterminals()[e.index()].productions.clone();
    (grammar, plus, digits, n_prod, e_prods[0], e_prods[1])
  }

  struct SumProvider {
    digits: TerminalId,
    e_plus_n: ProductionId,
  }

  impl SemanticProvider<i64> for SumProvider {
    fn transform(&mut self, terminal: TerminalId, chars: &[char]) -> i64 {
      if terminal == self.digits {
        chars.iter().collect::<String>().parse().unwrap()
      } else {
        0
      }
    }

    fn fuse(&mut self, production: ProductionId, values: &mut [i64]) -> i64 {
      if production == self.e_plus_n {
        values[0] + values[2]
      } else {
        values[0]
      }
    }
  }

  #[test]
  fn sums_left_associative_additions() {
    let (grammar, _plus, digits, _n_prod, e_plus_n, _e_n) = sum_grammar();
    let mut state = ParserState::new(&grammar);
    let mut reader = CharReader::from_str("1+2+3");
    let mut provider = SumProvider { digits, e_plus_n };

    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::Accepted(value) => assert_eq!(value, 6),
      other => panic!("expected Accepted(6), got {other:?}"),
    }
  }

  #[test]
  fn unexpected_token_reports_the_expected_set() {
    let (grammar, _plus, digits, _n_prod, e_plus_n, _e_n) = sum_grammar();
    let mut state = ParserState::new(&grammar);
    let mut reader = CharReader::from_str("1++2");
    let mut provider = SumProvider { digits, e_plus_n };

    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::Error(err) => {
        assert_eq!(err.code, RuntimeCode::UnexpectedToken);
        assert_eq!(err.location.start, 2);
      }
      other => panic!("expected an UnexpectedToken error, got {other:?}"),
    }
  }

  #[test]
  fn cancellation_is_observed_at_a_token_boundary() {
    let (grammar, _plus, digits, _n_prod, e_plus_n, _e_n) = sum_grammar();
    let mut state = ParserState::new(&grammar);
    let mut reader = CharReader::from_str("1+2");
    let mut provider = SumProvider { digits, e_plus_n };
    let cancelled = || true;

    match parse(&mut state, &mut reader, &mut provider, &cancelled) {
      ParseOutcome::Cancelled => {}
      other => panic!("expected Cancelled, got {other:?}"),
    }
  }

  #[test]
  fn suspends_and_resumes_on_chunked_input() {
    let (grammar, _plus, digits, _n_prod, e_plus_n, _e_n) = sum_grammar();
    let mut state = ParserState::new(&grammar);
    let mut reader = CharReader::streaming();
    reader.push("1+2".chars());
    let mut provider = SumProvider { digits, e_plus_n };

    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::NeedMoreInput => {}
      other => panic!("expected NeedMoreInput on an unterminated stream, got {other:?}"),
    }

    reader.mark_complete();
    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::Accepted(value) => assert_eq!(value, 3),
      other => panic!("expected Accepted(3) after resuming, got {other:?}"),
    }
  }
}
