//! Chained tokenizer components (spec §4.I): "an ordered list of
//! tokenizer components where each may accept, reject, or delegate to the
//! next; the default component is the DFA tokenizer."
//!
//! Grounded on the teacher's pluggable-lexer-function convention (`hctk`'s
//! custom-scanner-function-per-symbol hook), generalized here to a linear
//! chain of trait objects terminating in the shared [`Tokenizer`] rather
//! than a per-symbol function pointer table.

use crate::error::RuntimeError;
use crate::parser::{HasCursor, TokenSource};
use crate::reader::CharacterReader;
use crate::tokenizer::{Tokenizer, TokenizerEvent};

/// A single link in a tokenizer chain. `try_next_token` may:
/// - return `Some(Ok(event))` / `Some(Err(err))` to fully decide this call
///   (accept or reject), or
/// - return `None` to delegate to the next component, and ultimately to
///   `default` if every component delegates.
///
/// `default` is passed in rather than owned so a component can choose to
/// drive the shared DFA itself (e.g. to peek at what it would produce)
/// before deciding whether to override it.
pub trait TokenizerComponent<T: Copy, R: CharacterReader<T>> {
  fn try_next_token(&mut self, default: &mut Tokenizer<'_>, reader: &mut R) -> Option<Result<TokenizerEvent, RuntimeError>>;
}

/// An ordered chain of [`TokenizerComponent`]s wrapping the default DFA
/// [`Tokenizer`] (spec §4.I). Implements [`TokenSource`] so it can be
/// dropped into a [`crate::parser::ParserState`] in place of a bare
/// `Tokenizer`. Borrows its component list rather than owning it, so an
/// embedder (e.g. `waypoint::Parser`) can keep the same components across
/// many parse calls while building a fresh `ChainedTokenizer` (and fresh
/// `Tokenizer` cursor) for each one.
pub struct ChainedTokenizer<'g, 'c, T, R> {
  default: Tokenizer<'g>,
  components: &'c mut [Box<dyn TokenizerComponent<T, R>>],
}

impl<'g, 'c, T: Copy, R: CharacterReader<T>> ChainedTokenizer<'g, 'c, T, R> {
  pub fn new(default: Tokenizer<'g>, components: &'c mut [Box<dyn TokenizerComponent<T, R>>]) -> Self {
    Self { default, components }
  }

  pub fn default_tokenizer_mut(&mut self) -> &mut Tokenizer<'g> {
    &mut self.default
  }
}

impl<'g, 'c, T: Copy, R: CharacterReader<T>> TokenSource<T, R> for ChainedTokenizer<'g, 'c, T, R> {
  fn next_token(&mut self, reader: &mut R) -> Result<TokenizerEvent, RuntimeError> {
    for component in self.components.iter_mut() {
      if let Some(result) = component.try_next_token(&mut self.default, reader) {
        return result;
      }
    }
    self.default.next_token(reader)
  }
}

impl<'g, 'c, T: Copy, R: CharacterReader<T>> HasCursor for ChainedTokenizer<'g, 'c, T, R> {
  fn cursor(&self) -> usize {
    self.default.cursor()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::parser::{parse, ParseOutcome, ParserState, SyntaxCheckProvider};
  use crate::reader::CharReader;
  use waypoint_core::charset::CharSet;
  use waypoint_core::grammar::{Grammar, GrammarBuilder, ProductionSpec};
  use waypoint_core::regex::RegexNode;
  use waypoint_core::types::{BuildConfig, SymbolId, TerminalId};

  fn digit_grammar() -> (Grammar, TerminalId) {
    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let digits = builder.add_terminal("Digits", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
    let n = builder.declare_nonterminal("N");
    builder.set_productions(n, vec![ProductionSpec::new(vec![SymbolId::Terminal(digits)])]);
    let (grammar, diagnostics) = builder.build(n);
    assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
    (grammar, digits)
  }

  /// A component that rejects every digit run starting with `'0'`,
  /// standing in for a hypothetical "no leading zero" embedder rule the
  /// shared DFA can't express as a single regex priority.
  struct RejectLeadingZero {
    digits: TerminalId,
  }

  impl TokenizerComponent<char, CharReader> for RejectLeadingZero {
    fn try_next_token(&mut self, default: &mut Tokenizer<'_>, reader: &mut CharReader) -> Option<Result<TokenizerEvent, RuntimeError>> {
      let start = default.cursor();
      match default.next_token(reader) {
        Ok(TokenizerEvent::Token(token)) if token.terminal == self.digits => {
          let first = reader.slice(start..start + 1);
          if first == ['0'] {
            Some(Err(RuntimeError::new(waypoint_core::RuntimeCode::UnrecognizedInput, token.span, "leading zero rejected by a custom tokenizer component")))
          } else {
            Some(Ok(TokenizerEvent::Token(token)))
          }
        }
        other => Some(other),
      }
    }
  }

  #[test]
  fn custom_component_can_reject_what_the_default_tokenizer_would_accept() {
    let (grammar, digits) = digit_grammar();
    let mut components: Vec<Box<dyn TokenizerComponent<char, CharReader>>> = vec![Box::new(RejectLeadingZero { digits })];
    let chain = ChainedTokenizer::new(Tokenizer::new(&grammar), &mut components);
    let mut state = ParserState::with_token_source(&grammar, chain);
    let mut reader = CharReader::from_str("07");
    let mut provider = SyntaxCheckProvider;

    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::Error(err) => assert_eq!(err.code, waypoint_core::RuntimeCode::UnrecognizedInput),
      other => panic!("expected the component to reject the leading-zero input, got {other:?}"),
    }
  }

  #[test]
  fn delegating_component_falls_through_to_the_default_tokenizer() {
    let (grammar, _digits) = digit_grammar();
    let mut components: Vec<Box<dyn TokenizerComponent<char, CharReader>>> = vec![Box::new(RejectLeadingZero { digits: _digits })];
    let chain = ChainedTokenizer::new(Tokenizer::new(&grammar), &mut components);
    let mut state = ParserState::with_token_source(&grammar, chain);
    let mut reader = CharReader::from_str("42");
    let mut provider = SyntaxCheckProvider;

    match parse(&mut state, &mut reader, &mut provider, &()) {
      ParseOutcome::Accepted(()) => {}
      other => panic!("expected acceptance for a non-zero-leading digit run, got {other:?}"),
    }
  }
}
