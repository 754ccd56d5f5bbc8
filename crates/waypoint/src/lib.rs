//! waypoint: the public façade (component I, spec §4.I) combining a
//! [`waypoint_core::Grammar`] artifact with [`waypoint_runtime`]'s
//! tokenizer and parser runtime behind a single `Parser<T, R, V>` type.
//!
//! Grounded on the teacher's top-level crate (`hctk`/`radlr`'s own public
//! `Parser` wrapper over its DB + bytecode VM), generalized here over the
//! character-unit type `T` and reader type `R` instead of the teacher's
//! fixed byte-oriented runtime.

pub mod hot_reload;
pub mod precompiled;

use std::marker::PhantomData;
use std::sync::Arc;

use waypoint_core::Grammar;
use waypoint_runtime::{
  CancellationToken, ChainedTokenizer, ParseOutcome, ParserState, RuntimeError, SemanticProvider, Tokenizer, TokenizerComponent,
};

pub use waypoint_core as core;
pub use waypoint_runtime as runtime;

/// Type-parameterized parser object combining a shared grammar artifact, a
/// semantic provider, and an optional tokenizer customization (spec §4.I).
/// `T` is the reader's character-unit type, `R` its concrete reader type,
/// `V` the semantic value type produced by `P`.
///
/// The grammar is reference-counted rather than borrowed so a `Parser` can
/// be constructed once and cloned/shared freely (spec §3 "Grammar
/// artifacts are built once and shared by value reference, many readers,
/// no writer").
pub struct Parser<T, R, V, P> {
  grammar: Arc<Grammar>,
  provider: P,
  components: Vec<Box<dyn TokenizerComponent<T, R>>>,
  _marker: PhantomData<fn() -> V>,
}

impl<T, R, V, P> Parser<T, R, V, P>
where
  T: Copy,
  R: waypoint_runtime::CharacterReader<T>,
  P: SemanticProvider<V>,
{
  pub fn new(grammar: Arc<Grammar>, provider: P) -> Self {
    Self { grammar, provider, components: Vec::new(), _marker: PhantomData }
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  /// Replaces the tokenizer chain with a single custom component (spec
  /// §4.I `with_tokenizer`). Produces a new `Parser` rather than mutating
  /// this one — `self` is consumed and a fresh value returned, matching
  /// every other `with_*` method here.
  pub fn with_tokenizer(mut self, component: Box<dyn TokenizerComponent<T, R>>) -> Self {
    self.components = vec![component];
    self
  }

  /// Installs an ordered chain of tokenizer components (spec §4.I
  /// `with_tokenizer_chain`); each is tried in order on every token
  /// boundary before falling back to the default DFA tokenizer.
  pub fn with_tokenizer_chain(mut self, components: Vec<Box<dyn TokenizerComponent<T, R>>>) -> Self {
    self.components = components;
    self
  }

  /// Swaps the semantic provider, and with it the semantic value type
  /// (spec §4.I `with_semantic_provider`).
  pub fn with_semantic_provider<V2, P2>(self, provider: P2) -> Parser<T, R, V2, P2>
  where
    P2: SemanticProvider<V2>,
  {
    Parser { grammar: self.grammar, provider, components: self.components, _marker: PhantomData }
  }

  /// Runs one parse of `reader` to completion (spec §4.G): a fresh
  /// tokenizer and LALR state are created for every call, so a `Parser`
  /// may run unrelated parses back to back, or be shared (`Arc`-cloned
  /// grammar, `Send + Sync` provider) across threads each driving its own
  /// call (spec §5 "a grammar artifact is immutable and freely
  /// shareable").
  pub fn parse<C: CancellationToken>(&mut self, reader: &mut R, cancel: &C) -> ParseOutcome<V> {
    if self.components.is_empty() {
      let mut state = ParserState::new(&self.grammar);
      waypoint_runtime::parser::parse(&mut state, reader, &mut self.provider, cancel)
    } else {
      let chain = ChainedTokenizer::new(Tokenizer::new(&self.grammar), &mut self.components);
      let mut state = ParserState::with_token_source(&self.grammar, chain);
      waypoint_runtime::parser::parse(&mut state, reader, &mut self.provider, cancel)
    }
  }

  /// Runs one parse with no cancellation signal, for the common case
  /// (spec §4.G: cancellation is "otherwise deterministic", i.e. opt-in).
  pub fn parse_to_completion(&mut self, reader: &mut R) -> Result<V, RuntimeError> {
    match self.parse(reader, &()) {
      ParseOutcome::Accepted(value) => Ok(value),
      ParseOutcome::Error(err) => Err(err),
      ParseOutcome::NeedMoreInput => Err(RuntimeError::new(
        waypoint_core::RuntimeCode::Cancelled,
        waypoint_core::types::SourceSpan::empty(),
        "reader reported a complete input but the tokenizer still requested more (embedder bug: call parse() directly to handle suspension)",
      )),
      ParseOutcome::Cancelled => Err(RuntimeError::new(
        waypoint_core::RuntimeCode::Cancelled,
        waypoint_core::types::SourceSpan::empty(),
        "parse cancelled",
      )),
    }
  }
}

impl<T, R, V, P: Clone> Clone for Parser<T, R, V, P>
where
  P: SemanticProvider<V>,
{
  /// Clones the provider and `Arc`-shares the grammar; the tokenizer
  /// chain is intentionally dropped since `TokenizerComponent` trait
  /// objects aren't `Clone` — reinstall it with `with_tokenizer_chain` if
  /// needed on the clone.
  fn clone(&self) -> Self {
    Self { grammar: Arc::clone(&self.grammar), provider: self.provider.clone(), components: Vec::new(), _marker: PhantomData }
  }
}
