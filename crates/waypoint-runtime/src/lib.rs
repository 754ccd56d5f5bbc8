//! waypoint-runtime: the streaming tokenizer and LALR(1) parser runtime
//! (components F and G of the parser toolkit) that drive a
//! [`waypoint_core::Grammar`] artifact against character input.
//!
//! This crate never builds or serializes a grammar — it only *executes*
//! one. Everything here is single-threaded and cooperative (SPEC_FULL.md
//! §5): a parse suspends at token boundaries and resumes from exactly
//! where it left off, rather than spawning threads or doing its own I/O.

pub mod chain;
pub mod error;
pub mod parser;
pub mod reader;
pub mod tokenizer;

pub use chain::{ChainedTokenizer, TokenizerComponent};
pub use error::RuntimeError;
pub use parser::{CancellationToken, HasCursor, ParseOutcome, ParserState, SemanticProvider, SyntaxCheckProvider, TokenSource};
pub use reader::{CharReader, CharacterReader, Utf8Reader};
pub use tokenizer::{Token, Tokenizer, TokenizerEvent};
