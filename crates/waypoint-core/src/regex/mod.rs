//! Component B: the regex engine (spec §4.B) — AST, textual parser, and the
//! Thompson-construction → subset-construction → minimization pipeline that
//! turns a scope's lexical rules into one shared DFA.

pub mod ast;
pub mod dfa;
pub mod nfa;
pub mod parse;

pub use ast::RegexNode;
pub use dfa::{build_dfa, Dfa, DfaBuildOutcome, DfaState};
pub use nfa::{AcceptPriority, Nfa};
pub use parse::{parse_regex, RegexParseError};
