//! Terminal and nonterminal rows of the grammar IR (spec §3 "Symbol").

use crate::regex::RegexNode;
use crate::types::{IString, NonTerminalId, ProductionId, TerminalId};

/// A lexical terminal: its regex, whether it is *noise* (matched but never
/// surfaced as a token), and an optional stable external alias.
///
/// This is the builder's working view only — the regex is compiled away
/// into the shared DFA by the time a [`super::artifact::Grammar`] exists,
/// so the artifact stores [`TerminalInfo`] instead (spec §4.E: the binary
/// format never persists regex source, only the compiled DFA).
#[derive(Clone, Debug)]
pub struct Terminal {
  pub id: TerminalId,
  pub name: IString,
  pub regex: RegexNode,
  pub is_noise: bool,
  pub special_name: Option<IString>,
}

/// A terminal row as it appears in a built/loaded [`super::artifact::Grammar`]:
/// everything about `Terminal` except the regex, which is already baked
/// into the grammar's shared DFA.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct TerminalInfo {
  pub name: IString,
  pub is_noise: bool,
  pub special_name: Option<IString>,
}

impl From<&Terminal> for TerminalInfo {
  fn from(t: &Terminal) -> Self {
    Self { name: t.name, is_noise: t.is_noise, special_name: t.special_name }
  }
}

/// A nonterminal: a name and the (stable-indexed) productions whose head it
/// is. `productions` is empty until [`super::builder::GrammarBuilder::set_productions`]
/// fills it in — an empty `productions` after `Grammar::build` means the
/// nonterminal is unproductive (spec §4.C).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonTerminal {
  pub name: IString,
  pub productions: Vec<ProductionId>,
}

impl NonTerminal {
  pub fn new(name: IString) -> Self {
    Self { name, productions: Vec::new() }
  }
}

pub(crate) type NonTerminalTable = crate::types::Array<NonTerminal>;
pub(crate) type TerminalInfoTable = crate::types::Array<TerminalInfo>;
