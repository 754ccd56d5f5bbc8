//! Component C: the grammar IR (spec §4.C) — symbols, productions, operator
//! scope, groups — plus the two-phase builder and the immutable artifact
//! it produces.

pub mod artifact;
pub mod builder;
pub mod group;
pub mod operator;
pub mod production;
pub mod symbol;

pub use artifact::Grammar;
pub use builder::{GrammarBuilder, ProductionSpec};
pub use group::{Group, GroupAdvanceMode, GroupEndMode};
pub use operator::{Associativity, OperatorScope, PrecedenceGroup};
pub use production::Production;
pub use symbol::{NonTerminal, Terminal, TerminalInfo};

#[cfg(test)]
mod test {
  use super::*;
  use crate::charset::CharSet;
  use crate::regex::RegexNode;
  use crate::types::{BuildConfig, SymbolId};

  fn digit() -> RegexNode {
    RegexNode::plus(RegexNode::Class(CharSet::range('0', '9')))
  }

  /// Builds the S1 scenario grammar (`E := E '+' N | N`, `N := [0-9]+`)
  /// end to end through the public builder API and checks it comes out
  /// parseable with the expected table shape.
  #[test]
  fn builds_expression_grammar_end_to_end() {
    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let plus = builder.add_terminal_from_pattern("Plus", r"\+", false).unwrap();
    assert!(builder.add_terminal_from_pattern("Bad", "[abc", false).is_none(), "unterminated class should fail to parse");
    let digits = builder.add_terminal("Digits", digit(), false);

    let e = builder.declare_nonterminal("E");
    let n = builder.declare_nonterminal("N");

    builder.set_productions(
      n,
      vec![ProductionSpec::new(vec![SymbolId::Terminal(digits)])],
    );
    builder.set_productions(
      e,
      vec![
        ProductionSpec::new(vec![SymbolId::NonTerminal(e), SymbolId::Terminal(plus), SymbolId::NonTerminal(n)]),
        ProductionSpec::new(vec![SymbolId::NonTerminal(n)]),
      ],
    );

    let (grammar, diagnostics) = builder.build(e);
    assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
    assert_eq!(grammar.terminals().len(), 2);
    assert_eq!(grammar.nonterminals().len(), 2);
  }

  #[test]
  fn unreferenced_nonterminal_is_reported_unreachable() {
    use crate::diagnostics::BuildCode;

    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let a_tok = builder.add_terminal("A", RegexNode::Literal('a'), false);
    let b_tok = builder.add_terminal("B", RegexNode::Literal('b'), false);

    let start = builder.declare_nonterminal("Start");
    let orphan = builder.declare_nonterminal("Orphan");
    builder.set_productions(start, vec![ProductionSpec::new(vec![SymbolId::Terminal(a_tok)])]);
    builder.set_productions(orphan, vec![ProductionSpec::new(vec![SymbolId::Terminal(b_tok)])]);

    let (_grammar, diagnostics) = builder.build(start);
    assert!(diagnostics.iter().any(|d| d.code == BuildCode::UnreachableNonterminal));
  }

  #[test]
  fn duplicate_special_name_disables_table_and_not_for_parsing() {
    use crate::diagnostics::BuildCode;

    let mut builder = GrammarBuilder::new(BuildConfig::default());
    let a = builder.add_terminal("A", RegexNode::Literal('a'), false);
    let b = builder.add_terminal("B", RegexNode::Literal('b'), false);
    builder.set_special_name(a, "tok");
    builder.set_special_name(b, "tok");

    let start = builder.declare_nonterminal("Start");
    builder.set_productions(start, vec![ProductionSpec::new(vec![SymbolId::Terminal(a)])]);

    let (grammar, diagnostics) = builder.build(start);
    assert!(diagnostics.iter().any(|d| d.code == BuildCode::DuplicateSpecialName));
    assert!(!grammar.is_for_parsing());
    assert_eq!(grammar.special_name_of(a), None);
  }
}
