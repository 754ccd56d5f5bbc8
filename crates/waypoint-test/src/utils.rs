//! Shared grammar builders for the scenario and property suites (spec §8).
//! Grounded on the teacher's own `radlr-test` crate layout: a plain,
//! ungated `utils` module that the `#[cfg(test)]` suites pull grammar
//! fixtures from, rather than rebuilding a grammar inline in every test.

use waypoint_core::charset::CharSet;
use waypoint_core::grammar::{Grammar, GrammarBuilder, GroupAdvanceMode, GroupEndMode, ProductionSpec};
use waypoint_core::regex::RegexNode;
use waypoint_core::types::{BuildConfig, NonTerminalId, ProductionId, SymbolId, TerminalId};

/// S1 / S3: `E := E '+' N | N`, `N := [0-9]+`.
pub struct SumGrammar {
  pub grammar: Grammar,
  pub plus: TerminalId,
  pub digits: TerminalId,
  pub n_from_digits: ProductionId,
  pub e_from_n: ProductionId,
  pub e_plus_n: ProductionId,
}

pub fn sum_grammar() -> SumGrammar {
  let mut builder = GrammarBuilder::new(BuildConfig::default());
  let plus = builder.add_terminal("Plus", RegexNode::Literal('+'), false);
  let digits = builder.add_terminal("Digits", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
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
  let (grammar, diagnostics) = builder.build(e);
  assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
  let n_from_digits = grammar.nonterminals()[n.index()].productions[0];
  let e_productions = grammar.nonterminals()[e.index()].productions.clone();
  SumGrammar { grammar, plus, digits, n_from_digits, e_from_n: e_productions[1], e_plus_n: e_productions[0] }
}

/// S2: a JSON subset, `object := '{' (pair (',' pair)*)? '}'`,
/// `array := '[' (value (',' value)*)? ']'`, `value := object | array |
/// string | number`.
pub struct JsonGrammar {
  pub grammar: Grammar,
  pub string: TerminalId,
  pub number: TerminalId,
  pub value_from_object: ProductionId,
  pub value_from_array: ProductionId,
  pub value_from_string: ProductionId,
  pub value_from_number: ProductionId,
  pub object_empty: ProductionId,
  pub object_with_pairs: ProductionId,
  pub pairs_single: ProductionId,
  pub pairs_append: ProductionId,
  pub pair: ProductionId,
  pub array_empty: ProductionId,
  pub array_with_values: ProductionId,
  pub values_single: ProductionId,
  pub values_append: ProductionId,
}

pub fn json_grammar() -> JsonGrammar {
  let mut builder = GrammarBuilder::new(BuildConfig::default());
  let lbrace = builder.add_terminal("LBrace", RegexNode::Literal('{'), false);
  let rbrace = builder.add_terminal("RBrace", RegexNode::Literal('}'), false);
  let lbracket = builder.add_terminal("LBracket", RegexNode::Literal('['), false);
  let rbracket = builder.add_terminal("RBracket", RegexNode::Literal(']'), false);
  let colon = builder.add_terminal("Colon", RegexNode::Literal(':'), false);
  let comma = builder.add_terminal("Comma", RegexNode::Literal(','), false);
  let not_quote = CharSet::universe().difference(&CharSet::single('"'));
  let string = builder.add_terminal(
    "String",
    RegexNode::concat(vec![RegexNode::Literal('"'), RegexNode::star(RegexNode::Class(not_quote)), RegexNode::Literal('"')]),
    false,
  );
  let number = builder.add_terminal("Number", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
  let _ws = builder.add_terminal("Ws", RegexNode::plus(RegexNode::Class(CharSet::single(' '))), true);

  let value = builder.declare_nonterminal("Value");
  let object = builder.declare_nonterminal("Object");
  let array = builder.declare_nonterminal("Array");
  let pairs = builder.declare_nonterminal("Pairs");
  let pair = builder.declare_nonterminal("Pair");
  let values = builder.declare_nonterminal("Values");

  builder.set_productions(
    value,
    vec![
      ProductionSpec::new(vec![SymbolId::NonTerminal(object)]),
      ProductionSpec::new(vec![SymbolId::NonTerminal(array)]),
      ProductionSpec::new(vec![SymbolId::Terminal(string)]),
      ProductionSpec::new(vec![SymbolId::Terminal(number)]),
    ],
  );
  builder.set_productions(
    object,
    vec![
      ProductionSpec::new(vec![SymbolId::Terminal(lbrace), SymbolId::Terminal(rbrace)]),
      ProductionSpec::new(vec![SymbolId::Terminal(lbrace), SymbolId::NonTerminal(pairs), SymbolId::Terminal(rbrace)]),
    ],
  );
  builder.set_productions(
    pairs,
    vec![
      ProductionSpec::new(vec![SymbolId::NonTerminal(pair)]),
      ProductionSpec::new(vec![SymbolId::NonTerminal(pairs), SymbolId::Terminal(comma), SymbolId::NonTerminal(pair)]),
    ],
  );
  builder.set_productions(pair, vec![ProductionSpec::new(vec![SymbolId::Terminal(string), SymbolId::Terminal(colon), SymbolId::NonTerminal(value)])]);
  builder.set_productions(
    array,
    vec![
      ProductionSpec::new(vec![SymbolId::Terminal(lbracket), SymbolId::Terminal(rbracket)]),
      ProductionSpec::new(vec![SymbolId::Terminal(lbracket), SymbolId::NonTerminal(values), SymbolId::Terminal(rbracket)]),
    ],
  );
  builder.set_productions(
    values,
    vec![
      ProductionSpec::new(vec![SymbolId::NonTerminal(value)]),
      ProductionSpec::new(vec![SymbolId::NonTerminal(values), SymbolId::Terminal(comma), SymbolId::NonTerminal(value)]),
    ],
  );

  let (grammar, diagnostics) = builder.build(value);
  assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
  let value_prods = grammar.nonterminals()[value.index()].productions.clone();
  let object_prods = grammar.nonterminals()[object.index()].productions.clone();
  let pairs_prods = grammar.nonterminals()[pairs.index()].productions.clone();
  let pair_prods = grammar.nonterminals()[pair.index()].productions.clone();
  let array_prods = grammar.nonterminals()[array.index()].productions.clone();
  let values_prods = grammar.nonterminals()[values.index()].productions.clone();

  JsonGrammar {
    grammar,
    string,
    number,
    value_from_object: value_prods[0],
    value_from_array: value_prods[1],
    value_from_string: value_prods[2],
    value_from_number: value_prods[3],
    object_empty: object_prods[0],
    object_with_pairs: object_prods[1],
    pairs_single: pairs_prods[0],
    pairs_append: pairs_prods[1],
    pair: pair_prods[0],
    array_empty: array_prods[0],
    array_with_values: array_prods[1],
    values_single: values_prods[0],
    values_append: values_prods[1],
  }
}

/// S4: `ab*` and `a+` over `aaa`, exercising the fixed-length-over-
/// variable-length tie-break (spec §4.B point (c)).
pub struct AmbiguousGrammar {
  pub grammar: Grammar,
  pub ab_star: TerminalId,
  pub a_plus: TerminalId,
}

/// Builds the `ab*` / `a+` tokenizer-only scope used by S4 and the
/// ambiguity-stability property; `extra` is appended as additional
/// terminals so the property test can add a longer-matching terminal
/// without duplicating the whole grammar.
pub fn ambiguous_grammar(extra: &[(&str, RegexNode)]) -> AmbiguousGrammar {
  let mut builder = GrammarBuilder::new(BuildConfig::default());
  let ab_star = builder.add_terminal("AbStar", RegexNode::concat(vec![RegexNode::Literal('a'), RegexNode::star(RegexNode::Literal('b'))]), false);
  let a_plus = builder.add_terminal("APlus", RegexNode::plus(RegexNode::Literal('a')), false);
  for (name, regex) in extra {
    builder.add_terminal(name, regex.clone(), false);
  }
  let start = builder.declare_nonterminal("Start");
  builder.set_productions(
    start,
    vec![
      ProductionSpec::new(vec![SymbolId::Terminal(ab_star)]),
      ProductionSpec::new(vec![SymbolId::Terminal(a_plus)]),
    ],
  );
  let (grammar, diagnostics) = builder.build(start);
  assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
  AmbiguousGrammar { grammar, ab_star, a_plus }
}

/// S5: the S1 sum grammar plus a `/* ... */` character-advance, closed
/// comment group.
pub struct CommentGrammar {
  pub grammar: Grammar,
  pub plus: TerminalId,
  pub digits: TerminalId,
  pub e_plus_n: ProductionId,
}

pub fn comment_grammar() -> CommentGrammar {
  let mut builder = GrammarBuilder::new(BuildConfig::default());
  let plus = builder.add_terminal("Plus", RegexNode::Literal('+'), false);
  let digits = builder.add_terminal("Digits", RegexNode::plus(RegexNode::Class(CharSet::range('0', '9'))), false);
  let comment_start = builder.add_terminal("CommentStart", RegexNode::concat(vec![RegexNode::Literal('/'), RegexNode::Literal('*')]), true);
  let comment_end = builder.add_terminal("CommentEnd", RegexNode::concat(vec![RegexNode::Literal('*'), RegexNode::Literal('/')]), true);
  let _ws = builder.add_terminal("Ws", RegexNode::plus(RegexNode::Class(CharSet::single(' '))), true);
  builder.declare_group(comment_start, comment_end, GroupAdvanceMode::Character, GroupEndMode::Closed);

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
  let (grammar, diagnostics) = builder.build(e);
  assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
  let e_plus_n = grammar.nonterminals()[e.index()].productions[0];
  CommentGrammar { grammar, plus, digits, e_plus_n }
}

/// S6: the classic dangling-`else` grammar, `Stmt := Id | If Id Then Stmt
/// | If Id Then Stmt Else Stmt`, which forces a shift/reduce conflict
/// resolved in favor of shift (spec §4.D "shift-default").
pub struct IfElseGrammar {
  pub grammar: Grammar,
  pub id: TerminalId,
  pub stmt_from_id: ProductionId,
  pub if_then: ProductionId,
  pub if_then_else: ProductionId,
  pub stmt: NonTerminalId,
}

pub fn if_else_grammar() -> IfElseGrammar {
  let mut builder = GrammarBuilder::new(BuildConfig::default());
  let if_tok = builder.add_terminal("If", RegexNode::concat("if".chars().map(RegexNode::Literal).collect()), false);
  let then_tok = builder.add_terminal("Then", RegexNode::concat("then".chars().map(RegexNode::Literal).collect()), false);
  let else_tok = builder.add_terminal("Else", RegexNode::concat("else".chars().map(RegexNode::Literal).collect()), false);
  let id = builder.add_terminal("Id", RegexNode::plus(RegexNode::Class(CharSet::range('a', 'z'))), false);
  let _ws = builder.add_terminal("Ws", RegexNode::plus(RegexNode::Class(CharSet::single(' '))), true);

  let stmt = builder.declare_nonterminal("Stmt");
  builder.set_productions(
    stmt,
    vec![
      ProductionSpec::new(vec![SymbolId::Terminal(id)]),
      ProductionSpec::new(vec![SymbolId::Terminal(if_tok), SymbolId::Terminal(id), SymbolId::Terminal(then_tok), SymbolId::NonTerminal(stmt)]),
      ProductionSpec::new(vec![
        SymbolId::Terminal(if_tok),
        SymbolId::Terminal(id),
        SymbolId::Terminal(then_tok),
        SymbolId::NonTerminal(stmt),
        SymbolId::Terminal(else_tok),
        SymbolId::NonTerminal(stmt),
      ]),
    ],
  );
  let (grammar, diagnostics) = builder.build(stmt);
  assert!(grammar.is_for_parsing(), "diagnostics: {diagnostics:?}");
  let prods = grammar.nonterminals()[stmt.index()].productions.clone();
  assert!(diagnostics.iter().any(|d| d.code == waypoint_core::BuildCode::ShiftReduceResolved), "expected a recorded shift/reduce resolution, got {diagnostics:?}");
  IfElseGrammar { grammar, id, stmt_from_id: prods[0], if_then: prods[1], if_then_else: prods[2], stmt }
}
