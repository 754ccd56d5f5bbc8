//! Hand-written recursive-descent parser for the textual regex-string
//! syntax (spec §4.B: "a textual regex-string syntax parsed into the same
//! AST"). Deliberately not bootstrapped through the LALR builder itself —
//! that would make `waypoint-core` depend on its own output at build time.
//!
//! Grammar (documented in SPEC_FULL.md §4.B as the concrete resolution of
//! an otherwise-unspecified detail):
//!
//! ```text
//! alt        := concat ('|' concat)*
//! concat     := repeat*
//! repeat     := atom ('*' | '+' | '?' | '{' bound '}')?
//! bound      := NUMBER (',' NUMBER?)?
//! atom       := '(' alt ')' | class | '.' | ESCAPE | LITERAL
//! class      := '[' '^'? class_item+ ']'
//! class_item := ESCAPE | LITERAL ('-' LITERAL)?
//! ```

use crate::charset::CharSet;
use crate::regex::ast::RegexNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexParseError {
  pub message: String,
  pub position: usize,
}

impl std::fmt::Display for RegexParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "regex parse error at byte {}: {}", self.position, self.message)
  }
}

impl std::error::Error for RegexParseError {}

pub fn parse_regex(source: &str) -> Result<RegexNode, RegexParseError> {
  let mut parser = Parser { chars: source.chars().collect(), pos: 0 };
  let node = parser.parse_alt()?;
  if parser.pos != parser.chars.len() {
    return Err(parser.error(format!("unexpected trailing character '{}'", parser.chars[parser.pos])));
  }
  Ok(node)
}

struct Parser {
  chars: Vec<char>,
  pos: usize,
}

impl Parser {
  fn error(&self, message: impl Into<String>) -> RegexParseError {
    RegexParseError { message: message.into(), position: self.pos }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn expect(&mut self, c: char) -> Result<(), RegexParseError> {
    if self.peek() == Some(c) {
      self.pos += 1;
      Ok(())
    } else {
      Err(self.error(format!("expected '{c}'")))
    }
  }

  fn parse_alt(&mut self) -> Result<RegexNode, RegexParseError> {
    let mut branches = vec![self.parse_concat()?];
    while self.peek() == Some('|') {
      self.bump();
      branches.push(self.parse_concat()?);
    }
    Ok(RegexNode::alt(branches))
  }

  fn parse_concat(&mut self) -> Result<RegexNode, RegexParseError> {
    let mut parts = Vec::new();
    while let Some(c) = self.peek() {
      if c == '|' || c == ')' {
        break;
      }
      parts.push(self.parse_repeat()?);
    }
    if parts.is_empty() {
      Ok(RegexNode::concat(vec![RegexNode::Concat(vec![])]))
    } else {
      Ok(RegexNode::concat(parts))
    }
  }

  fn parse_repeat(&mut self) -> Result<RegexNode, RegexParseError> {
    let atom = self.parse_atom()?;
    match self.peek() {
      Some('*') => {
        self.bump();
        Ok(RegexNode::star(atom))
      }
      Some('+') => {
        self.bump();
        Ok(RegexNode::plus(atom))
      }
      Some('?') => {
        self.bump();
        Ok(RegexNode::optional(atom))
      }
      Some('{') => {
        self.bump();
        let (min, max) = self.parse_bound()?;
        self.expect('}')?;
        Ok(RegexNode::repeat_range(atom, min, max))
      }
      _ => Ok(atom),
    }
  }

  fn parse_bound(&mut self) -> Result<(u32, Option<u32>), RegexParseError> {
    let min = self.parse_number()?;
    if self.peek() == Some(',') {
      self.bump();
      if self.peek() == Some('}') {
        Ok((min, None))
      } else {
        let max = self.parse_number()?;
        Ok((min, Some(max)))
      }
    } else {
      Ok((min, Some(min)))
    }
  }

  fn parse_number(&mut self) -> Result<u32, RegexParseError> {
    let start = self.pos;
    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
      self.bump();
    }
    if self.pos == start {
      return Err(self.error("expected a number"));
    }
    let text: String = self.chars[start..self.pos].iter().collect();
    text.parse::<u32>().map_err(|_| self.error("number out of range"))
  }

  fn parse_atom(&mut self) -> Result<RegexNode, RegexParseError> {
    match self.peek() {
      Some('(') => {
        self.bump();
        let node = self.parse_alt()?;
        self.expect(')')?;
        Ok(node)
      }
      Some('[') => self.parse_class(),
      Some('.') => {
        self.bump();
        Ok(RegexNode::Class(CharSet::universe()))
      }
      Some('\\') => {
        self.bump();
        self.parse_escape()
      }
      Some(c) => {
        self.bump();
        Ok(RegexNode::Literal(c))
      }
      None => Err(self.error("unexpected end of pattern")),
    }
  }

  fn parse_escape(&mut self) -> Result<RegexNode, RegexParseError> {
    let c = self.bump().ok_or_else(|| self.error("dangling escape"))?;
    Ok(match c {
      'd' => RegexNode::Class(digit_class()),
      'D' => RegexNode::Class(digit_class().complement(&CharSet::universe())),
      'w' => RegexNode::Class(word_class()),
      'W' => RegexNode::Class(word_class().complement(&CharSet::universe())),
      's' => RegexNode::Class(space_class()),
      'S' => RegexNode::Class(space_class().complement(&CharSet::universe())),
      'n' => RegexNode::Literal('\n'),
      't' => RegexNode::Literal('\t'),
      'r' => RegexNode::Literal('\r'),
      other => RegexNode::Literal(other),
    })
  }

  fn parse_class(&mut self) -> Result<RegexNode, RegexParseError> {
    self.expect('[')?;
    let negate = if self.peek() == Some('^') {
      self.bump();
      true
    } else {
      false
    };
    let mut set = CharSet::empty();
    let mut saw_item = false;
    while self.peek() != Some(']') {
      let lo = self.parse_class_char()?;
      saw_item = true;
      if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
        self.bump();
        let hi = self.parse_class_char()?;
        set = set.union(&CharSet::range(lo, hi));
      } else {
        set = set.union(&CharSet::single(lo));
      }
      if self.peek().is_none() {
        return Err(self.error("unterminated character class"));
      }
    }
    if !saw_item {
      return Err(self.error("empty character class"));
    }
    self.expect(']')?;
    Ok(RegexNode::Class(if negate { set.complement(&CharSet::universe()) } else { set }))
  }

  fn parse_class_char(&mut self) -> Result<char, RegexParseError> {
    match self.bump() {
      Some('\\') => self.bump().ok_or_else(|| self.error("dangling escape in class")),
      Some(c) => Ok(c),
      None => Err(self.error("unterminated character class")),
    }
  }
}

fn digit_class() -> CharSet {
  CharSet::range('0', '9')
}

fn word_class() -> CharSet {
  CharSet::range('0', '9').union(&CharSet::range('a', 'z')).union(&CharSet::range('A', 'Z')).union(&CharSet::single('_'))
}

fn space_class() -> CharSet {
  CharSet::single(' ').union(&CharSet::single('\t')).union(&CharSet::single('\n')).union(&CharSet::single('\r'))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parses_literal_concat() {
    let node = parse_regex("abc").unwrap();
    assert_eq!(node.fixed_length(), Some(3));
  }

  #[test]
  fn parses_alternation_and_repeat() {
    let node = parse_regex("a(b|c)*d+").unwrap();
    assert!(node.fixed_length().is_none());
  }

  #[test]
  fn parses_bounded_repeat() {
    let node = parse_regex("a{2,4}").unwrap();
    assert!(node.fixed_length().is_none());
    let exact = parse_regex("a{3}").unwrap();
    assert_eq!(exact.fixed_length(), Some(3));
  }

  #[test]
  fn parses_character_class_and_negation() {
    let node = parse_regex("[0-9a-f]+").unwrap();
    if let RegexNode::Repeat { inner, .. } = node {
      if let RegexNode::Class(set) = *inner {
        assert!(set.contains('7'));
        assert!(set.contains('a'));
        assert!(!set.contains('g'));
      } else {
        panic!("expected class");
      }
    } else {
      panic!("expected repeat");
    }
  }

  #[test]
  fn rejects_unterminated_class() {
    assert!(parse_regex("[abc").is_err());
  }

  #[test]
  fn rejects_unbalanced_group() {
    assert!(parse_regex("(abc").is_err());
  }

  #[test]
  fn degenerate_empty_class_matches_nothing() {
    // An explicit empty-alternation is representable via the AST
    // constructor even though the textual syntax has no way to spell it.
    let node = RegexNode::Alt(vec![]);
    assert!(node.matches_nothing());
  }
}
