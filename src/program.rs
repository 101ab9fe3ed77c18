/*!
  The on-disk form of a program is comma-separated signed decimal integers,
  optionally newline-terminated. This module parses that text into a
  [`Program`], the immutable word sequence a machine copies into its memory
  at construction.
*/

use std::fs;
use std::path::Path;

use nom::{
  character::complete::{char as one_char, digit1, multispace0},
  combinator::{opt, recognize},
  multi::separated_list,
  sequence::{delimited, pair},
  IResult,
};

use crate::error::ParseError;
use crate::memory::Word;

/// An ordered sequence of words, immutable once parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
  words: Vec<Word>,
}

impl Program {
  /// Builds a program directly from words, for drivers that synthesize code.
  pub fn from_words(words: Vec<Word>) -> Program {
    Program { words }
  }

  /**
    Parses program text. The grammar is a comma-separated list of optionally
    signed decimal integers with arbitrary surrounding whitespace. Anything
    left over after the list is malformed; a list of zero integers is
    rejected so a blank file reads as a usage error rather than a program
    that faults on its first word.
  */
  pub fn parse(text: &str) -> Result<Program, ParseError> {
    let (rest, literals) = word_list(text)
      .map_err(|_| ParseError::Malformed { fragment: snippet(text) })?;
    if !rest.is_empty() {
      return Err(ParseError::Malformed { fragment: snippet(rest) });
    }
    if literals.is_empty() {
      return Err(ParseError::EmptyProgram);
    }

    let mut words = Vec::with_capacity(literals.len());
    for literal in literals {
      let word = literal
        .parse::<Word>()
        .map_err(|_| ParseError::Overflow { literal: literal.to_string() })?;
      words.push(word);
    }
    Ok(Program { words })
  }

  /// Reads and parses a program file.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Program, ParseError> {
    let text = fs::read_to_string(path)?;
    Program::parse(&text)
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }
}

/// One optionally signed decimal integer, returned as the matched text.
fn word_literal(input: &str) -> IResult<&str, &str> {
  recognize(pair(opt(one_char('-')), digit1))(input)
}

/// The full comma-separated list with surrounding whitespace consumed.
fn word_list(input: &str) -> IResult<&str, Vec<&str>> {
  delimited(
    multispace0,
    separated_list(
      delimited(multispace0, one_char(','), multispace0),
      word_literal,
    ),
    multispace0,
  )(input)
}

/// A short prefix of the offending text for diagnostics.
fn snippet(text: &str) -> String {
  text.trim_start().chars().take(24).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_flat_list() {
    let program = Program::parse("1,2,3").unwrap();
    assert_eq!(program.words(), &[1, 2, 3]);
  }

  #[test]
  fn parses_negative_words_and_whitespace() {
    let program = Program::parse("  109, -1,\n204, -1 ,99\n").unwrap();
    assert_eq!(program.words(), &[109, -1, 204, -1, 99]);
    assert_eq!(program.len(), 5);
  }

  #[test]
  fn newline_terminated_file_is_fine() {
    let program = Program::parse("1101,100,-1,4,0\n").unwrap();
    assert_eq!(program.words(), &[1101, 100, -1, 4, 0]);
  }

  #[test]
  fn rejects_a_missing_element() {
    match Program::parse("1,,2") {
      Err(ParseError::Malformed { fragment }) => assert!(fragment.starts_with(',')),
      other => panic!("expected malformed, got {:?}", other),
    }
  }

  #[test]
  fn rejects_trailing_garbage() {
    assert!(matches!(
      Program::parse("1,2,3 oops"),
      Err(ParseError::Malformed { .. })
    ));
  }

  #[test]
  fn rejects_non_numeric_text() {
    assert!(matches!(
      Program::parse("hello"),
      Err(ParseError::Malformed { .. })
    ));
  }

  #[test]
  fn rejects_a_blank_file() {
    assert!(matches!(Program::parse("  \n "), Err(ParseError::EmptyProgram)));
    assert!(matches!(Program::parse(""), Err(ParseError::EmptyProgram)));
  }

  #[test]
  fn rejects_literals_wider_than_a_word() {
    match Program::parse("1,99999999999999999999") {
      Err(ParseError::Overflow { literal }) => {
        assert_eq!(literal, "99999999999999999999");
      }
      other => panic!("expected overflow, got {:?}", other),
    }
  }
}
