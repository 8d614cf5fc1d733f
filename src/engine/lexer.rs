//! Flat Go tokenizer.
//!
//! Just enough lexing to tell identifiers apart from strings, runes and
//! comments, and to track brackets and line breaks. Every byte of the input
//! belongs to exactly one token, so spans can be spliced back together.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TokenKind {
  Ident,
  Number,
  Str,
  RawStr,
  Rune,
  LineComment,
  BlockComment,
  Newline,
  Space,
  Punct,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub start: usize,
  pub end: usize,
}

impl Token {
  pub fn text<'a>(&self, src: &'a str) -> &'a str {
    &src[self.start..self.end]
  }

  /// Spaces and comments; newlines are significant for declaration ends.
  pub fn is_trivia(&self) -> bool {
    matches!(self.kind, TokenKind::Space | TokenKind::LineComment | TokenKind::BlockComment)
  }

  pub fn is_punct(&self, src: &str, c: char) -> bool {
    self.kind == TokenKind::Punct && self.text(src).starts_with(c)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
  pub offset: usize,
  pub message: &'static str,
}

impl fmt::Display for LexError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at byte {}", self.message, self.offset)
  }
}

impl std::error::Error for LexError {}

fn is_ident_start(c: char) -> bool {
  c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
  c == '_' || c.is_alphanumeric()
}

struct Scanner<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Scanner<'a> {
  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn peek_at(&self, n: usize) -> Option<char> {
    self.src[self.pos..].chars().nth(n)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn eat_while(&mut self, f: impl Fn(char) -> bool) {
    while let Some(c) = self.peek() {
      if !f(c) {
        break;
      }
      self.pos += c.len_utf8();
    }
  }

  /// Consumes an escaped literal closed by `quote`; the opening quote is already eaten.
  fn quoted(&mut self, quote: char, start: usize, message: &'static str) -> Result<(), LexError> {
    loop {
      match self.bump() {
        Some('\\') => {
          if self.bump().is_none() {
            return Err(LexError { offset: start, message });
          }
        }
        Some('\n') | None => return Err(LexError { offset: start, message }),
        Some(c) if c == quote => return Ok(()),
        Some(_) => {}
      }
    }
  }

  fn number(&mut self) {
    let start = self.pos;
    while let Some(c) = self.peek() {
      if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
        self.pos += 1;
        continue;
      }
      if c == '+' || c == '-' {
        let lit = &self.src[start..self.pos];
        let hex = lit.starts_with("0x") || lit.starts_with("0X");
        let exp = if hex { lit.ends_with(['p', 'P']) } else { lit.ends_with(['e', 'E']) };
        if exp {
          self.pos += 1;
          continue;
        }
      }
      break;
    }
  }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
  let mut sc = Scanner { src, pos: 0 };
  let mut out = Vec::new();

  while let Some(c) = sc.peek() {
    let start = sc.pos;
    let kind = match c {
      '\n' => {
        sc.bump();
        TokenKind::Newline
      }
      ' ' | '\t' | '\r' => {
        sc.eat_while(|c| matches!(c, ' ' | '\t' | '\r'));
        TokenKind::Space
      }
      '/' if sc.peek_at(1) == Some('/') => {
        sc.eat_while(|c| c != '\n');
        TokenKind::LineComment
      }
      '/' if sc.peek_at(1) == Some('*') => {
        match src[start + 2..].find("*/") {
          Some(i) => sc.pos = start + 2 + i + 2,
          None => return Err(LexError { offset: start, message: "comment not terminated" }),
        }
        TokenKind::BlockComment
      }
      '"' => {
        sc.bump();
        sc.quoted('"', start, "string literal not terminated")?;
        TokenKind::Str
      }
      '\'' => {
        sc.bump();
        sc.quoted('\'', start, "rune literal not terminated")?;
        TokenKind::Rune
      }
      '`' => {
        match src[start + 1..].find('`') {
          Some(i) => sc.pos = start + 1 + i + 1,
          None => return Err(LexError { offset: start, message: "raw string literal not terminated" }),
        }
        TokenKind::RawStr
      }
      c if c.is_ascii_digit() => {
        sc.number();
        TokenKind::Number
      }
      '.' if sc.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => {
        sc.number();
        TokenKind::Number
      }
      c if is_ident_start(c) => {
        sc.eat_while(is_ident_continue);
        TokenKind::Ident
      }
      _ => {
        sc.bump();
        TokenKind::Punct
      }
    };
    out.push(Token { kind, start, end: sc.pos });
  }

  Ok(out)
}
