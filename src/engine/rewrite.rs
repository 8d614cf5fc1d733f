// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Apply a RuleTable to one Go source file at token level (renames, declaration and line removal)
// role: engine/rewrite
// inputs: source text, RuleTable, optional package name override
// outputs: Rewritten { package, imports, code, body }
// invariants:
// - strings, runes and comments are never edited
// - enclosing removals win over renames inside them
// - body is code minus leading comments, package clause and import declarations
// errors: SyntaxError with byte offset (lexing, missing package clause, unbalanced brackets)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;

use super::lexer::{tokenize, LexError, Token, TokenKind};
use crate::rules::{Namespace, Replacement, RuleTable};

const PREDECLARED_TYPES: &[&str] = &[
  "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
  "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
  pub offset: usize,
  pub message: String,
}

impl fmt::Display for SyntaxError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at byte {}", self.message, self.offset)
  }
}

impl std::error::Error for SyntaxError {}

impl From<LexError> for SyntaxError {
  fn from(e: LexError) -> Self {
    SyntaxError { offset: e.offset, message: e.message.to_string() }
  }
}

/// One import spec; `path` keeps its quotes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Import {
  pub path: String,
  pub alias: Option<String>,
}

impl fmt::Display for Import {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.alias {
      Some(alias) => write!(f, "{} {}", alias, self.path),
      None => f.write_str(&self.path),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Rewritten {
  pub package: String,
  pub imports: Vec<Import>,
  pub code: String,
  pub body: String,
}

#[derive(Debug, Clone)]
struct Edit {
  start: usize,
  end: usize,
  replacement: String,
}

struct Header {
  package: String,
  imports: Vec<Import>,
  end: usize,
  next: usize,
}

struct Frame {
  open: char,
  close: char,
  offset: usize,
  is_struct: bool,
}

pub fn is_ident(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
    _ => false,
  }
}

fn line_start(src: &str, offset: usize) -> usize {
  src[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Start of the line holding `offset`, pulled up over directly preceding `//` lines.
fn decl_start(src: &str, offset: usize) -> usize {
  let mut start = line_start(src, offset);
  while start > 0 {
    let prev = line_start(src, start - 1);
    if !src[prev..start - 1].trim_start().starts_with("//") {
      break;
    }
    start = prev;
  }
  start
}

fn apply(src: &str, edits: &[Edit]) -> String {
  let mut sorted: Vec<&Edit> = edits.iter().collect();
  sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

  let mut out = String::with_capacity(src.len());
  let mut cursor = 0;
  for e in sorted {
    if e.start < cursor {
      continue;
    }
    out.push_str(&src[cursor..e.start]);
    out.push_str(&e.replacement);
    cursor = e.end;
  }
  out.push_str(&src[cursor..]);

  if src.ends_with('\n') && !edits.is_empty() {
    out.truncate(out.trim_end_matches('\n').len());
    out.push('\n');
  }
  out
}

struct Rewriter<'a> {
  src: &'a str,
  toks: Vec<Token>,
  rules: &'a RuleTable,
  edits: Vec<Edit>,
}

impl<'a> Rewriter<'a> {
  fn text(&self, i: usize) -> &'a str {
    self.toks[i].text(self.src)
  }

  fn kind(&self, i: usize) -> Option<TokenKind> {
    self.toks.get(i).map(|t| t.kind)
  }

  fn is_punct(&self, i: usize, c: char) -> bool {
    self.toks.get(i).is_some_and(|t| t.is_punct(self.src, c))
  }

  fn is_keyword(&self, i: usize, kw: &str) -> bool {
    self.kind(i) == Some(TokenKind::Ident) && self.text(i) == kw
  }

  fn skip_trivia(&self, mut i: usize) -> usize {
    while i < self.toks.len() && self.toks[i].is_trivia() {
      i += 1;
    }
    i
  }

  /// Skips trivia, newlines and `;`.
  fn skip_blank(&self, mut i: usize) -> usize {
    while i < self.toks.len()
      && (self.toks[i].is_trivia() || self.toks[i].kind == TokenKind::Newline || self.is_punct(i, ';'))
    {
      i += 1;
    }
    i
  }

  fn replace(&mut self, start: usize, end: usize, to: &str) {
    self.edits.push(Edit { start, end, replacement: to.to_string() });
  }

  fn delete(&mut self, start: usize, end: usize) {
    self.replace(start, end, "");
  }

  /// Removes a whole declaration; a blank line on both sides collapses to one.
  fn delete_decl(&mut self, start: usize, mut end: usize) {
    let blank_before = start == 0 || self.src[..start].ends_with("\n\n");
    if blank_before && self.src[end..].starts_with('\n') {
      end += 1;
    }
    self.delete(start, end);
  }

  /// Walks from `from` to the newline that ends the declaration or statement,
  /// or to a closing bracket it does not own. Returns that token's index and
  /// the byte offset where removal should stop.
  fn decl_end(&self, from: usize) -> (usize, usize) {
    let mut depth = 0i32;
    for k in from..self.toks.len() {
      let t = self.toks[k];
      match t.kind {
        TokenKind::Newline if depth == 0 => return (k, t.end),
        TokenKind::Punct => match self.text(k) {
          "(" | "[" | "{" => depth += 1,
          ")" | "]" | "}" => {
            if depth == 0 {
              return (k, t.start);
            }
            depth -= 1;
          }
          _ => {}
        },
        _ => {}
      }
    }
    (self.toks.len(), self.src.len())
  }

  fn matching(&self, open: usize) -> usize {
    let mut depth = 0i32;
    for k in open..self.toks.len() {
      if self.toks[k].kind != TokenKind::Punct {
        continue;
      }
      match self.text(k) {
        "(" | "[" | "{" => depth += 1,
        ")" | "]" | "}" => {
          depth -= 1;
          if depth == 0 {
            return k;
          }
        }
        _ => {}
      }
    }
    self.toks.len()
  }

  fn statement_span(&self, k: usize) -> (usize, usize) {
    let mut first = k;
    while first > 0 && self.toks[first - 1].kind != TokenKind::Newline {
      first -= 1;
    }
    let (_, end) = self.decl_end(first);
    (line_start(self.src, self.toks[k].start), end)
  }

  fn drops_type(&self, name: &str) -> bool {
    match self.rules.get(Namespace::Type, name) {
      Some(Replacement::Delete) => true,
      Some(Replacement::Rename(to)) => !is_ident(to) || PREDECLARED_TYPES.contains(&to.as_str()),
      None => false,
    }
  }

  fn header(&mut self, name: Option<&str>) -> Result<Header, SyntaxError> {
    let i = self.skip_blank(0);
    if !self.is_keyword(i, "package") {
      let offset = self.toks.get(i).map_or(self.src.len(), |t| t.start);
      return Err(SyntaxError { offset, message: "expected `package` clause".into() });
    }

    let n = self.skip_trivia(i + 1);
    if self.kind(n) != Some(TokenKind::Ident) {
      let offset = self.toks.get(n).map_or(self.src.len(), |t| t.start);
      return Err(SyntaxError { offset, message: "expected package name".into() });
    }

    let mut package = self.text(n).to_string();
    if let Some(name) = name.filter(|s| !s.is_empty()) {
      let t = self.toks[n];
      self.replace(t.start, t.end, name);
      package = name.to_string();
    }

    let mut end = self.toks[n].end;
    let mut next = n + 1;
    let mut imports = Vec::new();

    loop {
      let j = self.skip_blank(next);
      if !self.is_keyword(j, "import") {
        break;
      }

      let k = self.skip_trivia(j + 1);
      if self.is_punct(k, '(') {
        let mut m = k + 1;
        loop {
          m = self.skip_blank(m);
          if m >= self.toks.len() {
            return Err(SyntaxError { offset: self.toks[k].start, message: "unclosed import group".into() });
          }
          if self.is_punct(m, ')') {
            end = self.toks[m].end;
            next = m + 1;
            break;
          }
          let (imp, after) = self.import_spec(m)?;
          imports.push(imp);
          m = after;
        }
      } else {
        let (imp, after) = self.import_spec(k)?;
        imports.push(imp);
        end = self.toks[after - 1].end;
        next = after;
      }
    }

    Ok(Header { package, imports, end, next })
  }

  fn import_spec(&self, mut i: usize) -> Result<(Import, usize), SyntaxError> {
    let mut alias = None;
    if self.kind(i) == Some(TokenKind::Ident) || self.is_punct(i, '.') {
      alias = Some(self.text(i).to_string());
      i = self.skip_trivia(i + 1);
    }
    match self.kind(i) {
      Some(TokenKind::Str) | Some(TokenKind::RawStr) => Ok((Import { path: self.text(i).to_string(), alias }, i + 1)),
      _ => {
        let offset = self.toks.get(i).map_or(self.src.len(), |t| t.start);
        Err(SyntaxError { offset, message: "expected import path".into() })
      }
    }
  }

  /// Removes top-level `type` and `func` declarations the rules drop.
  fn declarations(&mut self, from: usize) {
    let mut depth = 0i32;
    let mut at_line_start = true;
    let mut i = from;

    while i < self.toks.len() {
      let t = self.toks[i];
      match t.kind {
        TokenKind::Newline => {
          at_line_start = true;
          i += 1;
          continue;
        }
        _ if t.is_trivia() => {
          i += 1;
          continue;
        }
        TokenKind::Punct => match self.text(i) {
          "(" | "[" | "{" => depth += 1,
          ")" | "]" | "}" => depth -= 1,
          _ => {}
        },
        TokenKind::Ident if depth == 0 && at_line_start => match self.text(i) {
          "type" => {
            i = self.type_decl(i);
            continue;
          }
          "func" => {
            i = self.func_decl(i);
            continue;
          }
          _ => {}
        },
        _ => {}
      }
      at_line_start = false;
      i += 1;
    }
  }

  fn type_decl(&mut self, i: usize) -> usize {
    let j = self.skip_trivia(i + 1);

    if self.is_punct(j, '(') {
      let mut k = j + 1;
      loop {
        k = self.skip_blank(k);
        if k >= self.toks.len() {
          return k;
        }
        if self.is_punct(k, ')') {
          return k + 1;
        }
        let (stop, end) = self.decl_end(k);
        if self.kind(k) == Some(TokenKind::Ident) && self.drops_type(self.text(k)) {
          let start = decl_start(self.src, self.toks[k].start);
          self.delete(start, end);
        }
        if stop <= k {
          return k + 1;
        }
        k = stop;
      }
    }

    let (stop, end) = self.decl_end(i);
    if self.kind(j) == Some(TokenKind::Ident) && self.drops_type(self.text(j)) {
      let start = decl_start(self.src, self.toks[i].start);
      self.delete_decl(start, end);
    }
    stop
  }

  fn func_decl(&mut self, i: usize) -> usize {
    let j = self.skip_trivia(i + 1);
    let mut receiver = None;
    let mut name_idx = j;

    if self.is_punct(j, '(') {
      let close = self.matching(j);
      receiver = self.receiver_type(j + 1, close);
      name_idx = self.skip_trivia(close + 1);
    }

    let (stop, end) = self.decl_end(i);
    let name = (self.kind(name_idx) == Some(TokenKind::Ident)).then(|| self.text(name_idx));
    let drop = name.is_some_and(|n| self.rules.is_deleted(Namespace::Func, n))
      || receiver.is_some_and(|r| self.drops_type(r));

    if drop {
      let start = decl_start(self.src, self.toks[i].start);
      self.delete_decl(start, end);
    }
    stop
  }

  /// `(m *Map[K, V])` -> `Map`.
  fn receiver_type(&self, from: usize, to: usize) -> Option<&'a str> {
    let mut last = None;
    for k in from..to.min(self.toks.len()) {
      if self.is_punct(k, '[') {
        break;
      }
      if self.kind(k) == Some(TokenKind::Ident) {
        last = Some(self.text(k));
      }
    }
    last
  }

  fn selector_after(&self, k: usize) -> Option<usize> {
    let dot = self.skip_trivia(k + 1);
    if !self.is_punct(dot, '.') {
      return None;
    }
    let sel = self.skip_trivia(dot + 1);
    (self.kind(sel) == Some(TokenKind::Ident)).then_some(sel)
  }

  /// An embedded struct field: the identifier is alone on its line (tags aside).
  fn embedded(&self, k: usize) -> bool {
    let n = self.skip_trivia(k + 1);
    match self.toks.get(n) {
      None => true,
      Some(t) => {
        matches!(t.kind, TokenKind::Newline | TokenKind::Str | TokenKind::RawStr)
          || t.is_punct(self.src, '}')
          || t.is_punct(self.src, ';')
      }
    }
  }

  /// Renames references and removes field/selector lines. Returns the last token index consumed.
  fn ident(&mut self, k: usize, field_pos: bool, line_start: bool, after_dot: bool) -> usize {
    let rules = self.rules;
    let t = self.toks[k];
    let text = self.text(k);

    if !after_dot {
      if let Some(s) = self.selector_after(k) {
        let key = format!("{}.{}", text, self.text(s));
        match rules.get(Namespace::Selector, &key) {
          Some(Replacement::Rename(to)) => {
            let end = self.toks[s].end;
            self.replace(t.start, end, to);
            return s;
          }
          Some(Replacement::Delete) => {
            let (start, end) = self.statement_span(k);
            self.delete(start, end);
            return s;
          }
          None => {}
        }
      }
    }

    if after_dot {
      if let Some(to) = rules.renamed(Namespace::Field, text).or_else(|| rules.renamed(Namespace::Func, text)) {
        self.replace(t.start, t.end, to);
      }
    } else if field_pos && !(line_start && self.embedded(k)) {
      match rules.get(Namespace::Field, text) {
        Some(Replacement::Rename(to)) => self.replace(t.start, t.end, to),
        Some(Replacement::Delete) if line_start => {
          let (start, end) = self.statement_span(k);
          self.delete(start, end);
        }
        _ => {}
      }
    } else if let Some(to) = rules.renamed(Namespace::Type, text).or_else(|| rules.renamed(Namespace::Func, text)) {
      self.replace(t.start, t.end, to);
    }

    k
  }

  fn references(&mut self, from: usize) -> Result<(), SyntaxError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut struct_next = false;
    let mut at_line_start = true;
    let mut names_mode = false;
    let mut prev_comma = false;
    let mut prev_dot = false;
    let mut k = from;

    while k < self.toks.len() {
      let t = self.toks[k];
      if t.kind == TokenKind::Newline {
        at_line_start = true;
        k += 1;
        continue;
      }
      if t.is_trivia() {
        k += 1;
        continue;
      }

      let mut last = k;
      match t.kind {
        TokenKind::Punct => {
          let c = self.text(k).chars().next().unwrap_or_default();
          match c {
            '{' | '(' | '[' => {
              let close = match c {
                '{' => '}',
                '(' => ')',
                _ => ']',
              };
              stack.push(Frame { open: c, close, offset: t.start, is_struct: c == '{' && struct_next });
            }
            ')' | ']' | '}' => match stack.pop() {
              Some(f) if f.close == c => {}
              _ => return Err(SyntaxError { offset: t.start, message: format!("unexpected `{}`", c) }),
            },
            _ => {}
          }
          if c != ',' {
            names_mode = false;
          }
        }
        TokenKind::Ident => {
          let in_struct = stack.last().is_some_and(|f| f.is_struct);
          let field_pos = in_struct && (at_line_start || (names_mode && prev_comma));
          names_mode = field_pos;
          last = self.ident(k, field_pos, at_line_start, prev_dot);
          if last != k {
            names_mode = false;
          }
        }
        _ => names_mode = false,
      }

      struct_next = self.is_keyword(k, "struct");
      prev_comma = self.is_punct(last, ',');
      prev_dot = self.is_punct(last, '.');
      at_line_start = false;
      k = last + 1;
    }

    match stack.last() {
      Some(f) => Err(SyntaxError { offset: f.offset, message: format!("unclosed `{}`", f.open) }),
      None => Ok(()),
    }
  }
}

/// Rewrites one Go file with `rules`, optionally renaming its package to `name`.
pub fn rewrite(src: &str, rules: &RuleTable, name: Option<&str>) -> Result<Rewritten, SyntaxError> {
  let toks = tokenize(src)?;
  let mut rw = Rewriter { src, toks, rules, edits: Vec::new() };

  let header = rw.header(name)?;
  rw.references(header.next)?;
  rw.declarations(header.next);

  let code = apply(src, &rw.edits);
  rw.edits.push(Edit { start: 0, end: header.end, replacement: String::new() });
  let body = apply(src, &rw.edits).trim_start().to_string();

  Ok(Rewritten { package: header.package, imports: header.imports, code, body })
}
