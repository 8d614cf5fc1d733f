//! Build constraint evaluation for package parsing: `//go:build` lines,
//! legacy `// +build` lines and `_GOOS` / `_GOARCH` file-name suffixes.

use once_cell::sync::Lazy;
use regex::Regex;

static BUILD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//go:build\s+(.+?)\s*$").expect("valid regex"));
static PLUS_BUILD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//\s*\+build\s+(.+?)\s*$").expect("valid regex"));

const KNOWN_OS: &[&str] = &[
  "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux", "nacl", "netbsd",
  "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
  "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle", "mips64", "mips64le",
  "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64",
  "wasm",
];

fn host_os() -> &'static str {
  match std::env::consts::OS {
    "macos" => "darwin",
    other => other,
  }
}

fn host_arch() -> &'static str {
  match std::env::consts::ARCH {
    "x86_64" => "amd64",
    "x86" => "386",
    "aarch64" => "arm64",
    "powerpc64" => "ppc64",
    other => other,
  }
}

/// Tags that hold for the current host plus the user-supplied ones.
#[derive(Debug, Clone)]
pub struct TagSet {
  tags: Vec<String>,
}

impl TagSet {
  pub fn new(user: &[String]) -> Self {
    let mut tags: Vec<String> = user.to_vec();
    tags.push(host_os().to_string());
    tags.push(host_arch().to_string());
    tags.push("gc".to_string());
    if cfg!(unix) {
      tags.push("unix".to_string());
    }
    TagSet { tags }
  }

  pub fn holds(&self, tag: &str) -> bool {
    tag.starts_with("go1.") || self.tags.iter().any(|t| t == tag)
  }
}

/// The first `//go:build` expression in the header, if any.
pub fn build_expr(src: &str) -> Option<&str> {
  for line in src.lines() {
    let line = line.trim();
    if line.starts_with("package ") {
      break;
    }
    if let Some(c) = BUILD_LINE.captures(line) {
      return c.get(1).map(|m| m.as_str());
    }
  }
  None
}

/// Expressions of the `// +build` lines in the header.
pub fn plus_build_exprs(src: &str) -> Vec<&str> {
  let mut out = Vec::new();
  for line in src.lines() {
    let line = line.trim();
    if line.starts_with("package ") {
      break;
    }
    if let Some(m) = PLUS_BUILD_LINE.captures(line).and_then(|c| c.get(1)) {
      out.push(m.as_str());
    }
  }
  out
}

/// One `// +build` line: space separated alternatives of comma separated
/// terms, each optionally negated with `!`.
fn eval_plus(expr: &str, tags: &TagSet) -> Result<bool, String> {
  let mut any = false;
  for alt in expr.split_whitespace() {
    let mut all = true;
    for term in alt.split(',') {
      let (negated, tag) = match term.strip_prefix('!') {
        Some(t) => (true, t),
        None => (false, term),
      };
      if tag.is_empty() || tag.starts_with('!') || !tag.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return Err(format!("malformed +build term `{}`", term));
      }
      all &= tags.holds(tag) != negated;
    }
    any |= all;
  }
  Ok(any)
}

/// Whether a file with this source is part of the build for `tags`.
/// A `//go:build` line takes precedence over `// +build` lines, which must
/// all hold.
pub fn satisfied(src: &str, tags: &TagSet) -> Result<bool, String> {
  if let Some(expr) = build_expr(src) {
    return eval(expr, tags);
  }
  for expr in plus_build_exprs(src) {
    if !eval_plus(expr, tags)? {
      return Ok(false);
    }
  }
  Ok(true)
}

/// Applies the `name_GOOS`, `name_GOARCH` and `name_GOOS_GOARCH` file-name
/// constraints. The first `_` element never counts, so `windows.go` is
/// unconstrained.
pub fn file_name_matches(file: &str, tags: &TagSet) -> bool {
  let stem = file.strip_suffix(".go").unwrap_or(file);
  let stem = stem.strip_suffix("_test").unwrap_or(stem);
  let parts: Vec<&str> = stem.split('_').skip(1).collect();
  let n = parts.len();
  if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
    return tags.holds(parts[n - 2]) && tags.holds(parts[n - 1]);
  }
  match parts.last() {
    Some(last) if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => tags.holds(last),
    _ => true,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
  Tag(String),
  Not,
  And,
  Or,
  Open,
  Close,
}

fn lex(expr: &str) -> Result<Vec<Tok>, String> {
  let mut out = Vec::new();
  let mut chars = expr.char_indices().peekable();
  while let Some((i, c)) = chars.next() {
    match c {
      ' ' | '\t' => {}
      '!' => out.push(Tok::Not),
      '(' => out.push(Tok::Open),
      ')' => out.push(Tok::Close),
      '&' | '|' => {
        if chars.next().map(|(_, n)| n) != Some(c) {
          return Err(format!("unexpected `{}` in build constraint", c));
        }
        out.push(if c == '&' { Tok::And } else { Tok::Or });
      }
      c if c.is_alphanumeric() || c == '_' || c == '.' => {
        let mut end = i + c.len_utf8();
        while let Some(&(j, n)) = chars.peek() {
          if n.is_alphanumeric() || n == '_' || n == '.' {
            end = j + n.len_utf8();
            chars.next();
          } else {
            break;
          }
        }
        out.push(Tok::Tag(expr[i..end].to_string()));
      }
      other => return Err(format!("unexpected `{}` in build constraint", other)),
    }
  }
  Ok(out)
}

struct Parser<'a> {
  toks: Vec<Tok>,
  pos: usize,
  tags: &'a TagSet,
}

impl Parser<'_> {
  fn peek(&self) -> Option<&Tok> {
    self.toks.get(self.pos)
  }

  fn or(&mut self) -> Result<bool, String> {
    let mut v = self.and()?;
    while self.peek() == Some(&Tok::Or) {
      self.pos += 1;
      let rhs = self.and()?;
      v = v || rhs;
    }
    Ok(v)
  }

  fn and(&mut self) -> Result<bool, String> {
    let mut v = self.not()?;
    while self.peek() == Some(&Tok::And) {
      self.pos += 1;
      let rhs = self.not()?;
      v = v && rhs;
    }
    Ok(v)
  }

  fn not(&mut self) -> Result<bool, String> {
    if self.peek() == Some(&Tok::Not) {
      self.pos += 1;
      return Ok(!self.not()?);
    }
    self.atom()
  }

  fn atom(&mut self) -> Result<bool, String> {
    let tok = self.peek().cloned();
    self.pos += 1;
    match tok {
      Some(Tok::Tag(t)) => Ok(self.tags.holds(&t)),
      Some(Tok::Open) => {
        let v = self.or()?;
        if self.peek() != Some(&Tok::Close) {
          return Err("missing `)` in build constraint".to_string());
        }
        self.pos += 1;
        Ok(v)
      }
      _ => Err("malformed build constraint".to_string()),
    }
  }
}

pub fn eval(expr: &str, tags: &TagSet) -> Result<bool, String> {
  let mut p = Parser { toks: lex(expr)?, pos: 0, tags };
  let v = p.or()?;
  if p.pos != p.toks.len() {
    return Err("trailing tokens in build constraint".to_string());
  }
  Ok(v)
}
