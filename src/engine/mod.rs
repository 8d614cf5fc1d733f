// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Transform-engine seam and the built-in Go rewriter behind it
// role: engine/boundary
// inputs: file or package paths, RuleTable, package name override, build tags
// outputs: SourceFile / Package values; written output through the writer
// invariants:
// - package parsing skips _test.go files, foreign _GOOS/_GOARCH file names and files whose //go:build or // +build constraint does not hold
// - package files are processed in file-name order
// - "-" and /dev/stdin read the source from standard input
// errors: ParseError (path, message, optional source snippet); WriteError (path, io source)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod constraint;
pub mod lexer;
pub mod rewrite;
pub mod writer;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::resolve::is_go_file;
use crate::rules::RuleTable;
use constraint::TagSet;
use rewrite::{rewrite, Import, SyntaxError};

const STDIN_ALIASES: &[&str] = &["-", "/dev/stdin"];

pub fn is_stdin(path: &str) -> bool {
  STDIN_ALIASES.contains(&path)
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
  pub path: String,
  pub message: String,
  pub snippet: Option<String>,
}

#[derive(Debug, Error)]
#[error("writing {path}: {source}")]
pub struct WriteError {
  pub path: String,
  #[source]
  pub source: io::Error,
}

/// One rewritten Go file.
#[derive(Debug, Clone)]
pub struct SourceFile {
  pub path: String,
  pub package: String,
  pub imports: Vec<Import>,
  /// Whole file after rewriting.
  pub code: String,
  /// Declarations only, without the package clause and imports.
  pub body: String,
}

#[derive(Debug, Clone)]
pub struct Package {
  pub dir: String,
  pub name: String,
  pub files: Vec<SourceFile>,
}

/// What the orchestrator needs from a code transformer.
pub trait TransformEngine {
  fn parse_file(&self, path: &str) -> Result<SourceFile, ParseError>;
  fn parse_package(&self, dir: &str) -> Result<Package, ParseError>;
  fn write_file(&self, file: &SourceFile, target: &str) -> Result<(), WriteError>;
  fn write_package(&self, pkg: &Package, target: &str) -> Result<(), WriteError>;
  fn write_merged(&self, pkg: &Package, target: &str) -> Result<(), WriteError>;
}

pub struct GoRewriter {
  name: Option<String>,
  rules: RuleTable,
  tags: TagSet,
}

/// `line:col` (1-based, columns in chars) of a byte offset.
fn position(src: &str, offset: usize) -> (usize, usize) {
  let before = &src[..offset.min(src.len())];
  let line = before.matches('\n').count() + 1;
  let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
  (line, col)
}

/// The offending line with a caret under the error column.
fn snippet(src: &str, offset: usize) -> String {
  let (line, col) = position(src, offset);
  let text = src.lines().nth(line - 1).unwrap_or_default();
  format!("{:>4} | {}\n     | {}^", line, text, " ".repeat(col - 1))
}

fn read_source(path: &str) -> Result<String, ParseError> {
  let read = if is_stdin(path) {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).map(|_| buf)
  } else {
    fs::read_to_string(path)
  };
  read.map_err(|e| ParseError { path: path.to_string(), message: format!("{}: {}", path, e), snippet: None })
}

impl GoRewriter {
  pub fn new(name: Option<String>, rules: RuleTable, build_tags: &[String]) -> Self {
    GoRewriter { name: name.filter(|n| !n.is_empty()), rules, tags: TagSet::new(build_tags) }
  }

  fn rewrite_source(&self, path: &str, src: &str) -> Result<SourceFile, ParseError> {
    let out = rewrite(src, &self.rules, self.name.as_deref()).map_err(|e: SyntaxError| {
      let (line, col) = position(src, e.offset);
      ParseError {
        path: path.to_string(),
        message: format!("{}:{}:{}: {}", path, line, col, e.message),
        snippet: Some(snippet(src, e.offset)),
      }
    })?;
    Ok(SourceFile { path: path.to_string(), package: out.package, imports: out.imports, code: out.code, body: out.body })
  }
}

impl TransformEngine for GoRewriter {
  fn parse_file(&self, path: &str) -> Result<SourceFile, ParseError> {
    let src = read_source(path)?;
    self.rewrite_source(path, &src)
  }

  fn parse_package(&self, dir: &str) -> Result<Package, ParseError> {
    let fail = |message: String| ParseError { path: dir.to_string(), message, snippet: None };

    let entries = fs::read_dir(dir).map_err(|e| fail(format!("{}: {}", dir, e)))?;
    let mut paths: Vec<String> = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| fail(format!("{}: {}", dir, e)))?;
      let name = entry.file_name().to_string_lossy().to_string();
      if !is_go_file(&name) || name.ends_with("_test.go") || !entry.path().is_file() {
        continue;
      }
      if !constraint::file_name_matches(&name, &self.tags) {
        debug!(file = %name, "excluded by file name");
        continue;
      }
      paths.push(entry.path().to_string_lossy().to_string());
    }
    paths.sort();

    let mut files: Vec<SourceFile> = Vec::new();
    for path in paths {
      let src = read_source(&path)?;
      match constraint::satisfied(&src, &self.tags) {
        Ok(true) => {}
        Ok(false) => {
          debug!(file = %path, "excluded by build constraint");
          continue;
        }
        Err(msg) => return Err(ParseError { path: path.clone(), message: format!("{}: {}", path, msg), snippet: None }),
      }
      files.push(self.rewrite_source(&path, &src)?);
    }

    let Some(first) = files.first() else {
      return Err(fail(format!("no buildable Go source files in {}", dir)));
    };
    let name = first.package.clone();
    if let Some(other) = files.iter().find(|f| f.package != name) {
      return Err(fail(format!(
        "found packages {} ({}) and {} ({}) in {}",
        name,
        file_name(&first.path),
        other.package,
        file_name(&other.path),
        dir
      )));
    }

    debug!(dir, package = %name, files = files.len(), "parsed package");
    Ok(Package { dir: dir.to_string(), name, files })
  }

  fn write_file(&self, file: &SourceFile, target: &str) -> Result<(), WriteError> {
    writer::write_file(file, target)
  }

  fn write_package(&self, pkg: &Package, target: &str) -> Result<(), WriteError> {
    writer::write_package(pkg, target)
  }

  fn write_merged(&self, pkg: &Package, target: &str) -> Result<(), WriteError> {
    writer::write_merged(pkg, target)
  }
}

fn file_name(path: &str) -> String {
  Path::new(path).file_name().map_or_else(|| path.to_string(), |n| n.to_string_lossy().to_string())
}
