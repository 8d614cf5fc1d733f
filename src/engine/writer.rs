// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render rewritten sources to a file, a directory, one merged file, or standard output
// role: engine/writer
// inputs: SourceFile / Package values produced by the rewriter; a normalized target path
// outputs: files on disk or bytes on stdout
// side_effects: creates parent directories; truncates existing targets
// invariants:
// - merged output has one generated header, one package clause and one sorted, de-duplicated import block
// - merged imports drop packages no body references (blank and dot imports are kept)
// - stdout is written through the process handle, never by opening /dev/stdout
// errors: WriteError with the target path and io source
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use super::lexer::{tokenize, TokenKind};
use super::rewrite::{is_ident, Import};
use super::{Package, SourceFile, WriteError};
use crate::output::is_stdout;

pub const GENERATED_HEADER: &str = "// Code generated by genx; DO NOT EDIT.";

fn io_err(path: &str) -> impl FnOnce(io::Error) -> WriteError + '_ {
  move |source| WriteError { path: path.to_string(), source }
}

fn open(target: &str) -> Result<Box<dyn Write>, WriteError> {
  if is_stdout(target) {
    return Ok(Box::new(io::stdout().lock()));
  }
  if let Some(parent) = Path::new(target).parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(io_err(target))?;
  }
  let f = fs::File::create(target).map_err(io_err(target))?;
  Ok(Box::new(BufWriter::new(f)))
}

fn emit(target: &str, content: &str) -> Result<(), WriteError> {
  let mut w = open(target)?;
  w.write_all(content.as_bytes()).map_err(io_err(target))?;
  w.flush().map_err(io_err(target))
}

fn file_name(path: &str) -> String {
  Path::new(path).file_name().map_or_else(|| path.to_string(), |n| n.to_string_lossy().to_string())
}

/// Names an import may be referenced by in code: the alias when there is
/// one, else the last path element (skipping a trailing `/vN`) and the name
/// goimports assumes for it (`go-sqlite3` -> `sqlite3`, `yaml.v2` -> `yaml`).
fn import_names(imp: &Import) -> Vec<String> {
  if let Some(alias) = &imp.alias {
    return vec![alias.clone()];
  }
  let path = imp.path.trim_matches(|c| c == '"' || c == '`');
  let mut parts = path.rsplit('/');
  let last = parts.next().unwrap_or(path);
  let is_major = last.len() > 1 && last.starts_with('v') && last[1..].chars().all(|c| c.is_ascii_digit());
  let base = match (is_major, parts.next()) {
    (true, Some(prev)) => prev,
    _ => last,
  };

  let trimmed = base.strip_prefix("go-").unwrap_or(base);
  let cut = trimmed.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(trimmed.len());
  let assumed = &trimmed[..cut];

  let mut names = vec![base.to_string()];
  if !assumed.is_empty() && assumed != base {
    names.push(assumed.to_string());
  }
  names
}

/// Blank and dot imports are always kept. A named import is kept when one
/// of its names roots a selector, or when its package name cannot be
/// guessed from the path at all.
fn keep_import(imp: &Import, roots: &BTreeSet<String>) -> bool {
  if matches!(imp.alias.as_deref(), Some("_") | Some(".")) {
    return true;
  }
  let names = import_names(imp);
  names.iter().any(|n| roots.contains(n)) || !names.iter().any(|n| is_ident(n))
}

/// Identifiers used as the left side of a selector anywhere in `bodies`.
fn selector_roots(bodies: &[&str]) -> BTreeSet<String> {
  let mut roots = BTreeSet::new();
  for body in bodies {
    let Ok(toks) = tokenize(body) else { continue };
    let sig: Vec<_> = toks.iter().filter(|t| !t.is_trivia() && t.kind != TokenKind::Newline).collect();
    for pair in sig.windows(2) {
      if pair[0].kind == TokenKind::Ident && pair[1].is_punct(body, '.') {
        roots.insert(pair[0].text(body).to_string());
      }
    }
  }
  roots
}

pub fn render_merged(pkg: &Package) -> String {
  let bodies: Vec<&str> = pkg.files.iter().map(|f| f.body.as_str()).collect();
  let roots = &selector_roots(&bodies);

  let imports: BTreeSet<&Import> = pkg
    .files
    .iter()
    .flat_map(|f| f.imports.iter())
    .filter(|imp| keep_import(imp, roots))
    .collect();

  let mut out = format!("{}\n\npackage {}\n\n", GENERATED_HEADER, pkg.name);
  match imports.len() {
    0 => {}
    1 => {
      for imp in &imports {
        out.push_str(&format!("import {}\n\n", imp));
      }
    }
    _ => {
      out.push_str("import (\n");
      for imp in &imports {
        out.push_str(&format!("\t{}\n", imp));
      }
      out.push_str(")\n\n");
    }
  }

  let parts: Vec<&str> = bodies.iter().map(|b| b.trim_end()).filter(|b| !b.is_empty()).collect();
  out.push_str(&parts.join("\n\n"));
  out.push('\n');
  out
}

pub fn write_file(file: &SourceFile, target: &str) -> Result<(), WriteError> {
  emit(target, &file.code)?;
  info!(source = %file.path, target, "wrote file");
  Ok(())
}

pub fn write_package(pkg: &Package, target: &str) -> Result<(), WriteError> {
  if is_stdout(target) {
    let mut w = open(target)?;
    for (i, f) in pkg.files.iter().enumerate() {
      if i > 0 {
        w.write_all(b"\n").map_err(io_err(target))?;
      }
      write!(w, "// file: {}\n{}", file_name(&f.path), f.code).map_err(io_err(target))?;
    }
    w.flush().map_err(io_err(target))?;
    info!(dir = %pkg.dir, files = pkg.files.len(), "streamed package to stdout");
    return Ok(());
  }

  fs::create_dir_all(target).map_err(io_err(target))?;
  for f in &pkg.files {
    let dest = Path::new(target).join(file_name(&f.path));
    let dest = dest.to_string_lossy();
    debug!(source = %f.path, dest = %dest, "writing package file");
    emit(&dest, &f.code)?;
  }
  info!(dir = %pkg.dir, target, files = pkg.files.len(), "wrote package");
  Ok(())
}

pub fn write_merged(pkg: &Package, target: &str) -> Result<(), WriteError> {
  emit(target, &render_merged(pkg))?;
  info!(dir = %pkg.dir, target, files = pkg.files.len(), "wrote merged package");
  Ok(())
}
