// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Narrow capability over the host toolchain's `list` and `get` subcommands
// role: integration/subprocess
// inputs: query directory, build tags, extra tool flags
// outputs: canonical package directory (list); success/failure (get)
// side_effects: spawns the toolchain binary synchronously; `get` may download sources
// invariants:
// - tags are passed as one space-joined `-tags` value; extra flags follow verbatim, directory last
// - not-found failures are classified apart from every other failure
// errors: ToolError::{Spawn, NotFound, Failed} carrying the command line and stderr
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Output fragments the Go toolchain prints when a package path is unknown.
const NOT_FOUND_MARKERS: &[&str] = &[
  "cannot find package",
  "no required module provides package",
  "cannot find module providing package",
];

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("spawning {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("`{target}` cannot be found: {detail}")]
  NotFound { target: String, detail: String },

  #[error("{command} failed ({status}): {detail}")]
  Failed { command: String, status: String, detail: String },
}

impl ToolError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, ToolError::NotFound { .. })
  }
}

/// Build tags and pass-through flags shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct ToolArgs<'a> {
  pub tags: &'a [String],
  pub flags: &'a [String],
}

pub trait Toolchain {
  /// Canonical local directory of the package at `dir`.
  fn list(&self, dir: &str, args: ToolArgs<'_>) -> Result<String, ToolError>;

  /// Download (or update) the package at `dir`.
  fn fetch(&self, dir: &str, args: ToolArgs<'_>) -> Result<(), ToolError>;
}

fn tail_args(dir: &str, args: ToolArgs<'_>) -> Vec<String> {
  let mut out = vec!["-tags".to_string(), args.tags.join(" ")];
  out.extend(args.flags.iter().cloned());
  out.push(dir.to_string());
  out
}

pub fn list_args(dir: &str, args: ToolArgs<'_>) -> Vec<String> {
  let mut out: Vec<String> = vec!["list".into(), "-f".into(), "{{.Dir}}".into()];
  out.extend(tail_args(dir, args));
  out
}

pub fn get_args(dir: &str, args: ToolArgs<'_>) -> Vec<String> {
  let mut out: Vec<String> = vec!["get".into(), "-u".into(), "-v".into()];
  out.extend(tail_args(dir, args));
  out
}

fn mentions_not_found(text: &str) -> bool {
  NOT_FOUND_MARKERS.iter().any(|m| text.contains(m))
}

/// The `go` binary (or whatever `--go-bin` names), resolved through `PATH`.
#[derive(Debug, Clone)]
pub struct GoTool {
  program: String,
}

impl GoTool {
  pub fn new(program: impl Into<String>) -> Self {
    GoTool { program: program.into() }
  }

  fn run(&self, args: &[String], target: &str) -> Result<String, ToolError> {
    let command = format!("{} {}", self.program, args.join(" "));
    debug!("executing: {}", command);

    let out = Command::new(&self.program)
      .args(args)
      .output()
      .map_err(|source| ToolError::Spawn { program: self.program.clone(), source })?;

    let stdout = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if out.status.success() {
      return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    let not_found = mentions_not_found(&stdout) || mentions_not_found(&stderr);
    let detail = if stderr.is_empty() { stdout } else { stderr };

    if not_found {
      Err(ToolError::NotFound { target: target.to_string(), detail })
    } else {
      Err(ToolError::Failed { command, status: out.status.to_string(), detail })
    }
  }
}

impl Toolchain for GoTool {
  fn list(&self, dir: &str, args: ToolArgs<'_>) -> Result<String, ToolError> {
    self.run(&list_args(dir, args), dir)
  }

  fn fetch(&self, dir: &str, args: ToolArgs<'_>) -> Result<(), ToolError> {
    self.run(&get_args(dir, args), dir).map(|_| ())
  }
}
