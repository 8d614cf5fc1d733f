// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Classify run failures and map them to process exit codes
// role: errors/exit-codes
// inputs: ResolveError, ParseError, WriteError, missing input
// outputs: GenError with a user-facing message and exit_code()
// invariants:
// - resolution failures exit 2; parse, write and missing-input failures exit 1
// - parse messages read "error parsing file|package (<path>): ..." and file errors append the source snippet
// errors: none of its own
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

use crate::engine::{ParseError, WriteError};
use crate::resolve::ResolveError;

/// Failure of a whole run; each variant maps to a process exit code.
#[derive(Debug, Error)]
pub enum GenError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("error parsing {kind} ({path}): {source}{}", .snippet.as_deref().map(|s| format!("\n{s}")).unwrap_or_default())]
  Parse {
    kind: &'static str,
    path: String,
    snippet: Option<String>,
    #[source]
    source: ParseError,
  },

  #[error(transparent)]
  Write(#[from] WriteError),

  #[error("no input given: pass --seed, --package or --in")]
  NoInput,
}

impl GenError {
  pub fn parse_file(path: &str, source: ParseError) -> Self {
    GenError::Parse { kind: "file", path: path.to_string(), snippet: source.snippet.clone(), source }
  }

  pub fn parse_package(path: &str, source: ParseError) -> Self {
    GenError::Parse { kind: "package", path: path.to_string(), snippet: None, source }
  }

  pub fn exit_code(&self) -> i32 {
    match self {
      GenError::Resolve(_) => 2,
      GenError::Parse { .. } | GenError::Write(_) | GenError::NoInput => 1,
    }
  }
}
