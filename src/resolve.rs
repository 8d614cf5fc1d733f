// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve a file path, package path or seed import path to an existing local file or directory
// role: resolution/pipeline
// inputs: ResolutionRequest (raw input, tags, tool flags, fetch permission); a Toolchain
// outputs: Resolution::Found { path, is_single_file } or Resolution::NotFound { advisory }
// side_effects: at most list -> get -> list through the Toolchain; none when the input exists locally
// invariants:
// - an existing local input is returned unchanged without touching the toolchain
// - Found.path exists on disk when returned
// - NotFound is only produced for a not-found list while fetching is disallowed
// errors: ResolveError::Tool for any other toolchain failure; ResolveError::Missing when the listed path is absent
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::toolchain::{ToolArgs, ToolError, Toolchain};

pub const GO_EXT: &str = "go";

#[derive(Debug, Clone)]
pub struct ResolutionRequest<'a> {
  pub raw_input: &'a str,
  /// Seeds resolve exactly like package paths; the flag only tags the logs.
  pub is_seed: bool,
  pub build_tags: &'a [String],
  pub tool_flags: &'a [String],
  pub allow_fetch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Found { path: String, is_single_file: bool },
  /// Soft outcome: the input is unknown and fetching was not allowed.
  NotFound { advisory: String },
}

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error("`{input}` resolved to `{path}`, which does not exist")]
  Missing { input: String, path: String },
}

pub fn is_go_file(p: &str) -> bool {
  Path::new(p).extension().is_some_and(|e| e == GO_EXT)
}

fn query_dir(raw: &str, single_file: bool) -> String {
  if !single_file {
    return raw.to_string();
  }
  match Path::new(raw).parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().to_string(),
    _ => ".".to_string(),
  }
}

pub fn resolve(tool: &dyn Toolchain, req: &ResolutionRequest<'_>) -> Result<Resolution, ResolveError> {
  let raw = req.raw_input;

  if let Ok(meta) = std::fs::metadata(raw) {
    debug!(input = raw, "input exists locally");
    return Ok(Resolution::Found { path: raw.to_string(), is_single_file: meta.is_file() });
  }

  let single_file = is_go_file(raw);
  let dir = query_dir(raw, single_file);
  let args = ToolArgs { tags: req.build_tags, flags: req.tool_flags };
  debug!(input = raw, dir = %dir, seed = req.is_seed, single_file, "resolving through toolchain");

  let listed = match tool.list(&dir, args) {
    Ok(found) => found,
    Err(err) if err.is_not_found() => {
      if !req.allow_fetch {
        return Ok(Resolution::NotFound {
          advisory: format!("`{}` not found and `--get` isn't specified.", raw),
        });
      }
      info!("`{}` not found locally, fetching", dir);
      tool.fetch(&dir, args)?;
      tool.list(&dir, args)?
    }
    Err(err) => return Err(err.into()),
  };

  let path: PathBuf = if single_file {
    let base = Path::new(raw).file_name().unwrap_or_default();
    Path::new(&listed).join(base)
  } else {
    PathBuf::from(&listed)
  };

  if listed.is_empty() || !path.exists() {
    return Err(ResolveError::Missing { input: raw.to_string(), path: path.to_string_lossy().to_string() });
  }

  Ok(Resolution::Found { path: path.to_string_lossy().to_string(), is_single_file: single_file })
}
