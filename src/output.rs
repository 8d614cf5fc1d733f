// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Decide where generated code goes and whether a package is merged into one file
// role: planning/output
// inputs: requested --out value, input kind (seed, package, single file)
// outputs: OutputPlan { target, merge }
// invariants:
// - "", "-" and /dev/stdout normalize to /dev/stdout
// - merge is recomputed as `!merge && ext == "go"` after normalization (stdout therefore ends up false)
// - seed inputs always merge
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::resolve::is_go_file;

pub const STDOUT_ALIAS: &str = "/dev/stdout";

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InputKind {
  Seed,
  Package,
  File,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct OutputPlan {
  pub target: String,
  pub merge: bool,
}

pub fn is_stdout(path: &str) -> bool {
  matches!(path, "" | "-" | STDOUT_ALIAS)
}

/// Maps the standard-output spellings onto [`STDOUT_ALIAS`]; other paths pass through.
pub fn normalize_target(out: &str) -> String {
  if is_stdout(out) {
    STDOUT_ALIAS.to_string()
  } else {
    out.to_string()
  }
}

/// Plans a write for `kind`.
///
/// The stdout default is overwritten by the extension check rather than
/// OR-ed with it, so a package written to stdout is not merged unless it is
/// a seed. Single files never merge; they always go through the single-file
/// writer at the normalized target.
pub fn plan_output(out: &str, kind: InputKind) -> OutputPlan {
  let target = normalize_target(out);

  if kind == InputKind::File {
    return OutputPlan { target, merge: false };
  }

  let mut merge = is_stdout(out);
  merge = !merge && is_go_file(&target);

  if kind == InputKind::Seed {
    merge = true;
  }

  OutputPlan { target, merge }
}
