// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one run: compile rules -> resolve input -> parse -> plan output -> write
// role: orchestration/pipeline
// inputs: EffectiveConfig; a Toolchain and a TransformEngine (injected for tests)
// outputs: generated Go code at the planned target
// side_effects: subprocess calls through the Toolchain; filesystem or stdout writes through the engine
// invariants:
// - stdin inputs ("-", /dev/stdin) skip resolution
// - a not-found advisory is printed to stderr and the run succeeds
// - a resolved single file always takes the single-file path, whatever flag named it
// - no rollback of partially written output
// errors: GenError::{Resolve, Parse, Write, NoInput}
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::{debug, info, trace};

use crate::cli::EffectiveConfig;
use crate::engine::{is_stdin, GoRewriter, TransformEngine};
use crate::error::GenError;
use crate::output::{plan_output, InputKind};
use crate::resolve::{resolve, Resolution, ResolutionRequest};
use crate::rules::compile;
use crate::toolchain::{GoTool, Toolchain};

/// Builds the real toolchain and engine from `cfg` and runs.
pub fn execute(cfg: &EffectiveConfig) -> Result<(), GenError> {
  let rules = compile(&cfg.directives);
  debug!(
    count = rules.len(),
    rules = %serde_json::to_string(&rules).unwrap_or_default(),
    tags = ?cfg.tags,
    "compiled rules"
  );
  for (key, rule) in rules.ordered() {
    trace!(%key, %rule, "rule");
  }
  if rules.is_empty() {
    info!("no rules given; output mirrors the input");
  }

  let tool = GoTool::new(cfg.go_bin.clone());
  let engine = GoRewriter::new(cfg.name.clone(), rules, &cfg.tags);
  run(cfg, &tool, &engine)
}

pub fn run(cfg: &EffectiveConfig, tool: &dyn Toolchain, engine: &dyn TransformEngine) -> Result<(), GenError> {
  let input = cfg.input.as_ref().ok_or(GenError::NoInput)?;

  let (path, kind) = if input.kind == InputKind::File && is_stdin(&input.path) {
    (input.path.clone(), InputKind::File)
  } else {
    let req = ResolutionRequest {
      raw_input: &input.path,
      is_seed: input.kind == InputKind::Seed,
      build_tags: &cfg.tags,
      tool_flags: &cfg.go_flags,
      allow_fetch: cfg.get,
    };
    match resolve(tool, &req)? {
      Resolution::Found { path, is_single_file: true } => (path, InputKind::File),
      Resolution::Found { path, is_single_file: false } => {
        let kind = if input.kind == InputKind::File { InputKind::Package } else { input.kind };
        (path, kind)
      }
      Resolution::NotFound { advisory } => {
        eprintln!("{}", advisory);
        return Ok(());
      }
    }
  };

  let plan = plan_output(&cfg.out, kind);
  info!(input = %path, kind = ?kind, target = %plan.target, merge = plan.merge, "generating");

  if kind == InputKind::File {
    let file = engine.parse_file(&path).map_err(|e| GenError::parse_file(&path, e))?;
    engine.write_file(&file, &plan.target)?;
    return Ok(());
  }

  let pkg = engine.parse_package(&path).map_err(|e| GenError::parse_package(&path, e))?;
  if plan.merge {
    engine.write_merged(&pkg, &plan.target)?;
  } else {
    engine.write_package(&pkg, &plan.target)?;
  }
  Ok(())
}
