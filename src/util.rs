// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Process-level helpers: logging setup and man page rendering
// role: utilities/helpers
// inputs: verbosity flag; RUST_LOG; clap CommandFactory
// outputs: installed tracing subscriber; man page text
// side_effects: init_logging installs the global subscriber (first call wins)
// invariants:
// - logs go to stderr so generated code on stdout stays clean
// - RUST_LOG, when set, overrides the verbosity flag
// errors: invalid filter directives and man page render failures surface as anyhow errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

fn default_filter(verbose: bool) -> &'static str {
  if verbose {
    "warn,genx=debug"
  } else {
    "warn"
  }
}

pub fn init_logging(verbose: bool) -> Result<()> {
  let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter(verbose)))?;
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .with_target(false)
    .try_init()
    .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
