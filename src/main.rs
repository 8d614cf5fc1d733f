use anyhow::Result;
use clap::Parser;

mod cli;
mod directive;
mod engine;
mod error;
mod output;
mod pipeline;
mod resolve;
mod rules;
mod toolchain;
mod util;

use crate::cli::{normalize, Cli};

fn main() -> Result<()> {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) => {
      // Exit 2 is reserved for resolution failures.
      let code = if e.use_stderr() { 1 } else { 0 };
      let _ = e.print();
      std::process::exit(code);
    }
  };

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI
  let cfg = normalize(cli);
  util::init_logging(cfg.verbose)?;

  // Phase 2: resolve, parse, write
  if let Err(err) = pipeline::execute(&cfg) {
    eprintln!("{}", err);
    std::process::exit(err.exit_code());
  }
  Ok(())
}
