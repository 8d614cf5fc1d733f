use clap::Parser;

use crate::directive::flatten;
use crate::output::InputKind;
use crate::rules::DirectiveSet;

pub const SEED_PREFIX: &str = "github.com/OneOfOne/genx/seeds/";

#[derive(Parser, Debug)]
#[command(
    name = "genx",
    version,
    about = "Generate concrete Go code from generic-style packages by renaming or removing types, selectors, fields and funcs",
    long_about = None
)]
pub struct Cli {
  /// Use a built-in seed, e.g. `cmap`; output is always merged into one file
  #[arg(long)]
  pub seed: Option<String>,

  /// Input file (`-` or /dev/stdin reads standard input)
  #[arg(long = "in", short = 'f')]
  pub input: Option<String>,

  /// Input package path (import path or directory)
  #[arg(long = "package", visible_alias = "pkg")]
  pub package: Option<String>,

  /// Package name override for the output
  #[arg(long, short = 'n')]
  pub name: Option<String>,

  /// Type rules: `Old=New`, or `Old` / `Old=` / `Old=-` to remove; comma separated, repeatable
  #[arg(long = "type", short = 't', value_name = "SPEC")]
  pub types: Vec<String>,

  /// Selector rules such as `cm.HashFn=hashers.Fnv32`; comma separated, repeatable
  #[arg(long = "selector", short = 's', value_name = "SPEC")]
  pub selectors: Vec<String>,

  /// Struct field rules; comma separated, repeatable
  #[arg(long = "field", visible_alias = "fld", value_name = "SPEC")]
  pub fields: Vec<String>,

  /// Function rules; comma separated, repeatable
  #[arg(long = "func", visible_alias = "fn", value_name = "SPEC")]
  pub funcs: Vec<String>,

  /// Output file or directory (default stdout)
  #[arg(long, short = 'o', default_value = "/dev/stdout")]
  pub out: String,

  /// Build tags used when listing, fetching and parsing packages
  #[arg(long, num_args = 1..)]
  pub tags: Vec<String>,

  /// Extra flags passed verbatim to `go list` / `go get`
  #[arg(long = "goFlags", num_args = 1.., allow_hyphen_values = true)]
  pub go_flags: Vec<String>,

  /// Fetch missing packages with `go get`
  #[arg(long)]
  pub get: bool,

  /// Log compiled rules, tags and executed commands
  #[arg(long, short = 'v')]
  pub verbose: bool,

  /// Go toolchain executable (hidden; tests only)
  #[arg(long = "go-bin", hide = true, default_value = "go")]
  pub go_bin: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
  pub path: String,
  pub kind: InputKind,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub input: Option<Input>,
  pub name: Option<String>,
  pub directives: DirectiveSet,
  pub out: String,
  pub tags: Vec<String>,
  pub go_flags: Vec<String>,
  pub get: bool,
  pub verbose: bool,
  pub go_bin: String,
}

fn non_empty(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Picks the input: seed wins over package, package over file.
fn select_input(seed: Option<String>, package: Option<String>, file: Option<String>) -> Option<Input> {
  if let Some(seed) = non_empty(seed) {
    return Some(Input { path: format!("{}{}", SEED_PREFIX, seed), kind: InputKind::Seed });
  }
  if let Some(path) = non_empty(package) {
    return Some(Input { path, kind: InputKind::Package });
  }
  non_empty(file).map(|path| Input { path, kind: InputKind::File })
}

pub fn normalize(cli: Cli) -> EffectiveConfig {
  let directives = DirectiveSet {
    types: flatten(&cli.types),
    selectors: flatten(&cli.selectors),
    fields: flatten(&cli.fields),
    funcs: flatten(&cli.funcs),
  };

  EffectiveConfig {
    input: select_input(cli.seed, cli.package, cli.input),
    name: non_empty(cli.name),
    directives,
    out: cli.out,
    tags: cli.tags.iter().flat_map(|t| t.split_whitespace()).map(str::to_string).collect(),
    go_flags: cli.go_flags,
    get: cli.get,
    verbose: cli.verbose,
    go_bin: cli.go_bin,
  }
}
