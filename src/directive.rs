// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Flatten repeatable `--type/--selector/--field/--func` values into ordered key/value directives
// role: parsing/flags
// inputs: Raw flag values, each possibly holding several comma-separated `key[=value]` segments
// outputs: Vec<Directive> in flag order then segment order
// invariants:
// - segments split on the first `=` only; both halves are trimmed
// - empty or whitespace-only segments are dropped
// errors: none; malformed input is skipped (best-effort parse)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

/// One `key[=value]` unit taken from a flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
  pub key: String,
  /// `None` when the segment carried no `=`.
  pub value: Option<String>,
}

impl Directive {
  pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
    Directive { key: key.into(), value: value.map(str::to_string) }
  }
}

/// Splits every raw value on `,`, then each segment on its first `=`.
///
/// Nothing here fails: a segment that carries no usable text is skipped and
/// an empty key is left for the rule compiler to discard.
pub fn flatten<S: AsRef<str>>(raw: &[S]) -> Vec<Directive> {
  let mut out = Vec::new();

  for value in raw {
    for segment in value.as_ref().split(',') {
      if segment.trim().is_empty() {
        continue;
      }

      let mut parts = segment.splitn(2, '=');
      let key = parts.next().unwrap_or_default().trim();

      match parts.next() {
        Some(v) => out.push(Directive::new(key, Some(v.trim()))),
        None => out.push(Directive::new(key, None)),
      }
    }
  }

  out
}
