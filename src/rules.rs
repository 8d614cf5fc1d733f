// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Compile flattened directives for the four categories into one namespaced rule table
// role: model/rules
// inputs: Directive lists for type, selector, field and func
// outputs: RuleTable keyed by "<namespace>:<name>" with Rename/Delete values
// invariants:
// - no empty names; later directives for the same key overwrite earlier ones
// - an absent, empty or `-` value compiles to Delete
// - ordered() is sorted by namespaced key
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::directive::Directive;

/// Rule category; the label prefixes compiled keys.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub enum Namespace {
  Type,
  Selector,
  Field,
  Func,
}

impl Namespace {
  pub fn label(self) -> &'static str {
    match self {
      Namespace::Type => "type",
      Namespace::Selector => "selector",
      Namespace::Field => "field",
      Namespace::Func => "func",
    }
  }

  pub fn key(self, name: &str) -> String {
    format!("{}:{}", self.label(), name)
  }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Replacement {
  Rename(String),
  Delete,
}

impl Replacement {
  pub const DELETE_SENTINEL: &'static str = "-";

  fn from_value(value: Option<&str>) -> Self {
    match value {
      Some(v) if !v.is_empty() && v != Self::DELETE_SENTINEL => Replacement::Rename(v.to_string()),
      _ => Replacement::Delete,
    }
  }
}

impl fmt::Display for Replacement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Replacement::Rename(name) => f.write_str(name),
      Replacement::Delete => f.write_str(Self::DELETE_SENTINEL),
    }
  }
}

// Serialized in display form: the rename target or `-`.
impl Serialize for Replacement {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
  rules: BTreeMap<String, Replacement>,
}

/// Directives grouped by the flag they came from.
#[derive(Debug, Default)]
pub struct DirectiveSet {
  pub types: Vec<Directive>,
  pub selectors: Vec<Directive>,
  pub fields: Vec<Directive>,
  pub funcs: Vec<Directive>,
}

impl DirectiveSet {
  fn by_namespace(&self) -> [(Namespace, &[Directive]); 4] {
    [
      (Namespace::Type, &self.types),
      (Namespace::Selector, &self.selectors),
      (Namespace::Field, &self.fields),
      (Namespace::Func, &self.funcs),
    ]
  }
}

impl RuleTable {
  pub fn insert(&mut self, ns: Namespace, name: &str, value: Option<&str>) {
    let name = name.trim();
    if name.is_empty() {
      return;
    }
    self.rules.insert(ns.key(name), Replacement::from_value(value.map(str::trim)));
  }

  pub fn get(&self, ns: Namespace, name: &str) -> Option<&Replacement> {
    self.rules.get(&ns.key(name))
  }

  pub fn is_deleted(&self, ns: Namespace, name: &str) -> bool {
    matches!(self.get(ns, name), Some(Replacement::Delete))
  }

  pub fn renamed(&self, ns: Namespace, name: &str) -> Option<&str> {
    match self.get(ns, name) {
      Some(Replacement::Rename(to)) => Some(to.as_str()),
      _ => None,
    }
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Entries sorted by namespaced key, for logs and diagnostics.
  pub fn ordered(&self) -> impl Iterator<Item = (&str, &Replacement)> {
    self.rules.iter().map(|(k, v)| (k.as_str(), v))
  }
}

pub fn compile(set: &DirectiveSet) -> RuleTable {
  let mut table = RuleTable::default();
  for (ns, directives) in set.by_namespace() {
    for d in directives {
      table.insert(ns, &d.key, d.value.as_deref());
    }
  }
  table
}
