#![cfg(unix)]

use predicates::prelude::*;
use test_support::{
  cmd_bin, failing_tool, fetching_tool, listing_tool, recorded_calls, tempdir, write_cmap_package,
};

#[test]
fn missing_package_without_get_is_advisory() {
  let td = tempdir();
  let stub = failing_tool(td.path(), "cannot find package \"example.com/nope\" in any of:");

  cmd_bin("genx")
    .args(["--package", "example.com/nope", "--go-bin"])
    .arg(&stub)
    .assert()
    .success()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("`example.com/nope` not found and `--get` isn't specified."));

  let calls = recorded_calls(td.path());
  assert_eq!(calls.len(), 1, "{calls:?}");
  assert!(calls[0].starts_with("list -f {{.Dir}} -tags"));
}

#[test]
fn toolchain_failure_exits_two() {
  let td = tempdir();
  let stub = failing_tool(td.path(), "go: malformed module path");

  cmd_bin("genx")
    .args(["--package", "::bad::", "--get", "--go-bin"])
    .arg(&stub)
    .assert()
    .code(2)
    .stderr(predicate::str::contains("malformed module path"));

  assert_eq!(recorded_calls(td.path()).len(), 1, "no fetch after a non-not-found failure");
}

#[test]
fn get_fetches_then_relists() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let stub = fetching_tool(td.path(), &pkg);
  let out = td.path().join("x.go");

  cmd_bin("genx")
    .args(["--package", "example.com/cmap", "--get", "-t", "KT=string,VT=int", "--go-bin"])
    .arg(&stub)
    .arg("-o")
    .arg(&out)
    .assert()
    .success();

  let calls = recorded_calls(td.path());
  assert_eq!(calls.len(), 3, "{calls:?}");
  assert!(calls[0].starts_with("list "));
  assert!(calls[1].starts_with("get -u -v -tags"));
  assert!(calls[2].starts_with("list "));
  assert!(calls.iter().all(|c| c.ends_with("example.com/cmap")));

  let got = std::fs::read_to_string(&out).unwrap();
  assert!(got.starts_with("// Code generated by genx; DO NOT EDIT.\n"));
  assert!(got.contains("func (c *CMap) Get(k string) int {"));
}

#[test]
fn same_toolchain_without_get_stops_after_one_list() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let stub = fetching_tool(td.path(), &pkg);

  cmd_bin("genx")
    .args(["--package", "example.com/cmap", "--go-bin"])
    .arg(&stub)
    .assert()
    .success()
    .stderr(predicate::str::contains("isn't specified"));

  assert_eq!(recorded_calls(td.path()).len(), 1);
}

#[test]
fn seed_resolves_under_seed_prefix_and_merges_to_stdout() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let stub = listing_tool(td.path(), &pkg);

  cmd_bin("genx")
    .args(["--seed", "cmap", "-n", "stringcmap", "-t", "KT=string,VT=int", "--go-bin"])
    .arg(&stub)
    .assert()
    .success()
    .stdout(predicate::str::starts_with("// Code generated by genx; DO NOT EDIT.\n\npackage stringcmap\n"))
    .stdout(predicate::str::contains("// file:").not());

  let calls = recorded_calls(td.path());
  assert_eq!(calls.len(), 1);
  assert!(calls[0].ends_with("github.com/OneOfOne/genx/seeds/cmap"), "{calls:?}");
}

#[test]
fn tags_and_go_flags_are_forwarded() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let stub = listing_tool(td.path(), &pkg);

  cmd_bin("genx")
    .args(["--package", "example.com/cmap", "-o"])
    .arg(td.path().join("gen"))
    .arg("--go-bin")
    .arg(&stub)
    .args(["--tags", "a b", "--goFlags", "-mod=mod"])
    .assert()
    .success();

  assert_eq!(recorded_calls(td.path()), vec!["list -f {{.Dir}} -tags a b -mod=mod example.com/cmap"]);
}

#[test]
fn remote_single_file_lists_its_directory() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let stub = listing_tool(td.path(), &pkg);

  cmd_bin("genx")
    .args(["-f", "example.com/cmap/b.go", "-t", "KT=string", "--go-bin"])
    .arg(&stub)
    .assert()
    .success()
    .stdout(predicate::str::starts_with("package cmap\n"))
    .stdout(predicate::str::contains("func (c *CMap) Get(k string) VT {"));

  let calls = recorded_calls(td.path());
  assert_eq!(calls.len(), 1);
  assert!(calls[0].ends_with(" example.com/cmap"), "{calls:?}");
}
