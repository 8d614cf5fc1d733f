use predicates::prelude::*;
use test_support::{cmd_bin, tempdir, write_cmap_package, write_files};

// Local inputs never reach the toolchain; point it somewhere that cannot run.
const NO_GO: &str = "/nonexistent/go";

#[test]
fn package_to_go_file_is_merged() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let out = td.path().join("out/x.go");

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-t", "KT=string,VT=int", "--fn", "Dump", "--package"])
    .arg(&pkg)
    .arg("-o")
    .arg(&out)
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

  let got = std::fs::read_to_string(&out).unwrap();
  assert!(
    got.starts_with("// Code generated by genx; DO NOT EDIT.\n\npackage cmap\n\nimport \"sync\"\n\n// CMap guards a map with a lock.\n"),
    "{got}"
  );
  assert_eq!(got.matches("package ").count(), 1);
  assert!(got.contains("\tm   map[string]int\n"));
  assert!(got.contains("func (c *CMap) Get(k string) int {"));
  assert!(got.contains("var _ sync.Locker = &sync.Mutex{}"));
  assert!(!got.contains("type KT"));
  assert!(!got.contains("Dump"));
  assert!(!got.contains("\"fmt\""), "unused import is dropped");
  assert!(!got.contains("broken"), "_test.go files are skipped");
  assert!(!got.contains("func main"), "ignored files are skipped");
}

#[test]
fn package_to_directory_writes_each_file() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let out = td.path().join("gen");

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-n", "stringmap", "-t", "KT=string", "--pkg"])
    .arg(&pkg)
    .arg("-o")
    .arg(&out)
    .assert()
    .success();

  let mut names: Vec<String> =
    std::fs::read_dir(&out).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().to_string()).collect();
  names.sort();
  assert_eq!(names, vec!["a.go", "b.go"]);

  let a = std::fs::read_to_string(out.join("a.go")).unwrap();
  assert!(a.starts_with("// Package cmap is a tiny concurrent map seed.\npackage stringmap\n\nimport \"sync\"\n"), "{a}");
  let b = std::fs::read_to_string(out.join("b.go")).unwrap();
  assert!(b.contains("func (c *CMap) Get(k string) VT {"));
  assert!(b.contains("\"fmt\""), "per-file output keeps the original imports");
}

#[test]
fn package_to_stdout_streams_each_file() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "--package"])
    .arg(&pkg)
    .assert()
    .success()
    .stdout(predicate::str::starts_with("// file: a.go\n// Package cmap"))
    .stdout(predicate::str::contains("\n// file: b.go\npackage cmap\n"))
    .stdout(predicate::str::contains("Code generated").not());
}

#[test]
fn single_file_writes_rewritten_copy() {
  let td = tempdir();
  let pkg = write_cmap_package(td.path());
  let out = td.path().join("one.go");

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-t", "KT=string", "-s", "fmt.Println=log.Println", "-f"])
    .arg(pkg.join("b.go"))
    .arg("-o")
    .arg(&out)
    .assert()
    .success();

  let got = std::fs::read_to_string(&out).unwrap();
  assert!(got.starts_with("package cmap\n\nimport (\n\t\"fmt\"\n\t\"sync\"\n)\n"), "{got}");
  assert!(got.contains("func (c *CMap) Get(k string) VT {"));
  assert!(got.contains("\tlog.Println(c.m)\n"));
}

#[test]
fn stdin_input_goes_to_stdout() {
  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-f", "-", "-n", "q", "-t", "T=float64"])
    .write_stdin("package p\n\ntype T interface{}\n\nvar x T\n")
    .assert()
    .success()
    .stdout("package q\n\nvar x float64\n");
}

#[test]
fn parse_error_exits_one_with_snippet() {
  let td = tempdir();
  write_files(td.path(), &[("bad.go", "package p\n\nvar s = \"open\n")]);

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-f"])
    .arg(td.path().join("bad.go"))
    .assert()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("error parsing file ("))
    .stderr(predicate::str::contains(":3:9: string literal not terminated"))
    .stderr(predicate::str::contains("   3 | var s = \"open\n"));
}

#[test]
fn package_parse_error_names_the_package() {
  let td = tempdir();
  let dir = td.path().join("broken");
  write_files(&dir, &[("a.go", "package p\n\nfunc f() {\n")]);

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "--package"])
    .arg(&dir)
    .assert()
    .code(1)
    .stderr(predicate::str::contains(format!("error parsing package ({})", dir.display())))
    .stderr(predicate::str::contains("unclosed `{`"));
}

#[test]
fn write_failure_exits_one() {
  let td = tempdir();
  let blocker = td.path().join("file");
  std::fs::write(&blocker, "").unwrap();

  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-f", "-", "-o"])
    .arg(blocker.join("x.go"))
    .write_stdin("package p\n")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("writing "));
}

#[test]
fn no_input_exits_one() {
  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-t", "KV=string"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no input given"));
}

#[test]
fn verbose_logs_compiled_rules() {
  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-v", "-f", "-", "-t", "KV=string", "--fn", "Old"])
    .write_stdin("package p\n")
    .assert()
    .success()
    .stdout("package p\n")
    .stderr(predicate::str::contains("compiled rules"))
    .stderr(predicate::str::contains("type:KV"))
    .stderr(predicate::str::contains("func:Old"));
}

#[test]
fn quiet_by_default() {
  cmd_bin("genx")
    .args(["--go-bin", NO_GO, "-f", "-", "-t", "KV=string"])
    .write_stdin("package p\n")
    .assert()
    .success()
    .stderr(predicate::str::is_empty());
}
