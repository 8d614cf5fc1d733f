use predicates::prelude::*;
use test_support::cmd_bin;

#[test]
fn gen_man_outputs_troff() {
  let out = cmd_bin("genx").arg("--gen-man").output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  // clap_mangen emits a roff manpage starting with .TH and mentions the binary name
  assert!(text.starts_with(".TH"), "expected troff man header");
  assert!(text.contains("genx"));
}

#[test]
fn help_lists_rule_flags_but_not_hidden_ones() {
  cmd_bin("genx")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--type"))
    .stdout(predicate::str::contains("--selector"))
    .stdout(predicate::str::contains("[aliases: --fld]").or(predicate::str::contains("[aliases: fld]")))
    .stdout(predicate::str::contains("--goFlags"))
    .stdout(predicate::str::contains("--go-bin").not())
    .stdout(predicate::str::contains("--gen-man").not());
}

#[test]
fn unknown_flag_is_a_usage_error() {
  cmd_bin("genx").arg("--bogus").assert().code(1).stderr(predicate::str::contains("--bogus"));
}
