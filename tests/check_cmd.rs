use assert_cmd::Command;
use predicates::prelude::*;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfm").unwrap();
    cmd.env("BFM_CONFIG", "/nonexistent/bfm.toml");
    cmd
}

#[test]
fn balanced_program_passes() {
    cargo_bin()
        .args(["check", "+[->+<]"])
        .assert()
        .success()
        .stdout("ok: 1 bracket pair(s)\n");
}

#[test]
fn count_mismatch_fails() {
    cargo_bin()
        .args(["check", ">++[-]]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 '[' vs 2 ']'"));
}

#[test]
fn misnesting_is_not_caught_by_the_count_check() {
    cargo_bin()
        .args(["check", ">++]["])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok: 1"));
}

#[test]
fn check_does_not_run_the_program() {
    cargo_bin()
        .arg("check")
        .write_stdin("+[]")
        .assert()
        .success();
}
