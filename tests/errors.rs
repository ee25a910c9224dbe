use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfm").unwrap();
    cmd.env("BFM_CONFIG", "/nonexistent/bfm.toml");
    cmd
}

#[test]
fn test_memory_overflow_below_zero() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg(">+++<<")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("memory overflow").and(predicate::str::contains("at instruction 5")))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_memory_overflow_past_end() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).args(["run", "--tape-size", "2", "+.>>."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("memory overflow"))
        // The byte emitted before the failure is still written.
        .stdout(vec![1u8]);
}

#[test]
fn test_unmatched_open_bracket() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg(">++[[-]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unbalanced brackets (2 '[' vs 1 ']')"));
}

#[test]
fn test_unmatched_close_bracket() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg(">++[-]]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unbalanced brackets"));
}

#[test]
fn test_misnested_brackets_fail_at_runtime() {
    cargo_bin()
        .timeout(Duration::from_secs(2)).arg("run").arg(">++][")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("']' has no matching '['").and(predicate::str::contains("at instruction 3")));
}

#[test]
fn test_zero_tape_size_is_a_usage_error() {
    cargo_bin()
        .args(["run", "--tape-size", "0", "+"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--tape-size"));
}

#[test]
fn test_missing_file() {
    cargo_bin()
        .args(["run", "--file", "/nonexistent/program.bf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read code file"));
}

#[test]
fn test_aborted_run_is_logged_at_default_level() {
    cargo_bin()
        .env_remove("BFM_LOG")
        .timeout(Duration::from_secs(2)).arg("run").arg(">+++<<")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("run aborted"));
}
