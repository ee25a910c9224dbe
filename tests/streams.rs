use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfm").unwrap();
    cmd.env("BFM_CONFIG", "/nonexistent/bfm.toml").env_remove("BFM_LOG");
    cmd
}

fn small_valid_bf() -> &'static str { "+++." }
fn infinite_bf() -> &'static str { "+[]" }

#[test]
fn test_stdout_only_for_program_output() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .arg("run")
        .write_stdin(small_valid_bf())
        .assert()
        .success()
        .stdout(vec![3u8])
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_stderr_only_for_abort_messages() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .env("BFM_TIMEOUT_MS", "100")
        .arg("run")
        .write_stdin(infinite_bf())
        .assert()
        .stderr(predicate::str::contains("Execution aborted"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn test_verbose_logs_go_to_stderr() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["-vv", "run", "+++."])
        .assert()
        .success()
        .stdout(vec![3u8])
        .stderr(predicate::str::contains("run finished"));
}

#[test]
fn test_verbose_logs_report_debug_mode() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["-vv", "run", "--debug", "+."])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved machine settings")
            .and(predicate::str::contains("debug_mode=true"))
            .and(predicate::str::contains("starting run")));
}
