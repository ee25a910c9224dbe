// Verifies that --debug prints a step-by-step table instead of program output.
use predicates::prelude::*;

#[test]
fn debug_flag_prints_table() {
    let mut cmd = assert_cmd::Command::cargo_bin("bfm")
        .expect("failed to locate bfm binary");

    cmd.env("BFM_CONFIG", "/nonexistent/bfm.toml")
        .args(["run", "--debug", ">"]) // single instruction: move pointer right
        .assert()
        .success()
        .stdout(predicates::str::contains("STEP | IP")
            .and(predicates::str::contains("Moved pointer head to index 1"))
        );
}

#[test]
fn debug_flag_suppresses_program_output() {
    let mut cmd = assert_cmd::Command::cargo_bin("bfm")
        .expect("failed to locate bfm binary");

    cmd.env("BFM_CONFIG", "/nonexistent/bfm.toml")
        .args(["run", "-d", "+++."])
        .assert()
        .success()
        .stdout(predicates::str::contains("Output byte 3 (suppressed in debug)")
            .and(predicates::str::contains("\u{3}").not())
        );
}
