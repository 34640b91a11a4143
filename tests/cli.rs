//! End-to-end tests driving the built binary against real `.as` files.
//!
//! Grounded on the wider retrieval pack's `Luvion1-Fax` crate, the one
//! example whose `tests/` directory drives its own binary with
//! `assert_cmd`/`predicates` against files written through `tempfile` rather
//! than unit-testing its internals directly.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_source(dir: &std::path::Path, base: &str, contents: &str) -> String {
    let path = dir.join(format!("{base}.as"));
    fs::write(&path, contents).unwrap();
    dir.join(base).to_str().unwrap().to_string()
}

#[test]
fn assembles_a_simple_program_and_writes_object_file() {
    let dir = tempdir().unwrap();
    let base = write_source(&dir, "prog", "MAIN: mov #5, r1\n stop\n");

    Command::cargo_bin("assembler").unwrap().arg(&base).assert().success();

    let ob = fs::read_to_string(format!("{base}.ob")).unwrap();
    let mut lines = ob.lines();
    assert_eq!(lines.next().unwrap().trim(), "3 0");
    assert!(!format!("{base}.ent").as_str().parse::<std::path::PathBuf>().unwrap().exists());
}

#[test]
fn expands_macros_into_the_am_file() {
    let dir = tempdir().unwrap();
    let base = write_source(&dir, "withmacro", "mcro greet\nprn #1\nmcroend\ngreet\nstop\n");

    Command::cargo_bin("assembler").unwrap().arg(&base).assert().success();

    let am = fs::read_to_string(format!("{base}.am")).unwrap();
    assert_eq!(am.trim(), "prn #1\nstop");
}

#[test]
fn entry_and_extern_produce_their_tables() {
    let dir = tempdir().unwrap();
    let base = write_source(
        &dir,
        "linked",
        ". entry MAIN\n. extern W\nMAIN: mov W, r1\n stop\n",
    );

    Command::cargo_bin("assembler").unwrap().arg(&base).assert().success();

    let ent = fs::read_to_string(format!("{base}.ent")).unwrap();
    assert_eq!(ent, "MAIN 0000100\n");

    let ext = fs::read_to_string(format!("{base}.ext")).unwrap();
    assert_eq!(ext, "W 0000101\n");
}

#[test]
fn duplicate_label_fails_and_reports_the_error() {
    let dir = tempdir().unwrap();
    let base = write_source(&dir, "dup", "MAIN: stop\nMAIN: stop\n");

    // per-file failures still exit 0 (the CLI only exits 1 for a bare invocation
    // with no arguments); the file simply produces no `.ob` and an error report.
    Command::cargo_bin("assembler")
        .unwrap()
        .arg(&base)
        .assert()
        .success()
        .stderr(predicate::str::contains("DUPLICATE"));

    assert!(!format!("{base}.ob").as_str().parse::<std::path::PathBuf>().unwrap().exists());
}

#[test]
fn data_directive_with_stray_comma_is_rejected() {
    let dir = tempdir().unwrap();
    let base = write_source(&dir, "baddata", ".data 1, , 2\n");

    Command::cargo_bin("assembler")
        .unwrap()
        .arg(&base)
        .assert()
        .success()
        .stderr(predicate::str::contains("COMMA"));
}

#[test]
fn running_with_no_arguments_exits_with_usage() {
    Command::cargo_bin("assembler").unwrap().assert().failure().code(1);
}

#[test]
fn one_failing_file_does_not_stop_the_others() {
    let dir = tempdir().unwrap();
    let good = write_source(&dir, "good", "stop\n");
    let bad = write_source(&dir, "bad", "MAIN: stop\nMAIN: stop\n");

    Command::cargo_bin("assembler")
        .unwrap()
        .arg(&bad)
        .arg(&good)
        .assert()
        .success();

    assert!(format!("{good}.ob").as_str().parse::<std::path::PathBuf>().unwrap().exists());
}
