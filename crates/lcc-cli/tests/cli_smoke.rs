use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const TWO_NODE_RUN: &str = "0,100,90,90,0.01,1000,10,0\n1,100,95,95,0.02,1200,10,1\n";

fn lcc_conf(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lcc-conf"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run lcc-conf")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn reads_default_file_name_from_working_directory() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("manual_results.csv"), TWO_NODE_RUN).expect("write");
    let output = lcc_conf(dir.path(), &[]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Detected node count: 2"));
    assert!(text.contains(" RESULT REPORT: Simulation Results"));
    assert!(text.contains("(single run)"));
}

#[test]
fn two_identical_runs_print_zero_intervals() {
    let dir = tempdir().expect("dir");
    let input = dir.path().join("runs.csv");
    fs::write(&input, format!("{TWO_NODE_RUN}{TWO_NODE_RUN}")).expect("write");
    let output = lcc_conf(
        dir.path(),
        &["--input", "runs.csv", "--scenario", "Repeat", "--per-run"],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains(" RESULT REPORT: Repeat"));
    assert!(text.contains("Stability (role changes)  : 0.5000 ± 0.0000"));
    assert!(text.contains("[0..2)"));
    assert!(text.contains("[2..4)"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("runs.csv"), TWO_NODE_RUN).expect("write");
    let output = lcc_conf(dir.path(), &["--input", "runs.csv", "--json"]);
    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).expect("json");
    assert_eq!(value["run_count"], 1);
    assert_eq!(value["entries"][0]["metric"], "Global_PDR");
    assert_eq!(value["entries"][0]["spread"]["kind"], "single_run");
    assert_eq!(value["runs"].as_array().map(Vec::len), Some(1));
}

#[test]
fn missing_input_exits_with_io_code() {
    let dir = tempdir().expect("dir");
    let output = lcc_conf(dir.path(), &["--input", "absent.csv"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: io error: failed to open result file"));
}

#[test]
fn malformed_row_exits_with_format_code() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("runs.csv"), "0,100,90\n").expect("write");
    let output = lcc_conf(dir.path(), &["--input", "runs.csv"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}

#[test]
fn empty_input_exits_with_degenerate_code() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("runs.csv"), "").expect("write");
    let output = lcc_conf(dir.path(), &["--input", "runs.csv"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn uneven_runs_exit_with_partition_code_when_required() {
    let dir = tempdir().expect("dir");
    fs::write(
        dir.path().join("runs.csv"),
        format!("{TWO_NODE_RUN}0,100,90,90,0.01,1000,10,0\n"),
    )
    .expect("write");
    let relaxed = lcc_conf(dir.path(), &["--input", "runs.csv"]);
    assert!(relaxed.status.success());
    let strict = lcc_conf(dir.path(), &["--input", "runs.csv", "--require-uniform-runs"]);
    assert_eq!(strict.status.code(), Some(5));
}

#[test]
fn config_file_supplies_settings() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("runs.csv"), TWO_NODE_RUN).expect("write");
    fs::write(
        dir.path().join("analysis.yaml"),
        "input_path: runs.csv\nscenario_label: From Yaml\n",
    )
    .expect("write config");
    let output = lcc_conf(dir.path(), &["--config", "analysis.yaml"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(" RESULT REPORT: From Yaml"));

    fs::write(dir.path().join("bad.yaml"), "confidence_level: [1, 2]\n").expect("write bad");
    let bad = lcc_conf(dir.path(), &["--config", "bad.yaml"]);
    assert_eq!(bad.status.code(), Some(6));
}

#[test]
fn rust_log_does_not_override_flags() {
    let dir = tempdir().expect("dir");
    fs::write(dir.path().join("runs.csv"), TWO_NODE_RUN).expect("write");
    let output = Command::new(env!("CARGO_BIN_EXE_lcc-conf"))
        .current_dir(dir.path())
        .env("RUST_LOG", "debug")
        .args(["--input", "runs.csv", "-q"])
        .output()
        .expect("run lcc-conf");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("DEBUG"), "unexpected debug output: {stderr}");
    assert!(!stderr.contains("INFO"), "unexpected info output: {stderr}");
}

#[test]
fn overflowing_counters_exit_with_format_code() {
    let dir = tempdir().expect("dir");
    fs::write(
        dir.path().join("runs.csv"),
        "0,18446744073709551615,1,0,0.01,10,1,0\n1,18446744073709551615,1,0,0.01,10,1,0\n",
    )
    .expect("write");
    let output = lcc_conf(dir.path(), &["--input", "runs.csv"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}
