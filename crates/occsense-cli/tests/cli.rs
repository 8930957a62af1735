use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("occsense"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn sample_frame() -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join("sample")
        .join("input.bin")
}

#[test]
fn help_lists_frame_subcommands() {
    cmd()
        .arg("frame")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("attr")).and(contains("sample")));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");
    let report = temp.path().join("report.json");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn non_bin_input_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("frame.txt");
    std::fs::write(&input, b"SENSOR").expect("write input");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("unsupported input format"));
}

#[test]
fn stdout_outputs_json() {
    let assert = cmd()
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["report_version"], 1);
    assert_eq!(value["tool"]["name"], "occsense");
    assert_eq!(value["input"]["bytes"], 171);
    assert_eq!(value["response"]["header"]["block_count"], 4);
}

#[test]
fn report_is_written_to_file() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));
    let text = std::fs::read_to_string(&report).expect("read report");
    let value: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["response"]["temperature_index"], 0);
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn report_path_equal_to_input_is_refused() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("frame.bin");
    std::fs::copy(sample_frame(), &input).expect("copy frame");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("report path must differ from input"));
}

#[test]
fn bad_marker_reports_decode_error() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("frame.bin");
    let mut frame = std::fs::read(sample_frame()).expect("read frame");
    frame[42] = b'X';
    std::fs::write(&input, frame).expect("write frame");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("frame decode failed").and(contains("not an OCC sensor poll response")));
}

#[test]
fn glob_with_single_match_resolves() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(sample_frame(), temp.path().join("only.bin")).expect("copy frame");
    let pattern = temp.path().join("*.bin");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
}

#[test]
fn glob_with_multiple_matches_fails() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(sample_frame(), temp.path().join("a.bin")).expect("copy frame");
    std::fs::copy(sample_frame(), temp.path().join("b.bin")).expect("copy frame");
    let pattern = temp.path().join("*.bin");

    cmd()
        .arg("frame")
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("multiple files match pattern"));
}

#[test]
fn attr_prints_values_in_order() {
    cmd()
        .arg("frame")
        .arg("attr")
        .arg(sample_frame())
        .arg("temp1_label")
        .arg("freq2_label")
        .assert()
        .success()
        .stdout("sensor id: 106\nsensor id: 120\n");
}

#[test]
fn attr_all_dumps_blocks() {
    cmd()
        .arg("frame")
        .arg("attr")
        .arg(sample_frame())
        .arg("all")
        .assert()
        .success()
        .stdout(contains("num_of_sensor_blocks: 4").and(contains("sensor_type: CAPS")));
}

#[test]
fn attr_unknown_name_fails_with_hint() {
    cmd()
        .arg("frame")
        .arg("attr")
        .arg(sample_frame())
        .arg("volt1_input")
        .assert()
        .code(2)
        .stderr(contains("unknown attribute name: volt1_input").and(contains("hint:")));
}

#[test]
fn attr_missing_sensor_is_unavailable() {
    cmd()
        .arg("frame")
        .arg("attr")
        .arg(sample_frame())
        .arg("power1_input")
        .assert()
        .code(2)
        .stderr(contains("not available"));
}

#[test]
fn sample_writes_reference_frame() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("sample.bin");

    cmd()
        .arg("frame")
        .arg("sample")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    let written = std::fs::read(&output).expect("read sample");
    let expected = std::fs::read(sample_frame()).expect("read golden");
    assert_eq!(written, expected);

    cmd()
        .arg("frame")
        .arg("sample")
        .arg("-o")
        .arg(&output)
        .assert()
        .code(2)
        .stderr(contains("--force"));
}

#[test]
fn json_logging_goes_to_stderr() {
    cmd()
        .arg("--log-level")
        .arg("debug")
        .arg("--log-format")
        .arg("json")
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("--stdout")
        .assert()
        .success()
        .stderr(contains("\"level\""));
}

#[test]
fn log_filter_directives_print_targets() {
    cmd()
        .arg("--log-filter")
        .arg("occsense_core=debug")
        .arg("--log-format")
        .arg("json")
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("--stdout")
        .assert()
        .success()
        .stderr(contains("\"target\"").and(contains("occsense_core")));
}

#[test]
fn malformed_log_filter_is_rejected() {
    cmd()
        .env("OCCSENSE_LOG", "occsense_core=loud")
        .arg("frame")
        .arg("decode")
        .arg(sample_frame())
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("invalid log filter").and(contains("hint:")));
}
