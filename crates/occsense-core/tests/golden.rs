use std::fs;
use std::path::{Path, PathBuf};

use occsense_core::{BlockKind, decode};
use serde_json::Value;

fn golden_dir(dir: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(dir)
}

fn load_expected(dir: &str) -> Value {
    let expected_path = golden_dir(dir).join("expected_response.json");
    let expected_json =
        fs::read_to_string(&expected_path).expect("read expected_response.json");
    serde_json::from_str(&expected_json).expect("parse expected response")
}

fn load_input(dir: &str) -> Vec<u8> {
    fs::read(golden_dir(dir).join("input.bin")).expect("read input.bin")
}

fn run_golden(dir: &str) {
    let frame = load_input(dir);
    let expected = load_expected(dir);
    let actual = decode(&frame, None).expect("decode frame");
    let actual_value = serde_json::to_value(actual).expect("serialize actual");
    assert_eq!(actual_value, expected, "golden mismatch in {dir}");
}

#[test]
fn golden_sample() {
    run_golden("tests/golden/sample");
}

#[test]
fn golden_mixed_strides() {
    run_golden("tests/golden/mixed_strides");
}

#[test]
fn golden_sample_matches_builtin_fixture() {
    let frame = load_input("tests/golden/sample");
    assert_eq!(frame, occsense_core::fixtures::SAMPLE_FRAME);
}

#[test]
fn golden_mixed_strides_resolves_later_temperature_block() {
    let frame = load_input("tests/golden/mixed_strides");
    let response = decode(&frame, None).expect("decode frame");
    assert_eq!(response.block_index(BlockKind::Temperature), Some(3));
    let temps = response.temperature_block().expect("temperature block");
    assert_eq!(temps.records().len(), 1);
    assert_eq!(temps.sensor(0).map(|r| r.sensor_id()), Some(0x0200));
    assert!(response.checksum().expect("checksum").is_valid());
}
