use assert_cmd::Command;
use overlay_calib::{CalibrationMode, CalibrationRecord, Placement, Session};
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn two_corner_record() -> CalibrationRecord {
    let mut s = Session::new(CalibrationMode::TwoCorner);
    s.add_point_pair(0.0, 0.0, 51.10, -2.53).expect("tl");
    s.add_point_pair(1.0, 1.0, 51.08, -2.50).expect("br");
    s.finalize("uploads/farm.png").expect("finalize")
}

fn write_record(dir: &Path, record: &CalibrationRecord) -> std::path::PathBuf {
    let path = dir.join("record.json");
    record.write_json(&path).expect("write record");
    path
}

fn cli() -> Command {
    Command::cargo_bin("overlay-calib").expect("binary")
}

#[test]
fn check_reports_finalizable_record() {
    let dir = tempdir().expect("tempdir");
    let path = write_record(dir.path(), &two_corner_record());

    cli()
        .args(["check", "--record"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ok: two-corner calibration, 2 points, axis-aligned placement",
        ))
        .stdout(predicate::str::contains("stale").not());
}

#[test]
fn check_explains_collinear_points() {
    let dir = tempdir().expect("tempdir");
    let mut record = two_corner_record();
    record.mode = CalibrationMode::MultiPoint;
    let mut json: serde_json::Value =
        serde_json::from_str(&record.to_json_string().expect("json")).expect("parse");
    let mut third = json["gcps"][0].clone();
    third["id"] = 7.into();
    third["image"]["x"] = 0.5.into();
    third["image"]["y"] = 0.5.into();
    json["gcps"].as_array_mut().expect("array").push(third);
    let path = dir.path().join("record.json");
    std::fs::write(&path, json.to_string()).expect("write");

    cli()
        .args(["check", "--record"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("collinear"));
}

#[test]
fn solve_refreshes_stale_placement() {
    let dir = tempdir().expect("tempdir");
    let mut record = two_corner_record();
    let fresh = record.placement;
    record.placement = Placement::AxisAligned(overlay_calib::GeoBounds {
        north: 0.0,
        south: -1.0,
        east: 1.0,
        west: 0.0,
    });
    let path = write_record(dir.path(), &record);
    let out = dir.path().join("solved.json");

    cli()
        .args(["check", "--record"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("stale"));

    cli()
        .args(["solve", "--record"])
        .arg(&path)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let solved = CalibrationRecord::load_json(&out).expect("solved record");
    assert_eq!(solved.placement, fresh);
    assert_eq!(solved.image_ref, "uploads/farm.png");
}

#[test]
fn project_maps_image_center() {
    let dir = tempdir().expect("tempdir");
    let path = write_record(dir.path(), &two_corner_record());

    let output = cli()
        .args(["project", "--x", "0.5", "--y", "0.5", "--record"])
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let geo: overlay_calib::GeoPoint =
        serde_json::from_slice(&output.stdout).expect("geo point json");
    assert!((geo.lat - 51.09).abs() < 1e-9);
    assert!((geo.lng + 2.515).abs() < 1e-9);
}

#[test]
fn project_rejects_out_of_range_position() {
    let dir = tempdir().expect("tempdir");
    let path = write_record(dir.path(), &two_corner_record());

    cli()
        .args(["project", "--x", "1.5", "--y", "0.5", "--record"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unit square"));
}

#[test]
fn trace_reports_derivation_spans_as_json() {
    let dir = tempdir().expect("tempdir");
    let path = write_record(dir.path(), &two_corner_record());

    cli()
        .env("RUST_LOG", "debug")
        .args(["--trace", "--json", "check", "--record"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: two-corner calibration"))
        .stderr(predicate::str::contains("derive_placement"))
        .stderr(predicate::str::contains("\"level\":\"DEBUG\""));
}

#[test]
fn json_output_requires_trace() {
    let dir = tempdir().expect("tempdir");
    let path = write_record(dir.path(), &two_corner_record());

    cli()
        .args(["--json", "check", "--record"])
        .arg(&path)
        .assert()
        .failure();
}
