use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_furlong")
}

fn unique_temp_path(name: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("furlong-{name}-{stamp}.{ext}"))
}

#[test]
fn missing_command_prints_usage() {
    let output = Command::new(bin()).output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: furlong"));
}

#[test]
fn simulate_command_emits_json_summary() {
    let output = Command::new(bin())
        .args(["simulate", "20", "7"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    assert_eq!(payload["summary"]["trials"].as_u64(), Some(20));
    assert_eq!(payload["seed"].as_u64(), Some(7));
    assert!(payload["summary"]["all"]["average_time"].is_number());
}

#[test]
fn simulate_table_mode_prints_a_header_row() {
    let output = Command::new(bin())
        .args(["simulate", "10", "3", "--table"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("trials\tseed\taverage_time"));
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn simulate_writes_a_frame_trace() {
    let path = unique_temp_path("trace", "csv");
    let output = Command::new(bin())
        .args([
            "simulate",
            "5",
            "9",
            "--trace",
            path.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let trace = fs::read_to_string(&path).expect("trace file should exist");
    assert!(trace.starts_with("frame,time_s,position_m"));
    assert!(trace.lines().count() > 100);

    let _ = fs::remove_file(path);
}

#[test]
fn simulate_loads_a_profile_file() {
    let path = unique_temp_path("profile", "yaml");
    fs::write(
        &path,
        concat!(
            "name: tester\nspeed: 1500\nstamina: 1400\npower: 1200\nguts: 1000\n",
            "wisdom: 1100\nmotivation: Best\nstyle: Sen\ndistance_fit: A\n",
            "surface_fit: A\nstyle_fit: A\npopularity: 3\ngate_number: 4\n",
            "skills: [deep-breaths]\n"
        ),
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args([
            "simulate",
            "5",
            "2",
            "--profile",
            path.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    let skills = payload["summary"]["skills"].as_array().expect("skill list");
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["id"].as_str(), Some("deep-breaths"));

    let _ = fs::remove_file(path);
}

#[test]
fn contribution_command_rejects_tiny_samples() {
    let output = Command::new(bin())
        .args(["contribution", "2"])
        .output()
        .expect("contribution should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at least 5 trials"));
}

#[test]
fn skills_command_lists_the_catalog() {
    let output = Command::new(bin())
        .arg("skills")
        .output()
        .expect("skills should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("id\tname\trarity\tsp_cost"));
    assert!(stdout.contains("deep-breaths\tDeep Breaths\tnormal\t130"));
}
