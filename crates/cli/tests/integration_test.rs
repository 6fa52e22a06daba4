use std::path::Path;
use std::process::Command;

fn write_fixture(dir: &Path) -> (String, String) {
    let transactions = dir.join("transactions.csv");
    let schedule = dir.join("schedule.csv");

    let mut rows = String::from("timestamp,volume_usd,fee_usd\n");
    for day in 1..=10 {
        let fee = if day <= 5 { 100 } else { 250 };
        rows.push_str(&format!("2025-06-{day:02}T12:00:00Z,100000,{fee}\n"));
    }
    std::fs::write(&transactions, rows).expect("Failed to write transactions");
    std::fs::write(
        &schedule,
        "start_date,end_date,intended_fee_bps\n\
         2025-06-01,2025-06-05,10\n\
         2025-06-06,2025-06-10,25\n",
    )
    .expect("Failed to write schedule");

    (
        transactions.to_string_lossy().into_owned(),
        schedule.to_string_lossy().into_owned(),
    )
}

#[test]
fn test_detect_prints_period_table() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let (transactions, schedule) = write_fixture(dir.path());
    let config = dir.path().join("missing.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_fee-analysis"))
        .args(["--config", config.to_str().unwrap()])
        .args(["detect", "--transactions", &transactions, "--schedule", &schedule])
        .output()
        .expect("Failed to run fee-analysis");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,2025-06-01,2025-06-05,5,10.0000,10.0000"));
    assert!(lines[2].contains("aligned,increase"));
}

#[test]
fn test_analyze_emits_json_report() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let (transactions, schedule) = write_fixture(dir.path());
    let config = dir.path().join("missing.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_fee-analysis"))
        .args(["--config", config.to_str().unwrap()])
        .args(["analyze", "-t", &transactions, "-s", &schedule, "--seed", "7"])
        .output()
        .expect("Failed to run fee-analysis");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["periods"].as_array().unwrap().len(), 2);
    assert_eq!(report["transitions"].as_array().unwrap().len(), 1);
    assert!(report["elasticity"].is_null());
}

#[test]
fn test_missing_input_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_fee-analysis"))
        .args(["detect", "--transactions", "no/such/file.csv"])
        .output()
        .expect("Failed to run fee-analysis");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no/such/file.csv"));
}
