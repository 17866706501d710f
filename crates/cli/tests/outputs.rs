use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("boundary-tests")
        .join(format!("{}-{}", prefix, nonce));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("foreign routine demo harness"));
    assert!(stdout.contains("--idle-steps"));
}

#[test]
fn test_run_default_prints_number() {
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["--idle-steps", "1"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "number: 2000\r\n");
}

#[test]
fn test_run_overrides() {
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["--number", "-5", "--buffer", "abcd", "--idle-steps", "3"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "number: -10\r\nbuffer: dcba\r\n");
}

#[test]
fn test_run_with_manifest() {
    let dir = temp_dir("manifest");
    let manifest = dir.join("demo.yaml");
    std::fs::write(
        &manifest,
        r#"
name: "padded"
number: 7
buffer:
  contents: "abcdef"
  capacity: "32"
  declared_size: 3
report:
  number_format: "n=%d\n"
  buffer_format: "b=%s\n"
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["--system", manifest.to_str().unwrap(), "--idle-steps", "1"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "n=14\nb=cba\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_run_missing_manifest() {
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["--system", "non_existent_manifest.yaml", "--idle-steps", "1"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_run_rejects_oversized_declaration() {
    let dir = temp_dir("oversized");
    let manifest = dir.join("demo.yaml");
    std::fs::write(
        &manifest,
        r#"
name: "oversized"
buffer:
  contents: "abcd"
  declared_size: 8
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["--system", manifest.to_str().unwrap(), "--idle-steps", "1"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    // Nothing reaches the serial channel when the buffer is rejected
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("exceeds buffer capacity"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_test_mode_outputs() {
    let dir = temp_dir("test-mode");
    std::fs::write(
        dir.join("demo.yaml"),
        r#"
name: "reverse"
buffer:
  contents: "abcd"
"#,
    )
    .unwrap();

    // Relative system path resolves against the script's directory
    let script_path = dir.join("script.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
inputs:
  system: "demo.yaml"
limits:
  idle_steps: 10
assertions:
  - output_contains: "number: 2000"
  - buffer_equals: "dcba"
  - expected_state: idle
"#,
    )
    .unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args([
            "test",
            "--script",
            script_path.to_str().unwrap(),
            "--no-serial-stdout",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let result_content = std::fs::read_to_string(output_dir.join("result.json")).unwrap();
    let result: serde_json::Value = serde_json::from_str(&result_content).unwrap();

    assert_eq!(result["status"], "pass");
    assert_eq!(result["final_state"], "idle");
    assert_eq!(result["result"], 2000);
    assert_eq!(result["buffer"], "dcba");
    assert_eq!(result["idle_steps"], 10);
    assert_eq!(result["output"], "number: 2000\r\nbuffer: dcba\r\n");
    assert_eq!(result["manifest_hash"].as_str().unwrap().len(), 64);
    assert!(result["config"]["system"]
        .as_str()
        .unwrap()
        .ends_with("demo.yaml"));
    assert_eq!(result["assertions"].as_array().unwrap().len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_test_mode_echoes_serial() {
    let dir = temp_dir("echo");
    let script_path = dir.join("script.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
limits:
  idle_steps: 1
assertions:
  - output_contains: "2000"
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["test", "--script", script_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "number: 2000\r\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_test_mode_failing_assertion() {
    let dir = temp_dir("failing");
    let script_path = dir.join("script.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
limits:
  idle_steps: 1
assertions:
  - output_contains: "number: 2001"
  - expected_state: idle
"#,
    )
    .unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args([
            "test",
            "--script",
            script_path.to_str().unwrap(),
            "--no-serial-stdout",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());

    let result_content = std::fs::read_to_string(output_dir.join("result.json")).unwrap();
    let result: serde_json::Value = serde_json::from_str(&result_content).unwrap();
    assert_eq!(result["status"], "fail");
    assert_eq!(result["assertions"][0]["passed"], false);
    assert_eq!(result["assertions"][1]["passed"], true);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_test_mode_rejects_bad_schema() {
    let dir = temp_dir("schema");
    let script_path = dir.join("script.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "9.9"
limits:
  idle_steps: 1
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_boundary"))
        .args(["test", "--script", script_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Unsupported schema_version"));

    let _ = std::fs::remove_dir_all(&dir);
}
