#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use envscan::parse_str;
use tempfile::TempDir;

#[test]
fn run_loads_default_dotenv_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(dir.path(), ".env", "ENVSCAN_CLI_DEFAULT=from_default\n");

    let output = run_envscan(
        dir.path(),
        &["run", "--", "printenv", "ENVSCAN_CLI_DEFAULT"],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "from_default");
}

#[test]
fn run_resolves_references_across_selected_files() {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(dir.path(), ".env.base", "ENVSCAN_CLI_HOST=example.com\n");
    write_file(
        dir.path(),
        ".env.local",
        "ENVSCAN_CLI_URL=\"https://${ENVSCAN_CLI_HOST}/api\"\n",
    );

    let output = run_envscan(
        dir.path(),
        &[
            "run",
            "-f",
            ".env.base,.env.local",
            "--",
            "printenv",
            "ENVSCAN_CLI_URL",
        ],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "https://example.com/api");
}

#[test]
fn run_override_flag_controls_existing_environment_precedence() {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(dir.path(), ".env", "ENVSCAN_CLI_OVERRIDE=from_file\n");

    let without_override = run_envscan(
        dir.path(),
        &["run", "--", "printenv", "ENVSCAN_CLI_OVERRIDE"],
        Some(("ENVSCAN_CLI_OVERRIDE", "from_env")),
    );
    assert_success(&without_override);
    assert_eq!(stdout_trimmed(&without_override), "from_env");

    let with_override = run_envscan(
        dir.path(),
        &["run", "-o", "--", "printenv", "ENVSCAN_CLI_OVERRIDE"],
        Some(("ENVSCAN_CLI_OVERRIDE", "from_env")),
    );
    assert_success(&with_override);
    assert_eq!(stdout_trimmed(&with_override), "from_file");
}

#[test]
fn run_fills_empty_inherited_values_without_override() {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(dir.path(), ".env", "ENVSCAN_CLI_EMPTY=from_file\n");

    let output = run_envscan(
        dir.path(),
        &["run", "--", "printenv", "ENVSCAN_CLI_EMPTY"],
        Some(("ENVSCAN_CLI_EMPTY", "")),
    );
    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "from_file");
}

#[test]
fn run_fails_when_selected_file_is_missing() {
    let dir = TempDir::new().expect("failed to create temp dir");

    let output = run_envscan(
        dir.path(),
        &["run", "-f", "missing.env", "--", "printenv", "HOME"],
        None,
    );

    assert!(!output.status.success(), "expected missing file to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error reading file [missing.env]"),
        "expected path in stderr: {stderr:?}"
    );
}

#[test]
fn run_reports_parse_errors_with_file_and_position() {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(dir.path(), ".env-file", "KEY_3 value\n");

    let output = run_envscan(
        dir.path(),
        &["run", "-f", ".env-file", "--", "printenv", "KEY_3"],
        None,
    );

    assert!(!output.status.success(), "expected parse failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error parsing file [.env-file], expected \"=\", found \"v\", line 1:7"),
        "unexpected stderr: {stderr:?}"
    );
}

#[test]
fn print_outputs_sorted_lines_that_scan_back() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = "B=\"quoted \\\"value\\\" # kept\"\nA=plain # comment\nC=\\$LITERAL-$A\n";
    write_file(dir.path(), ".env", content);

    let output = run_envscan(dir.path(), &["print"], None);

    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let keys: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_once('=').map(|(key, _)| key))
        .collect();
    assert_eq!(keys, ["A", "B", "C"]);
    assert_eq!(
        parse_str(&stdout).expect("printed output should parse"),
        parse_str(content).expect("fixture should parse")
    );
}

#[test]
fn unknown_subcommand_fails() {
    let dir = TempDir::new().expect("failed to create temp dir");

    let output = run_envscan(dir.path(), &["explode"], None);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown subcommand `explode`"));
}

fn run_envscan(dir: &Path, args: &[&str], env_pair: Option<(&str, &str)>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_envscan"));
    command.current_dir(dir).args(args);
    if let Some((key, value)) = env_pair {
        command.env(key, value);
    }
    command.output().expect("failed to run envscan binary")
}

fn stdout_trimmed(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success: stdout={:?}, stderr={:?}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("failed to write fixture file");
}
