//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

fn run_agent(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_codegen-agent");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("CODEGEN_AGENT_MODEL")
        .env_remove("CODEGEN_AGENT_TEMPERATURE")
        .env_remove("OLLAMA_HOST")
        .output()
        .expect("failed to run codegen-agent binary")
}

fn write_cassette(path: &Path, responses: &[&str]) {
    let mut yaml = String::from("name: cli-test\nrecorded_at: 2025-03-15T14:30:00Z\ninteractions:\n");
    for (seq, text) in responses.iter().enumerate() {
        yaml.push_str(&format!(
            "- seq: {seq}\n  prompt: p\n  response:\n    text: {}\n",
            serde_json::to_string(text).unwrap()
        ));
    }
    std::fs::write(path, yaml).unwrap();
}

#[test]
fn help_lists_subcommands() {
    let output = run_agent(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("create"));
    assert!(stdout.contains("requirements"));
    assert!(stdout.contains("prompts"));
}

#[test]
fn create_help_shows_usage() {
    let output = run_agent(&["create", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("MODULE_PATH"));
    assert!(stdout.contains("--replay"));
}

#[test]
fn prompts_subcommand_lists_variants() {
    let output = run_agent(&["prompts"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("planning: concise, default"));
    assert!(stdout.contains("code_generation: default, strict_json"));
}

#[test]
fn requirements_subcommand_writes_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.py"), "import requests\nfrom bs4 import BeautifulSoup\nimport json\n")
        .unwrap();

    let repo = dir.path().to_str().unwrap();
    let output = run_agent(&["requirements", "requirements.txt", "--repo", repo]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let manifest = std::fs::read_to_string(dir.path().join("requirements.txt")).unwrap();
    assert_eq!(manifest, "beautifulsoup4\nrequests\n");
    assert_eq!(String::from_utf8_lossy(&output.stdout), manifest);
}

#[test]
fn create_replays_cassette_into_repo() {
    let dir = tempfile::tempdir().unwrap();
    let cassette = dir.path().join("session.cassette.yaml");
    write_cassette(&cassette, &[
        "1. board\n2. app",
        r#"{"app.py": "from chess.board import Board\nBoard()\n", "board.py": "class Board:\n    pass\n"}"#,
    ]);
    let repo = dir.path().join("repo");

    let output = run_agent(&[
        "create",
        "a chess board",
        "chess/app.py",
        "--repo",
        repo.to_str().unwrap(),
        "--replay",
        cassette.to_str().unwrap(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Wrote 2 files (entrypoint: chess/app.py) and chess/requirements.txt"));
    assert!(repo.join("chess/__init__.py").is_file());
    assert_eq!(
        std::fs::read_to_string(repo.join("chess/app.py")).unwrap(),
        "from board import Board\nBoard()\n"
    );
}

#[test]
fn create_reports_too_few_files_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cassette = dir.path().join("session.cassette.yaml");
    write_cassette(&cassette, &["1. app", r#"{"app.py": "print(1)"}"#]);

    let output = run_agent(&[
        "create",
        "tiny",
        "proj/app.py",
        "--repo",
        dir.path().join("repo").to_str().unwrap(),
        "--replay",
        cassette.to_str().unwrap(),
    ]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Expected a multi-file project with >=2 Python files. Got 1"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_agent(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
