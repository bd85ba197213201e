//! Record-replay round-trip integration test.
//!
//! 1. Record a planning and a code-generation completion with `CassetteRecorder`.
//! 2. Replay the cassette through `ServiceContext::replaying()` and run the agent.
//! 3. Replay a second time into a fresh repository and assert identical trees.

use std::path::Path;

use codegen_agent::agent::{Agent, RunResult};
use codegen_agent::cassette::recorder::CassetteRecorder;
use codegen_agent::config::AgentConfig;
use codegen_agent::context::ServiceContext;
use codegen_agent::ports::llm::{CompletionRequest, CompletionResponse};

const PLAN: &str = "1. shapes.py computes areas\n2. app.py prints them";
const DRAFT: &str = r#"```json
{
  "app.py": "from geometry.shapes import area\nimport numpy as np\n\nprint(area(np.float64(2)))\n",
  "shapes.py": "import math\n\ndef area(r):\n    return math.pi * r * r\n"
}
```"#;

fn record_cassette(path: &Path) {
    let mut recorder = CassetteRecorder::new(path, "roundtrip-test");
    let request = |prompt: &str| CompletionRequest {
        model: "llama3.1".into(),
        prompt: prompt.into(),
        temperature: 0.2,
    };
    recorder.record(&request("plan prompt"), &Ok(CompletionResponse::text(PLAN)));
    recorder.record(&request("draft prompt"), &Ok(CompletionResponse::text(DRAFT)));
    let written = recorder.write().expect("recording should succeed");
    assert_eq!(written, path);
}

async fn replay_into(cassette: &Path, repo: &Path) -> RunResult {
    let ctx = ServiceContext::replaying(cassette).expect("cassette should load");
    let agent = Agent::new(&ctx, &AgentConfig::new(repo)).expect("builtin prompts");
    agent.create_program("print circle areas", "geometry/app.py").await
}

fn snapshot(repo: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = walkdir::WalkDir::new(repo)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(repo).unwrap().to_string_lossy().replace('\\', "/");
            (rel, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn record_then_replay_materializes_identical_trees() {
    let dir = tempfile::tempdir().unwrap();
    let cassette = dir.path().join("cassettes/roundtrip.cassette.yaml");
    record_cassette(&cassette);

    let first_repo = dir.path().join("first");
    let second_repo = dir.path().join("second");
    std::fs::create_dir_all(&first_repo).unwrap();
    std::fs::create_dir_all(&second_repo).unwrap();

    let first = replay_into(&cassette, &first_repo).await;
    let second = replay_into(&cassette, &second_repo).await;

    assert_eq!(
        first,
        RunResult::succeeded(
            "Wrote 2 files (entrypoint: geometry/app.py) and geometry/requirements.txt"
        )
    );
    assert_eq!(first, second);

    let tree = snapshot(&first_repo);
    assert_eq!(tree, snapshot(&second_repo));
    let paths: Vec<&str> = tree.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec![
        "geometry/__init__.py",
        "geometry/app.py",
        "geometry/requirements.txt",
        "geometry/shapes.py",
    ]);
    assert_eq!(tree[1].1, "from shapes import area\nimport numpy as np\n\nprint(area(np.float64(2)))\n");
    assert_eq!(tree[2].1, "numpy\n");
}

#[tokio::test]
async fn replay_past_end_of_cassette_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let cassette = dir.path().join("short.cassette.yaml");
    let mut recorder = CassetteRecorder::new(&cassette, "short");
    recorder.record(
        &CompletionRequest { model: "m".into(), prompt: "p".into(), temperature: 0.0 },
        &Ok(CompletionResponse::text(PLAN)),
    );
    recorder.write().unwrap();

    let result = replay_into(&cassette, dir.path()).await;

    assert!(!result.success);
    assert!(result.message.contains("exhausted"), "message: {}", result.message);
}
