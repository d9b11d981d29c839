use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::gemini_reply;

const SECRET_VARS: &[&str] = &[
    "GOOGLE_API_KEY",
    "SUPABASE_URL",
    "PUBLIC_SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
    "SUPABASE_KEY",
    "PUBLIC_SUPABASE_ANON_KEY",
    "MOCKPREP_MODEL",
    "MOCKPREP_API_BASE",
    "MOCKPREP_TIMEOUT_SECONDS",
    "MOCKPREP_MAX_ATTEMPTS",
    "MOCKPREP_STORE_BACKEND",
    "MOCKPREP_SQLITE_PATH",
    "MOCKPREP_TABLE",
    "RUST_LOG",
];

/// Binary with a private SQLite store and no ambient credentials
fn mockprep(tmp: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mockprep").unwrap();
    for var in SECRET_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--config")
        .arg(tmp.path().join("absent.yaml"))
        .arg("--backend")
        .arg("sqlite")
        .arg("--sqlite-path")
        .arg(tmp.path().join("sessions.db"));
    cmd
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("mockprep").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("models"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("session"));
}

#[test]
fn test_evaluate_requires_question() {
    let tmp = tempfile::tempdir().unwrap();
    mockprep(&tmp)
        .args(["evaluate", "--answer", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--question"));
}

#[test]
fn test_invalid_timeout_is_rejected() {
    let (_dir, config_path) =
        common::temp_config_file("generation:\n  timeout_seconds: 30\n");
    let mut cmd = Command::cargo_bin("mockprep").unwrap();
    cmd.arg("--config").arg(config_path).args(["session", "list", "-u", "u1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must be less than 10"));
}

#[test]
fn test_models_without_key_fails() {
    let tmp = tempfile::tempdir().unwrap();
    mockprep(&tmp)
        .arg("models")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_evaluate_without_key_reports_unavailable_and_saves() {
    let tmp = tempfile::tempdir().unwrap();

    let output = mockprep(&tmp)
        .args(["evaluate", "-q", "What is a trie?", "-a", "A tree"])
        .args(["--session", "s1", "--topic", "Tries", "--user", "u1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let evaluation = stdout_json(&output);
    assert_eq!(evaluation["score"], 0.0);
    assert_eq!(evaluation["feedback"], "AI Service Unavailable");

    let output = mockprep(&tmp)
        .args(["session", "show", "s1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let state = stdout_json(&output);
    assert_eq!(state["difficulty"], "Easy");
    assert_eq!(state["items"][0]["topic"], "Tries");
    assert_eq!(
        state["items"][1],
        json!({ "meta": "difficulty", "value": "Easy" })
    );
}

#[test]
fn test_save_set_difficulty_and_list() {
    let tmp = tempfile::tempdir().unwrap();
    let items_path = tmp.path().join("items.json");
    std::fs::write(
        &items_path,
        r#"[{"topic": "Graphs", "question": "BFS?"}, {"topic": "Graphs", "question": "DFS?"}]"#,
    )
    .unwrap();

    mockprep(&tmp)
        .args(["session", "save", "s1", "-d", "Medium", "-u", "u1", "-i"])
        .arg(&items_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved session s1"));

    mockprep(&tmp)
        .args(["session", "set-difficulty", "s1", "Hard"])
        .assert()
        .success();

    let output = mockprep(&tmp)
        .args(["session", "list", "-u", "u1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let sessions = stdout_json(&output);
    assert_eq!(sessions[0]["session_id"], "s1");
    assert_eq!(sessions[0]["topic"], "Graphs");
    assert_eq!(sessions[0]["difficulty"], "Hard");
    assert_eq!(sessions[0]["questions_count"], 2);
}

#[test]
fn test_set_difficulty_on_unknown_session_fails() {
    let tmp = tempfile::tempdir().unwrap();
    mockprep(&tmp)
        .args(["session", "set-difficulty", "ghost", "Hard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_show_unknown_session() {
    let tmp = tempfile::tempdir().unwrap();
    mockprep(&tmp)
        .args(["session", "show", "ghost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session ghost not found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_evaluate_against_mock_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "```json\n{\"score\": 6, \"feedback\": \"Partly right\", \"correct_solution\": \"Prefix tree\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let output = mockprep(&tmp)
        .env("GOOGLE_API_KEY", common::TEST_KEY)
        .env("MOCKPREP_API_BASE", server.uri())
        .args(["evaluate", "-q", "What is a trie?", "-a", "A tree", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let evaluation = stdout_json(&output);
    assert_eq!(evaluation["score"], 6.0);
    assert_eq!(evaluation["correct_solution"], "Prefix tree");
}
