//! Integration tests for CLI commands.

use serde_json::{json, Value};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_fedevent"))
        .args(args)
        .output()
        .expect("failed to run fedevent");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn draft() -> Value {
    json!({
        "sender": "@alice:example.org",
        "room_id": "!abc:example.org",
        "type": "m.room.message",
        "depth": 1,
        "content": {"body": "hello", "msgtype": "m.text"},
    })
}

fn build_event(dir: &TempDir, version: &str) -> String {
    let draft_path = write_file(dir, "draft.json", &draft().to_string());
    let (success, stdout, stderr) = run_cli(&[
        "build",
        "--room-version",
        version,
        "--origin",
        "example.org",
        "--key-id",
        "ed25519:auto",
        "--seed",
        SEED,
        &draft_path,
    ]);
    assert!(success, "build failed: {stderr}");
    stdout.trim().to_string()
}

fn public_key() -> String {
    let (success, stdout, _) = run_cli(&["pubkey", "--seed", SEED]);
    assert!(success);
    stdout.trim().to_string()
}

#[test]
fn test_canonicalize_sorts_keys() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.json", r#"{ "b": 1, "a": [true, null] }"#);
    let (success, stdout, _) = run_cli(&["canonicalize", &input]);
    assert!(success);
    assert_eq!(stdout.trim(), r#"{"a":[true,null],"b":1}"#);
}

#[test]
fn test_canonicalize_rejects_floats() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.json", r#"{"a": 1.5}"#);
    let (success, _, stderr) = run_cli(&["canonicalize", &input]);
    assert!(!success);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_redact_strips_content() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "event.json",
        r#"{"type":"m.room.member","content":{"membership":"join","displayname":"A"},"unsigned":{"age":1}}"#,
    );
    let (success, stdout, _) = run_cli(&["redact", &input]);
    assert!(success);
    assert_eq!(
        stdout.trim(),
        r#"{"content":{"membership":"join"},"type":"m.room.member"}"#
    );
}

#[test]
fn test_versions_table_and_json() {
    let (success, stdout, _) = run_cli(&["versions"]);
    assert!(success);
    assert!(stdout.contains("VERSION"));
    assert!(stdout.contains("HashedUrlSafeBase64"));

    let (success, stdout, _) = run_cli(&["versions", "--json"]);
    assert!(success);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["1"]["state_res"], "V1");
    assert_eq!(parsed["5"]["strict_validity_checking"], true);
    assert_eq!(parsed.as_object().unwrap().len(), 5);
}

#[test]
fn test_build_then_inspect() {
    let dir = TempDir::new().unwrap();
    let event = build_event(&dir, "5");
    let parsed: Value = serde_json::from_str(&event).unwrap();
    assert_eq!(parsed["origin"], "example.org");
    assert!(parsed["signatures"]["example.org"]["ed25519:auto"].is_string());
    assert!(parsed.get("event_id").is_none());

    let event_path = write_file(&dir, "event.json", &event);
    let (success, stdout, _) = run_cli(&["inspect", "--room-version", "5", "--json", &event_path]);
    assert!(success);
    let summary: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["redacted"], false);
    assert_eq!(summary["sender"], "@alice:example.org");
    assert!(summary["event_id"].as_str().unwrap().starts_with('$'));

    let (success, stdout, _) = run_cli(&["inspect", "--room-version", "5", &event_path]);
    assert!(success);
    assert!(stdout.contains("reference_sha256:"));
}

#[test]
fn test_inspect_redacts_tampered_event() {
    let dir = TempDir::new().unwrap();
    let mut event: Value = serde_json::from_str(&build_event(&dir, "1")).unwrap();
    event["content"]["body"] = json!("forged");
    let event_path = write_file(&dir, "event.json", &event.to_string());

    let (success, stdout, _) = run_cli(&["inspect", "--room-version", "1", "--json", &event_path]);
    assert!(success);
    let summary: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["redacted"], true);
}

#[test]
fn test_verify_accepts_and_rejects() {
    let dir = TempDir::new().unwrap();
    let event = build_event(&dir, "4");
    let event_path = write_file(&dir, "event.json", &event);
    let key = public_key();

    let (success, stdout, _) = run_cli(&[
        "verify", "--room-version", "4", "--server", "example.org", "--key-id", "ed25519:auto",
        "--public-key", &key, &event_path,
    ]);
    assert!(success);
    assert!(stdout.starts_with("OK $"));

    let mut forged: Value = serde_json::from_str(&event).unwrap();
    forged["depth"] = json!(99);
    let forged_path = write_file(&dir, "forged.json", &forged.to_string());
    let (success, _, stderr) = run_cli(&[
        "verify", "--room-version", "4", "--server", "example.org", "--key-id", "ed25519:auto",
        "--public-key", &key, &forged_path,
    ]);
    assert!(!success);
    assert!(stderr.contains("Verification failed"));
}

#[test]
fn test_unknown_room_version_fails() {
    let dir = TempDir::new().unwrap();
    let draft_path = write_file(&dir, "draft.json", &draft().to_string());
    let (success, _, stderr) = run_cli(&[
        "build", "--room-version", "42", "--origin", "example.org", "--key-id", "ed25519:auto",
        "--seed", SEED, &draft_path,
    ]);
    assert!(!success);
    assert!(stderr.contains("unsupported room version"));
}

#[test]
fn test_bad_seed_and_missing_file() {
    let (success, _, stderr) = run_cli(&["pubkey", "--seed", "abcd"]);
    assert!(!success);
    assert!(stderr.contains("Invalid seed"));

    let missing = Path::new("/nonexistent/fedevent/input.json");
    let (success, _, stderr) = run_cli(&["canonicalize", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read file"));
}
