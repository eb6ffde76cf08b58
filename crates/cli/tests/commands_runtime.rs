use serde_json::Value;
use uuid::Uuid;

use signoff_cli::commands::{approve, migrate, seed, show};
use signoff_core::config::{ConfigOverrides, LoadOptions};

fn options_for(database_url: &str) -> LoadOptions {
    LoadOptions {
        config_path: Some("/nonexistent/signoff.toml".into()),
        overrides: ConfigOverrides {
            database_url: Some(database_url.to_string()),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }
}

fn file_database(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("signoff.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

#[test]
fn migrate_succeeds_against_a_fresh_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = migrate::run(options_for(&file_database(&dir)));

    assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "migrate");
    assert_eq!(payload["status"], "ok");
}

#[test]
fn seed_reports_the_created_approval() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = seed::run(options_for(&file_database(&dir)), 3);

    assert_eq!(result.exit_code, 0, "expected successful seed run: {}", result.output);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "seed");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["stepIds"].as_array().map(Vec::len), Some(3));
    assert!(payload["data"]["approvalId"].is_string());
}

#[test]
fn seed_rejects_zero_steps() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = seed::run(options_for(&file_database(&dir)), 0);

    assert_eq!(result.exit_code, 2);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_argument");
}

#[test]
fn approve_walks_a_seeded_approval_to_completion() {
    let dir = tempfile::tempdir().expect("temp dir");
    let database_url = file_database(&dir);

    let seeded = seed::run(options_for(&database_url), 2);
    assert_eq!(seeded.exit_code, 0, "seed should succeed: {}", seeded.output);
    let seeded = parse_payload(&seeded.output);

    let approval_id: Uuid =
        seeded["data"]["approvalId"].as_str().and_then(|raw| raw.parse().ok()).expect("approval id");
    let step_ids: Vec<Uuid> = seeded["data"]["stepIds"]
        .as_array()
        .expect("step ids")
        .iter()
        .map(|raw| raw.as_str().and_then(|raw| raw.parse().ok()).expect("step id"))
        .collect();
    let approver = Uuid::new_v4();

    let first = approve::run(
        options_for(&database_url),
        approval_id,
        step_ids[0],
        approver,
        "req-1".to_string(),
    );
    assert_eq!(first.exit_code, 0, "first approve should succeed: {}", first.output);
    let first = parse_payload(&first.output);
    assert_eq!(first["data"]["approvalStatus"], "IN_PROGRESS");
    assert_eq!(first["data"]["activeStepOrder"], 1);

    // Replaying the same action is a success, not an error.
    let replay = approve::run(
        options_for(&database_url),
        approval_id,
        step_ids[0],
        approver,
        "req-1".to_string(),
    );
    assert_eq!(replay.exit_code, 0, "replay should succeed: {}", replay.output);

    let second = approve::run(
        options_for(&database_url),
        approval_id,
        step_ids[1],
        approver,
        "req-2".to_string(),
    );
    assert_eq!(second.exit_code, 0, "second approve should succeed: {}", second.output);
    let second = parse_payload(&second.output);
    assert_eq!(second["data"]["approvalStatus"], "APPROVED");

    let shown = show::run(options_for(&database_url), approval_id);
    assert_eq!(shown.exit_code, 0, "show should succeed: {}", shown.output);
    let shown = parse_payload(&shown.output);
    assert_eq!(shown["data"]["snapshot"]["approvalStatus"], "APPROVED");
    assert_eq!(shown["data"]["steps"].as_array().map(Vec::len), Some(2));
}

#[test]
fn approve_rejects_a_blank_idempotency_key_without_touching_the_database() {
    let result = approve::run(
        options_for("sqlite://unused.db"),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        "   ".to_string(),
    );

    assert_eq!(result.exit_code, 2);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "invalid_argument");
    assert_eq!(payload["message"], "idempotencyKey is required");
}

#[test]
fn approve_reports_not_found_for_an_unknown_approval() {
    let dir = tempfile::tempdir().expect("temp dir");
    let database_url = file_database(&dir);
    assert_eq!(migrate::run(options_for(&database_url)).exit_code, 0);

    let result = approve::run(
        options_for(&database_url),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        "req-1".to_string(),
    );

    assert_eq!(result.exit_code, 5);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "not_found");
}
