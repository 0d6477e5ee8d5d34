//! File loading and configuration layering, exercised through real files.

use context_engine::{ContextType, EngineConfig, GitHubEvent, Mode};
use prompt_agent::commands::{self, PromptRequest};
use prompt_agent::config::{self, CliOverrides};
use prompt_agent::input;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const CONTEXT_JSON: &str = r#"{
    "context_type": "issue",
    "priority": "high",
    "timestamp": "2024-05-01T10:00:00Z",
    "comments": [
        {"id": 2, "author": "bob", "body": "Still broken", "created_at": "2024-05-01T12:00:00Z"},
        {"id": 1, "author": "alice", "body": "Repro attached", "created_at": "2024-05-01T11:00:00Z"}
    ],
    "metadata": {
        "repository": "acme/widgets",
        "issue_number": 42,
        "title": "Crash on start",
        "author": "alice",
        "trigger_user": "carol",
        "sprint": 7
    }
}"#;

const ISSUE_EVENT_JSON: &str = r#"{
    "action": "opened",
    "issue": {
        "number": 42,
        "title": "Crash on start",
        "body": "Stack trace below",
        "user": {"login": "alice"},
        "labels": [{"name": "bug"}, {"name": "p1"}],
        "state": "open"
    },
    "repository": {"full_name": "acme/widgets", "default_branch": "main"},
    "sender": {"login": "alice"}
}"#;

#[test]
fn context_file_round_trips_into_prompt() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "ctx.json", CONTEXT_JSON);

    let ctx = input::load_context(&path).unwrap();
    assert_eq!(ctx.context_type, ContextType::Issue);
    assert_eq!(ctx.comments.len(), 2);
    assert_eq!(ctx.metadata.extra_string("sprint").as_deref(), Some("7"));

    let config = EngineConfig::default();
    let request = PromptRequest {
        mode: Some(Mode::Fix),
        args: "please fix".into(),
        assemble: false,
    };
    let text = commands::prompt(&config, &ctx, &request).unwrap();
    assert!(text.contains("Issue #42: Crash on start"));
    assert!(text.contains("@carol: please fix"));
    assert!(text.contains("acme/widgets"));
}

#[test]
fn malformed_context_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.json", "{ not json");
    let err = input::load_context(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = input::load_context(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn event_file_decodes_by_name() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "event.json", ISSUE_EVENT_JSON);

    let event = input::load_event(&path, "issues").unwrap();
    assert!(matches!(event, GitHubEvent::Issue(_)));
    assert_eq!(event.action(), "opened");

    let err = input::load_event(&path, "deployment").unwrap_err();
    assert!(format!("{err:#}").contains("unsupported webhook event"));
}

#[test]
fn render_and_validate_from_files() {
    let dir = TempDir::new().unwrap();
    let event_path = write(&dir, "event.json", ISSUE_EVENT_JSON);
    let template_path = write(
        &dir,
        "template.txt",
        "{{.GITHUB_ISSUE_TITLE}} [{{labelList .GITHUB_LABELS}}]",
    );

    let event = input::load_event(&event_path, "issues").unwrap();
    let template = input::template_text(None, Some(&template_path)).unwrap();
    let text = commands::render(&EngineConfig::default(), &event, None, &template).unwrap();
    assert_eq!(text, "Crash on start [`bug`, `p1`]");

    let report = commands::validate(&event).unwrap();
    assert!(report.contains("issues"));
}

#[test]
fn template_text_requires_a_source() {
    let inline = input::template_text(Some("$GITHUB_REPOSITORY"), None).unwrap();
    assert_eq!(inline, "$GITHUB_REPOSITORY");
    assert!(input::template_text(None, None).is_err());
}

#[test]
fn config_file_then_flags() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "prompt-agent.toml",
        r#"
max_tokens = 8000
default_mode = "review"

[templates]
general = "Hello from $REPOSITORY"
"#,
    );

    let config = config::load(Some(&path), &CliOverrides::default()).unwrap();
    assert_eq!(config.resolved_max_tokens(), 8000);
    assert_eq!(config.default_mode, Mode::Review);

    let overridden = config::load(
        Some(&path),
        &CliOverrides {
            max_tokens: Some(3000),
            default_mode: Some(Mode::General),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(overridden.resolved_max_tokens(), 3000);

    let ctx = input::load_context(&write(&dir, "ctx.json", CONTEXT_JSON)).unwrap();
    let text = commands::prompt(&overridden, &ctx, &PromptRequest::default()).unwrap();
    assert_eq!(text, "Hello from acme/widgets");
}

#[test]
fn bad_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.toml", "max_tokens = \"many\"");
    let err = config::load(Some(&path), &CliOverrides::default()).unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"));
}
