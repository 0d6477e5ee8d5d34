use anyhow::{Context, Result};
use context_engine::{EnhancedContext, GitHubEvent};
use std::path::Path;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a collected context serialized as JSON.
pub fn load_context(path: &Path) -> Result<EnhancedContext> {
    let raw = read(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse context JSON in {}", path.display()))
}

/// Load a raw webhook body. `event_name` is the `X-GitHub-Event` header value.
pub fn load_event(path: &Path, event_name: &str) -> Result<GitHubEvent> {
    let raw = read(path)?;
    GitHubEvent::from_webhook(event_name, &raw)
        .with_context(|| format!("Failed to decode {event_name} event in {}", path.display()))
}

/// Template text from `--template`, or from `--template-file` when given.
pub fn template_text(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (_, Some(path)) => read(path),
        (Some(text), None) => Ok(text.to_string()),
        (None, None) => anyhow::bail!("Either --template or --template-file is required"),
    }
}
