//! Subcommand bodies. Each returns the text `main` prints.

use anyhow::{Context, Result};
use context_engine::template::validate_template_data;
use context_engine::{
    build_template_data_with_validation, EngineConfig, EnhancedContext, GitHubEvent, Mode,
    PromptBuilder,
};
use tracing::{info, warn};

/// Options for [`prompt`].
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    /// Falls back to the configured default mode.
    pub mode: Option<Mode>,
    pub args: String,
    /// Emit the sectioned prompt (role, context, task, output, constraints)
    /// instead of the mode template.
    pub assemble: bool,
}

/// Render the prompt for a collected context.
pub fn prompt(
    config: &EngineConfig,
    ctx: &EnhancedContext,
    request: &PromptRequest,
) -> Result<String> {
    let mode = request.mode.unwrap_or(config.default_mode);
    info!(%mode, context_type = %ctx.context_type, assemble = request.assemble, "Building prompt");

    if request.assemble {
        let builder = PromptBuilder::for_context_with(&config.formatter(), ctx, mode);
        let builder = if request.args.trim().is_empty() {
            builder
        } else {
            builder.with_instruction(request.args.clone())
        };
        return Ok(builder.build());
    }

    let renderer = config.renderer()?;
    let text = renderer
        .render_mode(ctx, mode, &request.args)
        .with_context(|| format!("Failed to render {mode} template"))?;
    Ok(text)
}

/// Render free-form `template` against an event, optionally enriched with
/// files and comments from a collected context.
pub fn render(
    config: &EngineConfig,
    event: &GitHubEvent,
    ctx: Option<&EnhancedContext>,
    template: &str,
) -> Result<String> {
    let mut data = build_template_data_with_validation(Some(event))?;
    if let Some(ctx) = ctx {
        data.enrich_from_context(ctx);
    }

    let renderer = config.renderer()?;
    if config.strict_templates {
        let text = renderer
            .render_free_form_strict(template, &data)
            .context("Strict template rendering failed")?;
        return Ok(text);
    }

    let outcome = renderer.render_free_form(template, &data);
    if let Some(err) = &outcome.fallback {
        warn!(strategy = %outcome.strategy, error = %err, "Template rendered with fallback");
    }
    info!(strategy = %outcome.strategy, chars = outcome.text.len(), "Template rendered");
    Ok(outcome.text)
}

/// Check an event for required template fields.
///
/// Returns a one-line report; errors when fields are missing.
pub fn validate(event: &GitHubEvent) -> Result<String> {
    let data = build_template_data_with_validation(Some(event))?;
    let missing = validate_template_data(&data);
    if !missing.is_empty() {
        anyhow::bail!(
            "{} event is missing required fields: {}",
            data.event_type,
            missing.join(", ")
        );
    }
    Ok(format!("{} event has all required fields", data.event_type))
}
