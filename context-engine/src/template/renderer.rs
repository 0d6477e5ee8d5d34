//! Dual-strategy template rendering
//!
//! Mode templates are rendered from the `$NAME` catalog. Free-form content
//! (user command text) may use either `$GITHUB_*` placeholders or structured
//! `{{.GITHUB_*}}` actions; structured rendering is attempted first and a
//! failure falls back to literal substitution, recorded in [`RenderOutcome`].

use crate::formatter::ContextFormatter;
use crate::model::EnhancedContext;
use crate::prompt::catalog;
use crate::template::data::GitHubTemplateData;
use crate::template::error::{TemplateError, TemplateResult};
use crate::template::literal;
use crate::template::mode::Mode;
use crate::template::structured::{Clock, StructuredEngine, Value};
use crate::template::variables::{VariableBuilder, CATALOG_VARIABLES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Body of a `{{ ... }}` action, trim markers excluded.
static STRUCTURED_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{-?([^}]*?)-?\}\}").expect("STRUCTURED_ACTION_RE regex should compile")
});

/// Which strategy produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    Structured,
    Literal,
    /// No placeholders were detected; the text went through the structured
    /// engine unchanged, or was returned as-is when that failed.
    Passthrough,
}

impl std::fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Literal => write!(f, "literal"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Result of free-form rendering. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub text: String,
    pub strategy: RenderStrategy,
    /// Why structured rendering was abandoned, if it was.
    pub fallback: Option<TemplateError>,
}

impl RenderOutcome {
    fn new(text: String, strategy: RenderStrategy) -> Self {
        Self {
            text,
            strategy,
            fallback: None,
        }
    }

    fn with_fallback(mut self, err: TemplateError) -> Self {
        self.fallback = Some(err);
        self
    }

    pub fn fell_back(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Whether `text` contains structured syntax: an action that reads data
/// through dot (`.NAME`, a bare `.`) or the root (`$`, `$.NAME`).
pub fn has_structured_syntax(text: &str) -> bool {
    STRUCTURED_ACTION_RE
        .captures_iter(text)
        .any(|caps| caps.get(1).is_some_and(|body| reads_data(body.as_str())))
}

fn reads_data(body: &str) -> bool {
    if body.contains('$') {
        return true;
    }
    let chars: Vec<char> = body.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| {
        if c != '.' {
            return false;
        }
        match chars.get(i + 1) {
            Some(next) if next.is_ascii_alphabetic() || *next == '_' => true,
            // a lone dot, not a decimal point
            None => true,
            Some(next) => {
                matches!(next, ' ' | '\t' | '\n' | ')' | '|')
                    && !i
                        .checked_sub(1)
                        .and_then(|p| chars.get(p))
                        .is_some_and(char::is_ascii_digit)
            }
        }
    })
}

/// Built-in template for `mode`.
pub fn select_template(mode: Mode) -> &'static str {
    catalog::mode_template(mode)
}

/// Renders mode templates and free-form content.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    engine: StructuredEngine,
    variables: VariableBuilder,
    overrides: BTreeMap<Mode, String>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(mut self, formatter: ContextFormatter) -> Self {
        self.variables = self.variables.with_formatter(formatter);
        self
    }

    pub fn with_default_base_branch(mut self, branch: impl Into<String>) -> Self {
        self.variables = self.variables.with_default_base_branch(branch);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.engine = StructuredEngine::with_clock(clock);
        self
    }

    /// Replace the built-in template for `mode`. Overrides may use either
    /// placeholder syntax over the `$NAME` catalog.
    pub fn with_override(mut self, mode: Mode, template: impl Into<String>) -> Self {
        self.overrides.insert(mode, template.into());
        self
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<Mode, String>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn formatter(&self) -> &ContextFormatter {
        self.variables.formatter()
    }

    /// Template used for `mode`: the override if any, else the built-in.
    pub fn select_template(&self, mode: Mode) -> &str {
        self.overrides
            .get(&mode)
            .map(String::as_str)
            .unwrap_or_else(|| select_template(mode))
    }

    /// Render the template for `mode` against `ctx` trimmed to the
    /// formatter's budget.
    pub fn render_mode(
        &self,
        ctx: &EnhancedContext,
        mode: Mode,
        args: &str,
    ) -> TemplateResult<String> {
        let template = self.select_template(mode);
        if template.trim().is_empty() {
            return Err(TemplateError::validation(format!("template for mode {mode} is empty")));
        }

        if !ctx.code_matches_type() {
            warn!(
                context_type = %ctx.context_type,
                has_code = ctx.code.is_some(),
                "Code context does not match context type, rendering what is present"
            );
        }

        let trimmed = self.formatter().trim(ctx);
        let vars = self.variables.build(&trimmed, mode, args);

        let text = if has_structured_syntax(template) {
            self.engine.render(template, &catalog_value(&vars))?
        } else {
            literal::substitute(template, &vars)
        };

        let leftover: Vec<&str> = literal::placeholders(&text)
            .into_iter()
            .filter(|name| CATALOG_VARIABLES.contains(name))
            .collect();
        if !leftover.is_empty() {
            warn!(
                %mode,
                leftover = ?leftover,
                "Rendered prompt still contains catalog placeholders"
            );
        }
        debug!(%mode, tokens = trimmed.token_count, chars = text.len(), "Rendered mode template");
        Ok(text)
    }

    /// Render user content, never failing. See [`RenderOutcome`].
    pub fn render_free_form(&self, content: &str, data: &GitHubTemplateData) -> RenderOutcome {
        let has_structured = has_structured_syntax(content);
        let has_literal = literal::has_github_placeholder(content);

        if has_structured {
            return match self.engine.render(content, &data.to_value()) {
                Ok(text) => RenderOutcome::new(text, RenderStrategy::Structured),
                Err(err) => {
                    warn!(
                        kind = %err.kind,
                        variable = ?err.variable,
                        cause = %err.cause,
                        "Structured render failed, falling back to literal substitution"
                    );
                    let text = literal::substitute(content, &data.to_variables());
                    RenderOutcome::new(text, RenderStrategy::Literal).with_fallback(err)
                }
            };
        }

        if has_literal {
            debug!("Rendering free-form content with literal substitution");
            let text = literal::substitute(content, &data.to_variables());
            return RenderOutcome::new(text, RenderStrategy::Literal);
        }

        match self.engine.render(content, &data.to_value()) {
            Ok(text) => RenderOutcome::new(text, RenderStrategy::Passthrough),
            Err(err) => {
                debug!(cause = %err.cause, "Pass-through render failed, returning input unchanged");
                RenderOutcome::new(content.to_string(), RenderStrategy::Passthrough)
                    .with_fallback(err)
            }
        }
    }

    /// Like [`Self::render_free_form`] but structured failures are returned
    /// instead of falling back.
    pub fn render_free_form_strict(
        &self,
        content: &str,
        data: &GitHubTemplateData,
    ) -> TemplateResult<String> {
        if !has_structured_syntax(content) && literal::has_github_placeholder(content) {
            return Ok(literal::substitute(content, &data.to_variables()));
        }
        self.engine.render(content, &data.to_value())
    }
}

/// Structured root for mode templates. Flags become booleans so
/// `{{if .IS_PR}}` is false for issues.
fn catalog_value(vars: &BTreeMap<String, String>) -> Value {
    Value::Map(
        vars.iter()
            .map(|(name, text)| {
                let value = match name.as_str() {
                    "IS_PR" => Value::Bool(text == "true"),
                    _ => Value::Str(text.clone()),
                };
                (name.clone(), value)
            })
            .collect(),
    )
}

/// [`TemplateRenderer::render_free_form`] with default settings.
pub fn render_free_form(content: &str, data: &GitHubTemplateData) -> RenderOutcome {
    TemplateRenderer::default().render_free_form(content, data)
}

/// [`TemplateRenderer::render_free_form_strict`] with default settings.
pub fn render_free_form_strict(content: &str, data: &GitHubTemplateData) -> TemplateResult<String> {
    TemplateRenderer::default().render_free_form_strict(content, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeContext, ContextMetadata, ContextType, FileChange, FileStatus};
    use crate::template::error::TemplateErrorKind;
    use chrono::Utc;

    fn data() -> GitHubTemplateData {
        GitHubTemplateData {
            repository: "acme/widgets".into(),
            event_type: "issues".into(),
            trigger_user: "issue_author".into(),
            is_issue: true,
            issue_number: "123".into(),
            issue_title: "Test Issue".into(),
            issue_author: "issue_author".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_detection() {
        assert!(has_structured_syntax("x {{.GITHUB_REPOSITORY}} y"));
        assert!(has_structured_syntax("{{- if .GITHUB_IS_PR }}pr{{end}}"));
        assert!(!has_structured_syntax("$GITHUB_REPOSITORY"));
        assert!(!has_structured_syntax("{{ \"plain\" }}"));
        assert!(has_structured_syntax("{{.}}"));
        assert!(has_structured_syntax("{{- upper . -}}"));
        assert!(has_structured_syntax("{{range $.GITHUB_LABELS}}x{{end}}"));
        assert!(has_structured_syntax("{{ $ }}"));
        assert!(!has_structured_syntax("{{ nope }}"));
    }

    #[test]
    fn test_bare_dot_renders_structured() {
        let out = render_free_form("{{with .GITHUB_ISSUE_TITLE}}{{.}}{{end}}", &data());
        assert_eq!(out.strategy, RenderStrategy::Structured);
        assert_eq!(out.text, "Test Issue");

        let labelled = GitHubTemplateData {
            labels: vec!["bug".into(), "p1".into()],
            ..data()
        };
        let out = render_free_form("{{range $.GITHUB_LABELS}}[{{.}}]{{end}}", &labelled);
        assert_eq!(out.strategy, RenderStrategy::Structured);
        assert_eq!(out.text, "[bug][p1]");
    }

    #[test]
    fn test_literal_only() {
        let out = render_free_form(
            "Issue #$GITHUB_ISSUE_NUMBER: $GITHUB_ISSUE_TITLE by $GITHUB_ISSUE_AUTHOR",
            &data(),
        );
        assert_eq!(out.text, "Issue #123: Test Issue by issue_author");
        assert_eq!(out.strategy, RenderStrategy::Literal);
        assert!(!out.fell_back());
    }

    #[test]
    fn test_structured_matches_literal() {
        let structured = render_free_form(
            "Issue #{{.GITHUB_ISSUE_NUMBER}}: {{.GITHUB_ISSUE_TITLE}}",
            &data(),
        );
        let literal = render_free_form("Issue #$GITHUB_ISSUE_NUMBER: $GITHUB_ISSUE_TITLE", &data());
        assert_eq!(structured.strategy, RenderStrategy::Structured);
        assert_eq!(structured.text, literal.text);
    }

    #[test]
    fn test_structured_failure_falls_back_to_literal() {
        let out = render_free_form("{{.GITHUB_NOPE}} $GITHUB_ISSUE_TITLE", &data());
        assert_eq!(out.strategy, RenderStrategy::Literal);
        assert_eq!(out.text, "{{.GITHUB_NOPE}} Test Issue");
        let err = out.fallback.unwrap();
        assert_eq!(err.kind, TemplateErrorKind::Execute);
        assert_eq!(err.variable.as_deref(), Some("GITHUB_NOPE"));
    }

    #[test]
    fn test_parse_failure_falls_back() {
        let out = render_free_form("{{if .GITHUB_IS_PR}}unclosed", &data());
        assert_eq!(out.text, "{{if .GITHUB_IS_PR}}unclosed");
        assert_eq!(out.fallback.unwrap().kind, TemplateErrorKind::Parse);
    }

    #[test]
    fn test_passthrough() {
        let out = render_free_form("just fix it", &data());
        assert_eq!(out.text, "just fix it");
        assert_eq!(out.strategy, RenderStrategy::Passthrough);
        assert!(!out.fell_back());

        let out = render_free_form("odd {{ nope }} text", &data());
        assert_eq!(out.text, "odd {{ nope }} text");
        assert!(out.fell_back());
    }

    #[test]
    fn test_strict_propagates() {
        let err = render_free_form_strict("{{.GITHUB_NOPE}}", &data()).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::Execute);
        assert_eq!(
            render_free_form_strict("by $GITHUB_ISSUE_AUTHOR", &data()).unwrap(),
            "by issue_author"
        );
    }

    #[test]
    fn test_render_mode_leaves_no_catalog_placeholders() {
        let ctx = EnhancedContext::new(ContextType::Issue, Utc::now()).with_metadata(
            ContextMetadata {
                repository: Some("acme/widgets".into()),
                issue_number: Some(5),
                title: Some("Crash".into()),
                ..Default::default()
            },
        );
        let renderer = TemplateRenderer::new();
        for mode in Mode::ALL {
            let text = renderer.render_mode(&ctx, mode, "extra words").unwrap();
            for name in literal::placeholders(&text) {
                assert!(!CATALOG_VARIABLES.contains(&name), "{mode}: ${name} left");
            }
            assert!(text.contains("acme/widgets"), "{mode}");
        }
    }

    #[test]
    fn test_render_mode_with_structured_override() {
        let ctx = EnhancedContext::new(ContextType::Issue, Utc::now()).with_metadata(
            ContextMetadata {
                title: Some("Crash".into()),
                ..Default::default()
            },
        );
        let renderer = TemplateRenderer::new()
            .with_override(Mode::Fix, "Fix: {{.ISSUE_TITLE | upper}} ({{.ARGS}})");
        assert_eq!(
            renderer.render_mode(&ctx, Mode::Fix, "now").unwrap(),
            "Fix: CRASH (now)"
        );

        let broken = TemplateRenderer::new().with_override(Mode::Fix, "{{.NOPE}}");
        let err = broken.render_mode(&ctx, Mode::Fix, "").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::Execute);

        let empty = TemplateRenderer::new().with_override(Mode::Code, "  ");
        assert_eq!(
            empty.render_mode(&ctx, Mode::Code, "").unwrap_err().kind,
            TemplateErrorKind::Validation
        );
    }

    #[test]
    fn test_structured_override_sees_is_pr_as_flag() {
        let renderer = TemplateRenderer::new()
            .with_override(Mode::Fix, "{{if .IS_PR}}pr{{else}}issue{{end}} {{.IS_PR}}");

        let issue = EnhancedContext::new(ContextType::Issue, Utc::now());
        assert_eq!(renderer.render_mode(&issue, Mode::Fix, "").unwrap(), "issue false");

        let pr = EnhancedContext::new(ContextType::PullRequest, Utc::now()).with_metadata(
            ContextMetadata {
                pr_number: Some(8),
                ..Default::default()
            },
        );
        assert_eq!(renderer.render_mode(&pr, Mode::Fix, "").unwrap(), "pr true");
    }

    #[test]
    fn test_render_mode_tolerates_code_type_mismatch() {
        let issue_with_code =
            EnhancedContext::new(ContextType::Issue, Utc::now()).with_code(CodeContext::new(
                "acme/widgets",
                "main",
                "fix/crash",
                vec![FileChange::new("src/lib.rs", FileStatus::Modified, 2, 1)],
            ));
        assert!(!issue_with_code.code_matches_type());
        let renderer =
            TemplateRenderer::new().with_override(Mode::Code, "$CHANGED_FILES on $HEAD_BRANCH");
        assert_eq!(
            renderer.render_mode(&issue_with_code, Mode::Code, "").unwrap(),
            "src/lib.rs (modified, +2/-1) on fix/crash"
        );

        let pr_without_code = EnhancedContext::new(ContextType::PullRequest, Utc::now());
        assert!(!pr_without_code.code_matches_type());
        assert_eq!(renderer.render_mode(&pr_without_code, Mode::Code, "").unwrap(), " on ");
    }
}
