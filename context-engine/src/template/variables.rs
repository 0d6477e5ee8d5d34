//! Flattens an [`EnhancedContext`] into the `$NAME` variable catalog.

use crate::formatter::ContextFormatter;
use crate::model::{CommentContext, ContextType, EnhancedContext};
use crate::template::data::{CommentSummary, FileSummary};
use crate::template::mode::Mode;
use std::collections::BTreeMap;
use tracing::warn;

/// Every placeholder name a mode template may reference.
pub const CATALOG_VARIABLES: &[&str] = &[
    "REPOSITORY",
    "MODE",
    "ARGS",
    "CONTEXT_TYPE",
    "PRIORITY",
    "IS_PR",
    "ISSUE_NUMBER",
    "ISSUE_TITLE",
    "ISSUE_BODY",
    "ISSUE_AUTHOR",
    "PR_NUMBER",
    "PR_TITLE",
    "PR_BODY",
    "PR_AUTHOR",
    "BASE_BRANCH",
    "HEAD_BRANCH",
    "TRIGGER_USER",
    "TRIGGER_COMMENT",
    "CHANGED_FILES",
    "COMMENTS",
    "FILE_COUNT",
    "COMMENT_COUNT",
    "TOTAL_ADDITIONS",
    "TOTAL_DELETIONS",
    "FORMATTED_CONTEXT",
];

pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Substituted for `FORMATTED_CONTEXT` when Markdown rendering fails.
pub const FORMAT_ERROR_MARKER: &str = "[error formatting context]";

/// Build variables with default settings.
pub fn build_variables(ctx: &EnhancedContext, mode: Mode, args: &str) -> BTreeMap<String, String> {
    VariableBuilder::default().build(ctx, mode, args)
}

/// Flattens contexts into the variable catalog.
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    formatter: ContextFormatter,
    default_base_branch: String,
}

impl Default for VariableBuilder {
    fn default() -> Self {
        Self {
            formatter: ContextFormatter::default(),
            default_base_branch: DEFAULT_BASE_BRANCH.to_string(),
        }
    }
}

impl VariableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter used for `FORMATTED_CONTEXT`.
    pub fn with_formatter(mut self, formatter: ContextFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// `BASE_BRANCH` when nothing in the context names one.
    pub fn with_default_base_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_base_branch = branch.into();
        self
    }

    pub fn formatter(&self) -> &ContextFormatter {
        &self.formatter
    }

    /// Build the full catalog for `ctx`. Every catalog name is present in the
    /// result, so known placeholders never survive substitution.
    pub fn build(&self, ctx: &EnhancedContext, mode: Mode, args: &str) -> BTreeMap<String, String> {
        build_with(self, ctx, mode, args)
    }
}

fn build_with(
    builder: &VariableBuilder,
    ctx: &EnhancedContext,
    mode: Mode,
    args: &str,
) -> BTreeMap<String, String> {
    let mut vars: BTreeMap<String, String> = CATALOG_VARIABLES
        .iter()
        .map(|name| (name.to_string(), String::new()))
        .collect();
    let mut set = |name: &str, value: String| {
        vars.insert(name.to_string(), value);
    };

    set("MODE", mode.to_string());
    set("ARGS", args.to_string());
    set("CONTEXT_TYPE", ctx.context_type.to_string());
    set("PRIORITY", ctx.priority.to_string());
    set("IS_PR", "false".to_string());
    set("BASE_BRANCH", builder.default_base_branch.clone());
    set("FILE_COUNT", "0".to_string());
    set("COMMENT_COUNT", ctx.comments.len().to_string());
    set("TOTAL_ADDITIONS", "0".to_string());
    set("TOTAL_DELETIONS", "0".to_string());
    set("REPOSITORY", ctx.repository().unwrap_or_default());

    let meta = &ctx.metadata;
    let subject = ctx.subject.as_ref();

    let trigger_user = meta
        .trigger_user
        .clone()
        .or_else(|| subject.and_then(|s| s.sender()).map(|u| u.login.clone()))
        .unwrap_or_default();
    set("TRIGGER_USER", trigger_user);
    set(
        "TRIGGER_COMMENT",
        meta.trigger_comment.clone().unwrap_or_default(),
    );

    if ctx.context_type == ContextType::Issue {
        let issue = subject.and_then(|s| s.issue());
        set(
            "ISSUE_NUMBER",
            meta.issue_number
                .or(issue.map(|i| i.number))
                .map(|n| n.to_string())
                .unwrap_or_default(),
        );
        set(
            "ISSUE_TITLE",
            meta.title
                .clone()
                .or_else(|| issue.map(|i| i.title.clone()))
                .unwrap_or_default(),
        );
        set(
            "ISSUE_BODY",
            meta.body
                .clone()
                .or_else(|| issue.and_then(|i| i.body.clone()))
                .unwrap_or_default(),
        );
        set(
            "ISSUE_AUTHOR",
            meta.author
                .clone()
                .or_else(|| issue.and_then(|i| i.user.as_ref()).map(|u| u.login.clone()))
                .unwrap_or_default(),
        );
    }

    if ctx.context_type.is_pr_bearing() || ctx.code.is_some() {
        let pr = subject.and_then(|s| s.pull_request());
        // issue_comment deliveries on a pull request carry the PR as an issue
        let pr_issue = subject.and_then(|s| s.issue()).filter(|i| i.is_pull_request());
        let code = ctx.code.as_ref();

        let pr_number = meta
            .pr_number
            .or(pr.map(|p| p.number).filter(|n| *n > 0))
            .or(pr_issue.map(|i| i.number).filter(|n| *n > 0))
            .map(|n| n.to_string())
            .unwrap_or_default();
        if !pr_number.is_empty() {
            set("IS_PR", "true".to_string());
        }
        set("PR_NUMBER", pr_number);
        set(
            "PR_TITLE",
            meta.title
                .clone()
                .or_else(|| pr.map(|p| p.title.clone()))
                .or_else(|| pr_issue.map(|i| i.title.clone()))
                .unwrap_or_default(),
        );
        set(
            "PR_BODY",
            meta.body
                .clone()
                .or_else(|| pr.and_then(|p| p.body.clone()))
                .or_else(|| pr_issue.and_then(|i| i.body.clone()))
                .unwrap_or_default(),
        );
        set(
            "PR_AUTHOR",
            meta.author
                .clone()
                .or_else(|| pr.and_then(|p| p.user.as_ref()).map(|u| u.login.clone()))
                .or_else(|| pr_issue.and_then(|i| i.user.as_ref()).map(|u| u.login.clone()))
                .unwrap_or_default(),
        );
        let head = non_empty(meta.head_branch.clone())
            .or_else(|| non_empty(pr.and_then(|p| p.head.as_ref()).map(|h| h.ref_name.clone())))
            .or_else(|| non_empty(code.map(|c| c.head_branch.clone())))
            .unwrap_or_default();
        set("HEAD_BRANCH", head);
        let base = non_empty(meta.base_branch.clone())
            .or_else(|| non_empty(pr.and_then(|p| p.base.as_ref()).map(|b| b.ref_name.clone())))
            .or_else(|| non_empty(code.map(|c| c.base_branch.clone())))
            .unwrap_or_else(|| builder.default_base_branch.clone());
        set("BASE_BRANCH", base);

        if let Some(code) = code {
            set(
                "CHANGED_FILES",
                code.files
                    .iter()
                    .map(|f| FileSummary::from(f).line())
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            set("FILE_COUNT", code.total_changes.file_count.to_string());
            set("TOTAL_ADDITIONS", code.total_changes.additions.to_string());
            set("TOTAL_DELETIONS", code.total_changes.deletions.to_string());
        }
    } else if let Some(base) = non_empty(meta.base_branch.clone()) {
        set("BASE_BRANCH", base);
    }

    let mut chronological: Vec<&CommentContext> = ctx.comments.iter().collect();
    chronological.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    set(
        "COMMENTS",
        chronological
            .into_iter()
            .map(|c| CommentSummary::from(c).line())
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let formatted = match builder.formatter.try_format_to_markdown(ctx) {
        Ok(markdown) => markdown,
        Err(e) => {
            warn!(error = %e, "Failed to format context");
            FORMAT_ERROR_MARKER.to_string()
        }
    };
    set("FORMATTED_CONTEXT", formatted);

    for (key, value) in &meta.extra {
        let name = key.to_uppercase();
        if !CATALOG_VARIABLES.contains(&name.as_str()) {
            set(&name, crate::model::coerce_to_string(value));
        }
    }

    vars
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
