//! Renders contexts to Markdown and trims them to a token budget.
//!
//! Rendering never mutates its input: comments are sorted on an owned copy.
//! Trimming returns a new context with `token_count` set.

pub mod limits;
pub mod markdown;
pub mod trim;

pub use limits::{estimate_tokens, resolve_max_tokens, DEFAULT_MAX_TOKENS};
pub use markdown::{normalize_newlines, render_markdown, render_structured};
pub use trim::trim_to_token_limit;

use crate::model::EnhancedContext;
use std::fmt;

/// Stateless formatter bound to a token budget.
#[derive(Debug, Clone, Copy)]
pub struct ContextFormatter {
    max_tokens: usize,
}

impl Default for ContextFormatter {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ContextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the budget; non-positive values resolve to the default.
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = resolve_max_tokens(max_tokens);
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Render Markdown, surfacing the underlying write error.
    pub fn try_format_to_markdown(&self, ctx: &EnhancedContext) -> Result<String, fmt::Error> {
        render_markdown(ctx)
    }

    /// Render Markdown. Writing into a `String` cannot fail in practice; an
    /// error degrades to the structured one-line rendering.
    pub fn format_to_markdown(&self, ctx: &EnhancedContext) -> String {
        render_markdown(ctx).unwrap_or_else(|_| render_structured(ctx))
    }

    pub fn format_to_structured(&self, ctx: &EnhancedContext) -> String {
        render_structured(ctx)
    }

    /// Trim using this formatter's budget.
    pub fn trim(&self, ctx: &EnhancedContext) -> EnhancedContext {
        trim_to_token_limit(ctx, self.max_tokens)
    }

    /// Trim to an explicit budget.
    pub fn trim_to_token_limit(&self, ctx: &EnhancedContext, max_tokens: usize) -> EnhancedContext {
        trim_to_token_limit(ctx, max_tokens)
    }

    /// Trim, then render the reduced context.
    pub fn format_trimmed(&self, ctx: &EnhancedContext) -> (EnhancedContext, String) {
        let trimmed = self.trim(ctx);
        let markdown = self.format_to_markdown(&trimmed);
        (trimmed, markdown)
    }
}
