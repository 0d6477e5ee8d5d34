//! Token-budget trimming
//!
//! Produces a reduced copy of a context. Files are kept in input order up to
//! half the budget; comments are kept newest-first until the budget is spent.
//! Retention order (newest first) is intentionally the reverse of the display
//! order used by the Markdown renderer.

use crate::formatter::limits::{
    clip, estimate_tokens, COMMENT_BODY_CLIP, DEFAULT_MAX_TOKENS, PATCH_CLIP, TOKEN_DIVISOR,
    TRIM_MAX_FILES, TRIM_OVERHEAD_TOKENS, TRUNCATION_SUFFIX,
};
use crate::model::{CodeContext, CommentContext, EnhancedContext};
use tracing::debug;

/// Trim `ctx` to an estimated `max_tokens` budget, returning a new context.
///
/// A budget of zero is treated as unset and resolves to the default.
pub fn trim_to_token_limit(ctx: &EnhancedContext, max_tokens: usize) -> EnhancedContext {
    let max_tokens = if max_tokens == 0 {
        DEFAULT_MAX_TOKENS
    } else {
        max_tokens
    };
    let code_budget = max_tokens / 2;
    let mut current = TRIM_OVERHEAD_TOKENS;

    let mut trimmed = EnhancedContext {
        context_type: ctx.context_type,
        priority: ctx.priority,
        timestamp: ctx.timestamp,
        subject: ctx.subject.clone(),
        comments: Vec::new(),
        code: None,
        metadata: ctx.metadata.clone(),
        token_count: 0,
    };

    if let Some(code) = &ctx.code {
        if current < code_budget {
            let mut kept = CodeContext {
                repository: code.repository.clone(),
                base_branch: code.base_branch.clone(),
                head_branch: code.head_branch.clone(),
                files: Vec::new(),
                total_changes: code.total_changes,
            };
            for file in code.files.iter().take(TRIM_MAX_FILES) {
                let cost = (file.path.len() + file.patch.len()) / TOKEN_DIVISOR;
                if current + cost > code_budget {
                    break;
                }
                current += cost;
                let mut copy = file.clone();
                copy.patch = clip(&file.patch, PATCH_CLIP, TRUNCATION_SUFFIX);
                kept.files.push(copy);
            }
            debug!(
                kept = kept.files.len(),
                dropped = code.files.len() - kept.files.len(),
                tokens = current,
                "Trimmed changed files"
            );
            trimmed.code = Some(kept);
        }
    }

    if !ctx.comments.is_empty() && current < max_tokens {
        let mut newest_first: Vec<&CommentContext> = ctx.comments.iter().collect();
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for comment in newest_first {
            let cost = estimate_tokens(&comment.body);
            if current + cost > max_tokens {
                break;
            }
            current += cost;
            let mut copy = comment.clone();
            copy.body = clip(&comment.body, COMMENT_BODY_CLIP, TRUNCATION_SUFFIX);
            trimmed.comments.push(copy);
        }
        debug!(
            kept = trimmed.comments.len(),
            dropped = ctx.comments.len() - trimmed.comments.len(),
            tokens = current,
            "Trimmed comments"
        );
    }

    trimmed.token_count = current;
    trimmed
}
