//! Fixed size envelope for rendered and trimmed contexts
//!
//! Token estimates use the ~4 bytes per token approximation; this is a
//! budgeting heuristic, not a tokenizer.

/// Maximum changed files listed in Markdown output.
pub const FILE_DISPLAY_CAP: usize = 20;

/// Maximum comments listed in Markdown output.
pub const COMMENT_DISPLAY_CAP: usize = 15;

/// Comment bodies longer than this are clipped (display and trim).
pub const COMMENT_BODY_CLIP: usize = 300;

/// Patches longer than this are clipped during trimming.
pub const PATCH_CLIP: usize = 200;

/// Bytes per estimated token.
pub const TOKEN_DIVISOR: usize = 4;

/// Tokens reserved for fixed prompt overhead before any content is counted.
pub const TRIM_OVERHEAD_TOKENS: usize = 1000;

/// Maximum files retained by a trim.
pub const TRIM_MAX_FILES: usize = 5;

/// Budget used when none (or a non-positive one) is configured.
pub const DEFAULT_MAX_TOKENS: usize = 50_000;

/// Suffix appended to clipped display text.
pub const DISPLAY_ELLIPSIS: &str = "...";

/// Suffix appended to text clipped by the trimmer.
pub const TRUNCATION_SUFFIX: &str = "...(truncated)";

/// Estimate tokens for `text` (`len / 4`, integer division).
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / TOKEN_DIVISOR
}

/// Resolve a configured budget, mapping unset/non-positive values to the default.
pub fn resolve_max_tokens(configured: i64) -> usize {
    if configured <= 0 {
        DEFAULT_MAX_TOKENS
    } else {
        usize::try_from(configured).unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Clip `text` to `max_chars` characters, appending `suffix` when clipped.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn clip(text: &str, max_chars: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + suffix.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(suffix);
            out
        }
    }
}
