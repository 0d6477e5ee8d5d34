//! Trim property tests: deterministic sweeps over budgets and input sizes.
//!
//! Tests verify:
//! - At most five files survive, never more than the input had
//! - Retained comments are newest first
//! - Retained bodies are clipped to 300 chars plus the truncation suffix
//! - The token estimate never exceeds the budget
//! - Trimming leaves its input untouched

use chrono::{DateTime, Duration, TimeZone, Utc};
use context_engine::formatter::trim_to_token_limit;
use context_engine::{
    CodeContext, CommentContext, ContextType, EnhancedContext, FileChange, FileStatus,
};

const SUFFIX: &str = "...(truncated)";

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Build a PR context with `files` files and `comments` comments whose sizes
/// and timestamps vary with the index.
fn make_context(files: usize, comments: usize) -> EnhancedContext {
    let files = (0..files)
        .map(|i| {
            FileChange::new(format!("src/file_{i}.rs"), FileStatus::Modified, i as u64, 1)
                .with_patch("+".repeat((i * 97) % 900))
        })
        .collect();
    // Interleave timestamps so input order differs from chronological order
    let comments = (0..comments)
        .map(|i| {
            let offset = ((i * 7) % 13) as i64 * 60 + i as i64;
            CommentContext::new(
                i as u64,
                format!("user{}", i % 4),
                "c".repeat((i * 131) % 700),
                base() + Duration::seconds(offset),
            )
        })
        .collect();
    EnhancedContext::new(ContextType::PullRequest, base())
        .with_code(CodeContext::new("acme/w", "main", "feat", files))
        .with_comments(comments)
}

const BUDGETS: &[usize] = &[1, 500, 1000, 2001, 2500, 4000, 10_000, 50_000];
const SIZES: &[(usize, usize)] = &[(0, 0), (1, 1), (4, 3), (5, 10), (12, 25), (30, 40)];

// ── Property: file retention bounds ───────────────────────────────

#[test]
fn prop_files_bounded() {
    for &budget in BUDGETS {
        for &(files, comments) in SIZES {
            let ctx = make_context(files, comments);
            let trimmed = trim_to_token_limit(&ctx, budget);
            let kept = trimmed.file_count();
            assert!(kept <= 5, "budget {budget}: kept {kept} files");
            assert!(kept <= files, "budget {budget}: kept {kept} of {files}");
        }
    }
}

#[test]
fn prop_kept_files_are_input_prefix() {
    for &budget in BUDGETS {
        let ctx = make_context(12, 0);
        let trimmed = trim_to_token_limit(&ctx, budget);
        if let Some(code) = &trimmed.code {
            for (kept, original) in code.files.iter().zip(&ctx.code.as_ref().unwrap().files) {
                assert_eq!(kept.path, original.path);
            }
        }
    }
}

#[test]
fn prop_small_budget_drops_code() {
    for budget in [1, 1000, 2000] {
        let trimmed = trim_to_token_limit(&make_context(5, 0), budget);
        assert!(trimmed.code.is_none(), "budget {budget} kept code");
    }
}

// ── Property: comment ordering and clipping ───────────────────────

#[test]
fn prop_comments_newest_first() {
    for &budget in BUDGETS {
        for &(files, comments) in SIZES {
            let trimmed = trim_to_token_limit(&make_context(files, comments), budget);
            for pair in trimmed.comments.windows(2) {
                assert!(
                    pair[0].created_at >= pair[1].created_at,
                    "budget {budget}: comments out of order"
                );
            }
        }
    }
}

#[test]
fn prop_bodies_clipped() {
    for &budget in BUDGETS {
        let trimmed = trim_to_token_limit(&make_context(0, 40), budget);
        for comment in &trimmed.comments {
            let chars = comment.body.chars().count();
            assert!(chars <= 300 + SUFFIX.len(), "budget {budget}: {chars} chars");
            if chars > 300 {
                assert!(comment.body.ends_with(SUFFIX));
            }
        }
    }
}

// ── Property: accounting ──────────────────────────────────────────

#[test]
fn prop_token_count_within_budget() {
    for &budget in BUDGETS.iter().filter(|b| **b >= 1000) {
        for &(files, comments) in SIZES {
            let trimmed = trim_to_token_limit(&make_context(files, comments), budget);
            assert!(trimmed.token_count >= 1000);
            assert!(trimmed.token_count <= budget.max(1000));
        }
    }
}

#[test]
fn prop_input_untouched() {
    for &(files, comments) in SIZES {
        let ctx = make_context(files, comments);
        let snapshot = ctx.clone();
        let _ = trim_to_token_limit(&ctx, 2500);
        assert_eq!(ctx, snapshot);
    }
}

#[test]
fn prop_totals_survive_trimming() {
    let ctx = make_context(30, 0);
    let trimmed = trim_to_token_limit(&ctx, 50_000);
    let code = trimmed.code.unwrap();
    assert_eq!(code.total_changes.file_count, 30);
    assert_eq!(code.total_changes, ctx.code.unwrap().total_changes);
}
