//! Markdown and structured renderings of an [`EnhancedContext`]

use crate::formatter::limits::{
    clip, COMMENT_BODY_CLIP, COMMENT_DISPLAY_CAP, DISPLAY_ELLIPSIS, FILE_DISPLAY_CAP,
};
use crate::model::{CodeContext, CommentContext, ContextType, EnhancedContext, FileChange};
use std::fmt::{self, Write};

/// Timestamp layout used for comments, e.g. `Mar 5, 14:07`.
pub const COMMENT_TIME_FORMAT: &str = "%b %-d, %H:%M";

/// Render all non-empty sections, joined by a blank line.
///
/// Section order is fixed: basic context, PR summary, changed files, comments.
pub fn render_markdown(ctx: &EnhancedContext) -> Result<String, fmt::Error> {
    let mut sections = Vec::with_capacity(4);

    sections.push(basic_section(ctx)?);

    if ctx.context_type == ContextType::PullRequest {
        if let Some(code) = &ctx.code {
            sections.push(pr_summary_section(code)?);
        }
    }

    if let Some(code) = ctx.code.as_ref().filter(|c| !c.files.is_empty()) {
        sections.push(files_section(&code.files)?);
    }

    if !ctx.comments.is_empty() {
        sections.push(comments_section(&ctx.comments)?);
    }

    Ok(sections
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn basic_section(ctx: &EnhancedContext) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "## Context")?;
    writeln!(out, "**Type:** {}", ctx.context_type.label())?;
    write!(out, "**Priority:** {}", ctx.priority)?;
    if let Some(n) = ctx.metadata.issue_number {
        write!(out, "\n**Issue:** #{n}")?;
    }
    if let Some(n) = ctx.metadata.pr_number {
        write!(out, "\n**Pull Request:** #{n}")?;
    }
    Ok(out)
}

fn pr_summary_section(code: &CodeContext) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "## Pull Request Summary")?;
    writeln!(out, "**Repository:** {}", code.repository)?;
    writeln!(out, "**Branch:** {} → {}", code.head_branch, code.base_branch)?;
    write!(
        out,
        "**Changes:** +{}/-{} across {} files",
        code.total_changes.additions, code.total_changes.deletions, code.total_changes.file_count
    )?;
    Ok(out)
}

fn file_line(file: &FileChange) -> String {
    let name = match &file.previous_path {
        Some(prev) => format!("`{prev}` → `{}`", file.path),
        None => format!("`{}`", file.path),
    };
    format!(
        "- {name} ({}) +{}/-{}",
        file.status, file.additions, file.deletions
    )
}

fn files_section(files: &[FileChange]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "## Changed Files")?;
    for file in files.iter().take(FILE_DISPLAY_CAP) {
        write!(out, "\n{}", file_line(file))?;
    }
    if files.len() > FILE_DISPLAY_CAP {
        write!(out, "\n... and {} more files", files.len() - FILE_DISPLAY_CAP)?;
    }
    Ok(out)
}

/// Normalize CRLF/CR to LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn write_comment(out: &mut String, comment: &CommentContext) -> fmt::Result {
    write!(
        out,
        "**{}** ({})",
        comment.author,
        comment.created_at.format(COMMENT_TIME_FORMAT)
    )?;
    if let Some(anchor) = comment.anchor() {
        write!(out, " on `{anchor}`")?;
    }
    if let Some(state) = comment.review_state {
        write!(out, " [{}]", state.tag())?;
    }
    writeln!(out, ":")?;

    let body = clip(
        &normalize_newlines(&comment.body),
        COMMENT_BODY_CLIP,
        DISPLAY_ELLIPSIS,
    );
    let quoted = body
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    write!(out, "{quoted}")
}

fn comments_section(comments: &[CommentContext]) -> Result<String, fmt::Error> {
    // Display order is oldest first. Sort an owned copy so the caller's
    // sequence keeps its original order.
    let mut sorted: Vec<&CommentContext> = comments.iter().collect();
    sorted.sort_by_key(|c| c.created_at);

    let mut out = String::new();
    write!(out, "## Comments")?;
    for comment in sorted.iter().take(COMMENT_DISPLAY_CAP) {
        out.push_str("\n\n");
        write_comment(&mut out, comment)?;
    }
    if sorted.len() > COMMENT_DISPLAY_CAP {
        write!(
            out,
            "\n\n... and {} more comments",
            sorted.len() - COMMENT_DISPLAY_CAP
        )?;
    }
    Ok(out)
}

/// Compact one-line rendering for logs and tests.
pub fn render_structured(ctx: &EnhancedContext) -> String {
    format!(
        "Type: {} | Priority: {} | Comments: {} | Files: {} | Repository: {}",
        ctx.context_type,
        ctx.priority,
        ctx.comments.len(),
        ctx.file_count(),
        ctx.repository().unwrap_or_else(|| "-".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileStatus, Priority, ReviewState};
    use chrono::{TimeZone, Utc};

    fn ts(day: u32, h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, h, m, 0).unwrap()
    }

    fn pr_context(file_count: usize) -> EnhancedContext {
        let files = (0..file_count)
            .map(|i| FileChange::new(format!("src/file_{i}.rs"), FileStatus::Modified, 2, 1))
            .collect();
        let mut ctx = EnhancedContext::new(ContextType::PullRequest, ts(1, 9, 0))
            .with_priority(Priority::High)
            .with_code(CodeContext::new("acme/widgets", "main", "feature/x", files));
        ctx.metadata.pr_number = Some(34);
        ctx
    }

    #[test]
    fn test_basic_section_only_for_bare_issue() {
        let mut ctx = EnhancedContext::new(ContextType::Issue, ts(1, 9, 0));
        ctx.metadata.issue_number = Some(12);
        let md = render_markdown(&ctx).unwrap();
        assert_eq!(
            md,
            "## Context\n**Type:** Issue\n**Priority:** medium\n**Issue:** #12"
        );
    }

    #[test]
    fn test_section_order_and_separators() {
        let mut ctx = pr_context(2);
        ctx.comments.push(CommentContext::new(1, "bob", "looks good", ts(2, 10, 5)));
        let md = render_markdown(&ctx).unwrap();

        let context_at = md.find("## Context").unwrap();
        let summary_at = md.find("## Pull Request Summary").unwrap();
        let files_at = md.find("## Changed Files").unwrap();
        let comments_at = md.find("## Comments").unwrap();
        assert!(context_at < summary_at && summary_at < files_at && files_at < comments_at);
        assert!(md.contains("**Pull Request:** #34"));
        assert!(md.contains("**Branch:** feature/x → main"));
        assert!(md.contains("**Changes:** +4/-2 across 2 files"));
        assert!(md.contains("\n\n## Changed Files\n"));
    }

    #[test]
    fn test_pr_summary_omitted_for_review_comment_type() {
        let mut ctx = pr_context(1);
        ctx.context_type = ContextType::ReviewComment;
        let md = render_markdown(&ctx).unwrap();
        assert!(!md.contains("## Pull Request Summary"));
        assert!(md.contains("## Changed Files"));
    }

    #[test]
    fn test_files_capped_at_twenty() {
        let md = render_markdown(&pr_context(25)).unwrap();
        let listed = md.lines().filter(|l| l.starts_with("- `")).count();
        assert_eq!(listed, FILE_DISPLAY_CAP);
        assert!(md.lines().any(|l| l == "... and 5 more files"));
        assert!(md.contains("src/file_19.rs"));
        assert!(!md.contains("src/file_20.rs"));
    }

    #[test]
    fn test_renamed_file_line() {
        let file =
            FileChange::new("src/new.rs", FileStatus::Modified, 1, 1).renamed_from("src/old.rs");
        assert_eq!(
            file_line(&file),
            "- `src/old.rs` → `src/new.rs` (renamed) +1/-1"
        );
    }

    #[test]
    fn test_comment_rendering_details() {
        let mut ctx = EnhancedContext::new(ContextType::ReviewComment, ts(1, 0, 0));
        ctx.comments.push(
            CommentContext::new(7, "carol", "first\r\nsecond\rthird", ts(5, 14, 7))
                .anchored("src/lib.rs", 42, Some(40))
                .with_review_state(ReviewState::ChangesRequested),
        );
        let md = render_markdown(&ctx).unwrap();
        assert!(md.contains(
            "**carol** (Mar 5, 14:07) on `src/lib.rs:40-42` [CHANGES_REQUESTED]:\n> first\n> second\n> third"
        ));
    }

    #[test]
    fn test_comment_body_clipped_with_ellipsis() {
        let mut ctx = EnhancedContext::new(ContextType::Issue, ts(1, 0, 0));
        ctx.comments
            .push(CommentContext::new(1, "dave", "a".repeat(310), ts(2, 0, 0)));
        let md = render_markdown(&ctx).unwrap();
        let quoted = md.lines().find(|l| l.starts_with("> ")).unwrap();
        assert_eq!(quoted.len(), 2 + COMMENT_BODY_CLIP + DISPLAY_ELLIPSIS.len());
        assert!(quoted.ends_with("a..."));
    }

    #[test]
    fn test_comments_sorted_ascending_without_mutating_input() {
        let mut ctx = EnhancedContext::new(ContextType::Issue, ts(1, 0, 0));
        ctx.comments = vec![
            CommentContext::new(2, "late", "second", ts(3, 0, 0)),
            CommentContext::new(1, "early", "first", ts(2, 0, 0)),
        ];
        let before = ctx.comments.clone();
        let md = render_markdown(&ctx).unwrap();
        assert!(md.find("**early**").unwrap() < md.find("**late**").unwrap());
        assert_eq!(ctx.comments, before);
    }

    #[test]
    fn test_comments_capped_at_fifteen() {
        let mut ctx = EnhancedContext::new(ContextType::Issue, ts(1, 0, 0));
        ctx.comments = (0..18)
            .map(|i| CommentContext::new(i, format!("user{i}"), "hi", ts(2, i as u32, 0)))
            .collect();
        let md = render_markdown(&ctx).unwrap();
        assert_eq!(md.matches("**user").count(), COMMENT_DISPLAY_CAP);
        assert!(md.ends_with("... and 3 more comments"));
        assert!(!md.contains("**user15**"));
    }

    #[test]
    fn test_structured_rendering() {
        let mut ctx = pr_context(3);
        ctx.comments
            .push(CommentContext::new(1, "bob", "x", ts(2, 0, 0)));
        assert_eq!(
            render_structured(&ctx),
            "Type: pull_request | Priority: high | Comments: 1 | Files: 3 | Repository: acme/widgets"
        );
        let empty = EnhancedContext::default();
        assert!(render_structured(&empty).ends_with("Repository: -"));
    }
}
