//! Flat `GITHUB_*` variable bag rendered by both placeholder syntaxes
//!
//! One field per placeholder, grouped by concern. [`GitHubTemplateData::to_variables`]
//! feeds literal `$NAME` substitution and [`GitHubTemplateData::to_value`] feeds
//! the structured engine; both come from the same field table so the two
//! syntaxes always see identical text.

use crate::formatter::limits::{clip, DISPLAY_ELLIPSIS};
use crate::model::{CommentContext, EnhancedContext, FileChange};
use crate::template::structured::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Max characters of a comment's first line in one-line digests.
const DIGEST_LINE_CHARS: usize = 100;

/// Changed file as exposed to templates (`GITHUB_FILES`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
}

impl FileSummary {
    /// `path (status, +a/-d)`
    pub fn line(&self) -> String {
        format!(
            "{} ({}, +{}/-{})",
            self.path, self.status, self.additions, self.deletions
        )
    }

    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("Path".to_string(), Value::from(self.path.as_str()));
        map.insert("Status".to_string(), Value::from(self.status.as_str()));
        map.insert("Additions".to_string(), Value::from(self.additions));
        map.insert("Deletions".to_string(), Value::from(self.deletions));
        Value::Map(map)
    }
}

impl From<&FileChange> for FileSummary {
    fn from(file: &FileChange) -> Self {
        Self {
            path: file.path.clone(),
            status: file.status.to_string(),
            additions: file.additions,
            deletions: file.deletions,
        }
    }
}

/// Comment as exposed to templates (`GITHUB_COMMENTS`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub author: String,
    pub body: String,
    /// RFC 3339
    pub created_at: String,
    /// `path:line` for review comments, empty otherwise
    pub anchor: String,
}

impl CommentSummary {
    /// `author: first line of body`
    pub fn line(&self) -> String {
        let first = self.body.lines().next().unwrap_or_default();
        format!(
            "{}: {}",
            self.author,
            clip(first.trim(), DIGEST_LINE_CHARS, DISPLAY_ELLIPSIS)
        )
    }

    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("Author".to_string(), Value::from(self.author.as_str()));
        map.insert("Body".to_string(), Value::from(self.body.as_str()));
        map.insert("CreatedAt".to_string(), Value::from(self.created_at.as_str()));
        map.insert("Anchor".to_string(), Value::from(self.anchor.as_str()));
        Value::Map(map)
    }
}

impl From<&CommentContext> for CommentSummary {
    fn from(comment: &CommentContext) -> Self {
        Self {
            author: comment.author.clone(),
            body: comment.body.clone(),
            created_at: rfc3339(&comment.created_at),
            anchor: comment.anchor().unwrap_or_default(),
        }
    }
}

pub(crate) fn rfc3339(t: &chrono::DateTime<chrono::Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Normalized event data, one field per `GITHUB_*` placeholder.
///
/// Numbers are kept as text (empty when absent) so that a missing value
/// renders as nothing in either syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubTemplateData {
    // core
    pub repository: String,
    pub event_type: String,
    pub event_action: String,
    pub trigger_user: String,
    pub is_pr: bool,
    pub is_issue: bool,

    // issue
    pub issue_number: String,
    pub issue_title: String,
    pub issue_body: String,
    pub issue_author: String,
    pub issue_state: String,
    pub issue_url: String,
    pub labels: Vec<String>,

    // pull request
    pub pr_number: String,
    pub pr_title: String,
    pub pr_body: String,
    pub pr_author: String,
    pub pr_state: String,
    pub pr_url: String,
    pub pr_draft: bool,
    pub pr_additions: String,
    pub pr_deletions: String,
    pub pr_changed_files: String,
    pub branch_name: String,
    pub base_branch: String,
    pub head_sha: String,

    // comment / interaction
    pub comment_id: String,
    pub comment_body: String,
    pub comment_author: String,
    pub comment_url: String,

    // review line
    pub file_path: String,
    pub line_number: String,
    pub start_line: String,
    pub line_range: String,
    pub diff_hunk: String,
    pub commit_id: String,

    // metadata
    pub created_at: String,
    pub updated_at: String,
    pub files: Vec<FileSummary>,
    pub comments: Vec<CommentSummary>,
}

impl GitHubTemplateData {
    /// Scalar placeholders in declaration order.
    pub fn scalar_fields(&self) -> Vec<(&'static str, String)> {
        let flag = |b: bool| b.to_string();
        vec![
            ("GITHUB_REPOSITORY", self.repository.clone()),
            ("GITHUB_EVENT_TYPE", self.event_type.clone()),
            ("GITHUB_EVENT_ACTION", self.event_action.clone()),
            ("GITHUB_TRIGGER_USER", self.trigger_user.clone()),
            ("GITHUB_IS_PR", flag(self.is_pr)),
            ("GITHUB_IS_ISSUE", flag(self.is_issue)),
            ("GITHUB_ISSUE_NUMBER", self.issue_number.clone()),
            ("GITHUB_ISSUE_TITLE", self.issue_title.clone()),
            ("GITHUB_ISSUE_BODY", self.issue_body.clone()),
            ("GITHUB_ISSUE_AUTHOR", self.issue_author.clone()),
            ("GITHUB_ISSUE_STATE", self.issue_state.clone()),
            ("GITHUB_ISSUE_URL", self.issue_url.clone()),
            ("GITHUB_PR_NUMBER", self.pr_number.clone()),
            ("GITHUB_PR_TITLE", self.pr_title.clone()),
            ("GITHUB_PR_BODY", self.pr_body.clone()),
            ("GITHUB_PR_AUTHOR", self.pr_author.clone()),
            ("GITHUB_PR_STATE", self.pr_state.clone()),
            ("GITHUB_PR_URL", self.pr_url.clone()),
            ("GITHUB_PR_DRAFT", flag(self.pr_draft)),
            ("GITHUB_PR_ADDITIONS", self.pr_additions.clone()),
            ("GITHUB_PR_DELETIONS", self.pr_deletions.clone()),
            ("GITHUB_PR_CHANGED_FILES", self.pr_changed_files.clone()),
            ("GITHUB_BRANCH_NAME", self.branch_name.clone()),
            ("GITHUB_BASE_BRANCH", self.base_branch.clone()),
            ("GITHUB_HEAD_SHA", self.head_sha.clone()),
            ("GITHUB_COMMENT_ID", self.comment_id.clone()),
            ("GITHUB_COMMENT_BODY", self.comment_body.clone()),
            ("GITHUB_COMMENT_AUTHOR", self.comment_author.clone()),
            ("GITHUB_COMMENT_URL", self.comment_url.clone()),
            ("GITHUB_FILE_PATH", self.file_path.clone()),
            ("GITHUB_LINE_NUMBER", self.line_number.clone()),
            ("GITHUB_START_LINE", self.start_line.clone()),
            ("GITHUB_LINE_RANGE", self.line_range.clone()),
            ("GITHUB_DIFF_HUNK", self.diff_hunk.clone()),
            ("GITHUB_COMMIT_ID", self.commit_id.clone()),
            ("GITHUB_CREATED_AT", self.created_at.clone()),
            ("GITHUB_UPDATED_AT", self.updated_at.clone()),
            ("GITHUB_FILE_COUNT", self.files.len().to_string()),
            ("GITHUB_COMMENT_COUNT", self.comments.len().to_string()),
        ]
    }

    /// Name → text map for `$NAME` substitution. List fields become text:
    /// labels comma-separated, files and comments one digest line each.
    pub fn to_variables(&self) -> BTreeMap<String, String> {
        let mut vars: BTreeMap<String, String> = self
            .scalar_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        vars.insert("GITHUB_LABELS".to_string(), self.labels.join(", "));
        vars.insert(
            "GITHUB_FILES".to_string(),
            self.files
                .iter()
                .map(FileSummary::line)
                .collect::<Vec<_>>()
                .join("\n"),
        );
        vars.insert(
            "GITHUB_COMMENTS".to_string(),
            self.comments
                .iter()
                .map(CommentSummary::line)
                .collect::<Vec<_>>()
                .join("\n"),
        );
        vars
    }

    /// Evaluation root for structured templates. Flags are real booleans so
    /// `{{if .GITHUB_IS_PR}}` behaves as expected.
    pub fn to_value(&self) -> Value {
        let mut map: BTreeMap<String, Value> = self
            .scalar_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::Str(value)))
            .collect();
        map.insert("GITHUB_IS_PR".to_string(), Value::Bool(self.is_pr));
        map.insert("GITHUB_IS_ISSUE".to_string(), Value::Bool(self.is_issue));
        map.insert("GITHUB_PR_DRAFT".to_string(), Value::Bool(self.pr_draft));
        map.insert(
            "GITHUB_FILE_COUNT".to_string(),
            Value::from(self.files.len()),
        );
        map.insert(
            "GITHUB_COMMENT_COUNT".to_string(),
            Value::from(self.comments.len()),
        );
        map.insert("GITHUB_LABELS".to_string(), Value::from(self.labels.clone()));
        map.insert(
            "GITHUB_FILES".to_string(),
            Value::List(self.files.iter().map(FileSummary::to_value).collect()),
        );
        map.insert(
            "GITHUB_COMMENTS".to_string(),
            Value::List(self.comments.iter().map(CommentSummary::to_value).collect()),
        );
        Value::Map(map)
    }

    /// Fill file and comment summaries (and any missing repository, labels or
    /// branches) from a collected context.
    pub fn enrich_from_context(&mut self, ctx: &EnhancedContext) {
        if self.repository.is_empty() {
            if let Some(repo) = ctx.repository() {
                self.repository = repo;
            }
        }
        if self.labels.is_empty() {
            self.labels = ctx.metadata.labels.clone();
        }
        if let Some(code) = &ctx.code {
            if self.branch_name.is_empty() {
                self.branch_name = code.head_branch.clone();
            }
            if self.base_branch.is_empty() {
                self.base_branch = code.base_branch.clone();
            }
            self.files = code.files.iter().map(FileSummary::from).collect();
        }
        let mut comments: Vec<&CommentContext> = ctx.comments.iter().collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.comments = comments.into_iter().map(CommentSummary::from).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeContext, ContextType, FileStatus};
    use chrono::{TimeZone, Utc};

    fn issue_data() -> GitHubTemplateData {
        GitHubTemplateData {
            repository: "acme/widgets".into(),
            event_type: "issues".into(),
            trigger_user: "issue_author".into(),
            is_issue: true,
            issue_number: "123".into(),
            issue_title: "Test Issue".into(),
            issue_author: "issue_author".into(),
            labels: vec!["bug".into(), "p1".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_variables_and_value_agree_on_scalars() {
        let data = issue_data();
        let vars = data.to_variables();
        let value = data.to_value();
        for (name, text) in data.scalar_fields() {
            assert_eq!(vars[name], text);
            assert_eq!(value.field(name).map(Value::render), Some(text), "{name}");
        }
    }

    #[test]
    fn test_list_fields() {
        let data = issue_data();
        assert_eq!(data.to_variables()["GITHUB_LABELS"], "bug, p1");
        assert_eq!(
            data.to_value().field("GITHUB_LABELS"),
            Some(&Value::from(vec!["bug", "p1"]))
        );
        assert_eq!(data.to_value().field("GITHUB_IS_ISSUE"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_enrich_from_context() {
        let t = |h| Utc.with_ymd_and_hms(2024, 2, 1, h, 0, 0).unwrap();
        let ctx = EnhancedContext::new(ContextType::PullRequest, t(0))
            .with_code(CodeContext::new(
                "acme/widgets",
                "main",
                "feature/x",
                vec![FileChange::new("src/lib.rs", FileStatus::Modified, 4, 2)],
            ))
            .with_comments(vec![
                CommentContext::new(2, "bob", "second\nline", t(4)),
                CommentContext::new(1, "alice", "first", t(2)),
            ]);

        let mut data = GitHubTemplateData::default();
        data.enrich_from_context(&ctx);

        assert_eq!(data.repository, "acme/widgets");
        assert_eq!(data.branch_name, "feature/x");
        assert_eq!(data.files[0].line(), "src/lib.rs (modified, +4/-2)");
        assert_eq!(data.comments[0].author, "alice");
        assert_eq!(data.comments[1].line(), "bob: second");
        assert_eq!(data.comments[0].created_at, "2024-02-01T02:00:00Z");

        let vars = data.to_variables();
        assert_eq!(vars["GITHUB_FILE_COUNT"], "1");
        assert_eq!(vars["GITHUB_COMMENTS"], "alice: first\nbob: second");
        // Caller order untouched
        assert_eq!(ctx.comments[0].id, 2);
    }

    #[test]
    fn test_enrich_keeps_existing_values() {
        let mut data = issue_data();
        let ctx = EnhancedContext::new(ContextType::Issue, Utc::now());
        data.enrich_from_context(&ctx);
        assert_eq!(data.repository, "acme/widgets");
        assert_eq!(data.labels.len(), 2);
    }
}
