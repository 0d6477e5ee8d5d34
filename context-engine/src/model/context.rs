//! Enhanced context types: the collector's view of one inbound event

use crate::model::event::GitHubEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of GitHub activity a context was collected for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    /// Pull request opened/synchronized
    PullRequest,
    /// Issue opened/edited
    #[default]
    Issue,
    /// Conversation comment on a pull request
    PrComment,
    /// Line-anchored review comment
    ReviewComment,
    /// Submitted pull request review
    Review,
}

impl ContextType {
    /// Whether this kind of activity carries a pull request (and therefore code).
    pub fn is_pr_bearing(&self) -> bool {
        !matches!(self, Self::Issue)
    }

    /// Human-readable label used in rendered Markdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PullRequest => "Pull Request",
            Self::Issue => "Issue",
            Self::PrComment => "PR Comment",
            Self::ReviewComment => "Review Comment",
            Self::Review => "Review",
        }
    }
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PullRequest => write!(f, "pull_request"),
            Self::Issue => write!(f, "issue"),
            Self::PrComment => write!(f, "pr_comment"),
            Self::ReviewComment => write!(f, "review_comment"),
            Self::Review => write!(f, "review"),
        }
    }
}

/// Ordered urgency of a context (Low < Medium < High < Critical)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Status of a changed file within a pull request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Deleted,
    Renamed,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::Renamed => write!(f, "renamed"),
        }
    }
}

/// A single file touched by a pull request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root
    pub path: String,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
    /// Unified diff text; may already be truncated by the collector
    #[serde(default)]
    pub patch: String,
    /// Original path, set only for renamed files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default)]
    pub sha: String,
}

impl FileChange {
    /// Create a modified-file entry with the given line counts.
    pub fn new(
        path: impl Into<String>,
        status: FileStatus,
        additions: u64,
        deletions: u64,
    ) -> Self {
        Self {
            path: path.into(),
            status,
            additions,
            deletions,
            changes: additions + deletions,
            ..Default::default()
        }
    }

    /// Attach a patch body.
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = patch.into();
        self
    }

    /// Mark the file as renamed from `previous`.
    pub fn renamed_from(mut self, previous: impl Into<String>) -> Self {
        self.status = FileStatus::Renamed;
        self.previous_path = Some(previous.into());
        self
    }
}

/// Aggregate change counts across a pull request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTotals {
    pub additions: u64,
    pub deletions: u64,
    pub file_count: usize,
}

impl ChangeTotals {
    /// Sum additions/deletions over a file list.
    pub fn from_files(files: &[FileChange]) -> Self {
        files.iter().fold(
            Self {
                file_count: files.len(),
                ..Default::default()
            },
            |mut acc, f| {
                acc.additions += f.additions;
                acc.deletions += f.deletions;
                acc
            },
        )
    }
}

/// Code-level view of a pull request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContext {
    /// `owner/name`
    pub repository: String,
    #[serde(default)]
    pub base_branch: String,
    #[serde(default)]
    pub head_branch: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
    /// Totals may be sourced from the API independently of `files`; after
    /// trimming they describe the whole PR, not the retained subset.
    #[serde(default)]
    pub total_changes: ChangeTotals,
}

impl CodeContext {
    /// Build a code context whose totals are computed from `files`.
    pub fn new(
        repository: impl Into<String>,
        base_branch: impl Into<String>,
        head_branch: impl Into<String>,
        files: Vec<FileChange>,
    ) -> Self {
        let total_changes = ChangeTotals::from_files(&files);
        Self {
            repository: repository.into(),
            base_branch: base_branch.into(),
            head_branch: head_branch.into(),
            files,
            total_changes,
        }
    }
}

/// Where a comment was left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    #[default]
    IssueComment,
    ReviewComment,
    Review,
}

/// State attached to a submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    /// Upper-case tag as GitHub reports it (`APPROVED`, `CHANGES_REQUESTED`, ...).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::ChangesRequested => "CHANGES_REQUESTED",
            Self::Commented => "COMMENTED",
            Self::Dismissed => "DISMISSED",
            Self::Pending => "PENDING",
        }
    }
}

/// A comment, review comment or review body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentContext {
    pub id: u64,
    #[serde(default)]
    pub comment_type: CommentKind,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_state: Option<ReviewState>,
}

impl CommentContext {
    /// Create a plain conversation comment.
    pub fn new(
        id: u64,
        author: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            body: body.into(),
            created_at,
            updated_at: created_at,
            ..Default::default()
        }
    }

    /// Anchor the comment to a file line (or line range when `start_line` is set).
    pub fn anchored(mut self, path: impl Into<String>, line: u64, start_line: Option<u64>) -> Self {
        self.comment_type = CommentKind::ReviewComment;
        self.file_path = Some(path.into());
        self.line_number = Some(line);
        self.start_line = start_line;
        self
    }

    /// Attach a review state.
    pub fn with_review_state(mut self, state: ReviewState) -> Self {
        self.review_state = Some(state);
        self
    }

    /// `path:line` or `path:start-line`, when the comment is anchored.
    pub fn anchor(&self) -> Option<String> {
        let path = self.file_path.as_deref()?;
        match (self.start_line, self.line_number) {
            (Some(start), Some(line)) if start != line => Some(format!("{path}:{start}-{line}")),
            (_, Some(line)) => Some(format!("{path}:{line}")),
            _ => Some(path.to_string()),
        }
    }
}

/// Typed side-channel collected alongside the context.
///
/// Known keys are typed fields; anything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextMetadata {
    pub repository: Option<String>,
    pub issue_number: Option<u64>,
    pub pr_number: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
    pub head_branch: Option<String>,
    pub base_branch: Option<String>,
    pub trigger_user: Option<String>,
    pub trigger_comment: Option<String>,
    pub event_action: Option<String>,
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContextMetadata {
    /// Look up a residual key and coerce it to a string.
    pub fn extra_string(&self, key: &str) -> Option<String> {
        self.extra.get(key).map(coerce_to_string)
    }
}

/// Best-effort string coercion for loosely-typed metadata values.
pub fn coerce_to_string(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// The normalized context assembled for one inbound event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedContext {
    pub context_type: ContextType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    /// The originating webhook event, when the collector kept it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<GitHubEvent>,
    #[serde(default)]
    pub comments: Vec<CommentContext>,
    /// Present iff `context_type` is PR-bearing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeContext>,
    #[serde(default)]
    pub metadata: ContextMetadata,
    /// Zero until the context has been trimmed
    #[serde(default)]
    pub token_count: usize,
}

impl EnhancedContext {
    /// Create an empty context of the given type.
    pub fn new(context_type: ContextType, timestamp: DateTime<Utc>) -> Self {
        Self {
            context_type,
            timestamp,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_subject(mut self, subject: GitHubEvent) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_code(mut self, code: CodeContext) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_comments(mut self, comments: Vec<CommentContext>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_metadata(mut self, metadata: ContextMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Repository name from code context, metadata, or the embedded event.
    pub fn repository(&self) -> Option<String> {
        self.code
            .as_ref()
            .map(|c| c.repository.clone())
            .filter(|r| !r.is_empty())
            .or_else(|| self.metadata.repository.clone())
            .or_else(|| {
                self.subject
                    .as_ref()
                    .and_then(|s| s.repository())
                    .map(|r| r.full_name.clone())
                    .filter(|r| !r.is_empty())
            })
    }

    /// Number of changed files carried in the code context.
    pub fn file_count(&self) -> usize {
        self.code.as_ref().map_or(0, |c| c.files.len())
    }

    /// Whether `code` presence agrees with the context type.
    pub fn code_matches_type(&self) -> bool {
        self.code.is_some() == self.context_type.is_pr_bearing()
    }
}
