//! GitHub webhook event shapes
//!
//! Only the fields the template layer reads are modelled. Every struct
//! defaults missing fields so partially populated payloads still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    /// `owner/name`
    pub full_name: String,
    pub name: String,
    pub owner: Option<User>,
    pub default_branch: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub user: Option<User>,
    pub labels: Vec<Label>,
    pub state: String,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Present when the "issue" is actually a pull request
    pub pull_request: Option<IssuePullRequestLink>,
}

impl Issue {
    /// Whether GitHub reports this issue as a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Marker object GitHub embeds in issues that are pull requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuePullRequestLink {
    pub url: String,
    pub html_url: String,
}

/// Conversation comment on an issue or pull request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub user: Option<User>,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub user: Option<User>,
    pub labels: Vec<Label>,
    pub state: String,
    pub html_url: String,
    pub draft: bool,
    pub merged: bool,
    pub head: Option<BranchRef>,
    pub base: Option<BranchRef>,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Line-anchored review comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewComment {
    pub id: u64,
    pub body: String,
    pub user: Option<User>,
    pub path: String,
    pub line: Option<u64>,
    pub start_line: Option<u64>,
    pub original_line: Option<u64>,
    pub diff_hunk: String,
    pub commit_id: String,
    pub html_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// `issues` and `issue_comment` webhooks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueEvent {
    pub action: String,
    pub issue: Option<Issue>,
    /// Set for `issue_comment` deliveries
    pub comment: Option<Comment>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
}

/// `pull_request` webhook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: u64,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
}

/// `pull_request_review_comment` webhook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCommentEvent {
    pub action: String,
    pub comment: Option<ReviewComment>,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
}

/// One of the inbound event shapes the engine understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum GitHubEvent {
    Issue(IssueEvent),
    PullRequest(PullRequestEvent),
    ReviewComment(ReviewCommentEvent),
}

/// Errors decoding a raw webhook delivery
#[derive(Error, Debug)]
pub enum EventDecodeError {
    #[error("unsupported webhook event: {0}")]
    Unsupported(String),

    #[error("invalid {event} payload: {source}")]
    Json {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GitHubEvent {
    /// Decode a webhook body given its `X-GitHub-Event` name.
    pub fn from_webhook(event_name: &str, body: &str) -> Result<Self, EventDecodeError> {
        let json_err = |source| EventDecodeError::Json {
            event: event_name.to_string(),
            source,
        };
        match event_name {
            "issues" | "issue_comment" => serde_json::from_str(body)
                .map(Self::Issue)
                .map_err(json_err),
            "pull_request" => serde_json::from_str(body)
                .map(Self::PullRequest)
                .map_err(json_err),
            "pull_request_review_comment" => serde_json::from_str(body)
                .map(Self::ReviewComment)
                .map_err(json_err),
            other => Err(EventDecodeError::Unsupported(other.to_string())),
        }
    }

    /// Webhook name this event corresponds to.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Issue(e) if e.comment.is_some() => "issue_comment",
            Self::Issue(_) => "issues",
            Self::PullRequest(_) => "pull_request",
            Self::ReviewComment(_) => "pull_request_review_comment",
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Issue(e) => &e.action,
            Self::PullRequest(e) => &e.action,
            Self::ReviewComment(e) => &e.action,
        }
    }

    pub fn repository(&self) -> Option<&Repository> {
        match self {
            Self::Issue(e) => e.repository.as_ref(),
            Self::PullRequest(e) => e.repository.as_ref(),
            Self::ReviewComment(e) => e.repository.as_ref(),
        }
    }

    /// User who triggered the delivery.
    pub fn sender(&self) -> Option<&User> {
        match self {
            Self::Issue(e) => e.sender.as_ref(),
            Self::PullRequest(e) => e.sender.as_ref(),
            Self::ReviewComment(e) => e.sender.as_ref(),
        }
    }

    /// The pull request carried by the event, if any.
    pub fn pull_request(&self) -> Option<&PullRequest> {
        match self {
            Self::Issue(_) => None,
            Self::PullRequest(e) => e.pull_request.as_ref(),
            Self::ReviewComment(e) => e.pull_request.as_ref(),
        }
    }

    /// The issue carried by the event, if any.
    pub fn issue(&self) -> Option<&Issue> {
        match self {
            Self::Issue(e) => e.issue.as_ref(),
            Self::PullRequest(_) | Self::ReviewComment(_) => None,
        }
    }
}
