//! Normalized representations of collected GitHub activity.
//!
//! Instances are assembled once per inbound event by the collector and are
//! read-only afterwards. The formatter's trim step produces a new
//! [`EnhancedContext`] rather than editing one in place.

pub mod context;
pub mod event;

pub use context::{
    coerce_to_string, ChangeTotals, CodeContext, CommentContext, CommentKind, ContextMetadata,
    ContextType, EnhancedContext, FileChange, FileStatus, Priority, ReviewState,
};
pub use event::{
    BranchRef, Comment, EventDecodeError, GitHubEvent, Issue, IssueEvent, IssuePullRequestLink,
    Label, PullRequest, PullRequestEvent, Repository, ReviewComment, ReviewCommentEvent, User,
};
