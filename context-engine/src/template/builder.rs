//! Event normalization into [`GitHubTemplateData`] plus completeness checks

use crate::model::{
    GitHubEvent, Issue, IssueEvent, PullRequest, PullRequestEvent, ReviewComment,
    ReviewCommentEvent, User,
};
use crate::template::data::{rfc3339, GitHubTemplateData};
use crate::template::error::{TemplateError, TemplateResult};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Normalize an inbound event, then log any required-but-empty fields.
///
/// Fails with a `build` error only when no event is given; missing nested
/// payload pieces yield empty fields.
pub fn build_template_data_with_validation(
    event: Option<&GitHubEvent>,
) -> TemplateResult<GitHubTemplateData> {
    let event = event.ok_or_else(|| TemplateError::build("event is required"))?;
    let data = build_template_data(event);

    let missing = validate_template_data(&data);
    if missing.is_empty() {
        debug!(event_type = %data.event_type, "Template data complete");
    } else {
        warn!(
            event_type = %data.event_type,
            missing = ?missing,
            "Template data missing required fields"
        );
    }
    Ok(data)
}

/// Normalize an event without validation.
pub fn build_template_data(event: &GitHubEvent) -> GitHubTemplateData {
    let mut data = GitHubTemplateData {
        event_type: event.event_type().to_string(),
        event_action: event.action().to_string(),
        ..Default::default()
    };
    if let Some(repo) = event.repository() {
        data.repository = repo.full_name.clone();
    }
    data.trigger_user = login(event.sender());

    match event {
        GitHubEvent::Issue(e) => fill_issue_event(&mut data, e),
        GitHubEvent::PullRequest(e) => fill_pull_request_event(&mut data, e),
        GitHubEvent::ReviewComment(e) => fill_review_comment_event(&mut data, e),
    }

    if data.base_branch.is_empty() {
        if let Some(repo) = event.repository() {
            data.base_branch = repo.default_branch.clone();
        }
    }
    data
}

/// Names of required fields that are empty for the active event kind.
pub fn validate_template_data(data: &GitHubTemplateData) -> Vec<&'static str> {
    let mut checks = vec![
        ("GITHUB_REPOSITORY", &data.repository),
        ("GITHUB_EVENT_TYPE", &data.event_type),
        ("GITHUB_TRIGGER_USER", &data.trigger_user),
    ];
    if data.is_issue {
        checks.push(("GITHUB_ISSUE_AUTHOR", &data.issue_author));
        checks.push(("GITHUB_ISSUE_TITLE", &data.issue_title));
    }
    if data.is_pr {
        checks.push(("GITHUB_PR_AUTHOR", &data.pr_author));
        checks.push(("GITHUB_PR_TITLE", &data.pr_title));
        checks.push(("GITHUB_BRANCH_NAME", &data.branch_name));
    }
    checks
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
}

/// `lines a-b` for multi-line ranges, `line n` for a single line.
pub fn describe_line_range(start_line: Option<u64>, line: Option<u64>) -> String {
    match (start_line, line) {
        (Some(start), Some(end)) if start != end => format!("lines {start}-{end}"),
        (_, Some(line)) => format!("line {line}"),
        (Some(start), None) => format!("line {start}"),
        (None, None) => String::new(),
    }
}

fn login(user: Option<&User>) -> String {
    user.map(|u| u.login.clone()).unwrap_or_default()
}

fn timestamp(t: Option<&DateTime<Utc>>) -> String {
    t.map(rfc3339).unwrap_or_default()
}

fn number(n: u64) -> String {
    if n == 0 {
        String::new()
    } else {
        n.to_string()
    }
}

fn fill_issue_event(data: &mut GitHubTemplateData, event: &IssueEvent) {
    if let Some(issue) = &event.issue {
        if issue.is_pull_request() {
            // issue_comment deliveries on a pull request
            data.is_pr = true;
            data.pr_number = number(issue.number);
            data.pr_title = issue.title.clone();
            data.pr_body = issue.body.clone().unwrap_or_default();
            data.pr_author = login(issue.user.as_ref());
            data.pr_state = issue.state.clone();
            data.pr_url = issue.html_url.clone();
            data.labels = label_names(issue);
        } else {
            fill_issue(data, issue);
        }
        data.created_at = timestamp(issue.created_at.as_ref());
        data.updated_at = timestamp(issue.updated_at.as_ref());
    }

    if let Some(comment) = &event.comment {
        data.comment_id = number(comment.id);
        data.comment_body = comment.body.clone();
        data.comment_author = login(comment.user.as_ref());
        data.comment_url = comment.html_url.clone();
        if comment.created_at.is_some() {
            data.created_at = timestamp(comment.created_at.as_ref());
            data.updated_at = timestamp(comment.updated_at.as_ref());
        }
        if data.trigger_user.is_empty() {
            data.trigger_user = data.comment_author.clone();
        }
    }

    if data.trigger_user.is_empty() {
        data.trigger_user = data.issue_author.clone();
    }
}

fn fill_issue(data: &mut GitHubTemplateData, issue: &Issue) {
    data.is_issue = true;
    data.issue_number = number(issue.number);
    data.issue_title = issue.title.clone();
    data.issue_body = issue.body.clone().unwrap_or_default();
    data.issue_author = login(issue.user.as_ref());
    data.issue_state = issue.state.clone();
    data.issue_url = issue.html_url.clone();
    data.labels = label_names(issue);
}

fn label_names(issue: &Issue) -> Vec<String> {
    issue.labels.iter().map(|l| l.name.clone()).collect()
}

fn fill_pull_request(data: &mut GitHubTemplateData, pr: &PullRequest) {
    data.is_pr = true;
    data.pr_number = number(pr.number);
    data.pr_title = pr.title.clone();
    data.pr_body = pr.body.clone().unwrap_or_default();
    data.pr_author = login(pr.user.as_ref());
    data.pr_state = pr.state.clone();
    data.pr_url = pr.html_url.clone();
    data.pr_draft = pr.draft;
    data.pr_additions = pr.additions.to_string();
    data.pr_deletions = pr.deletions.to_string();
    data.pr_changed_files = pr.changed_files.to_string();
    data.labels = pr.labels.iter().map(|l| l.name.clone()).collect();
    if let Some(head) = &pr.head {
        data.branch_name = head.ref_name.clone();
        data.head_sha = head.sha.clone();
    }
    if let Some(base) = &pr.base {
        data.base_branch = base.ref_name.clone();
    }
    data.created_at = timestamp(pr.created_at.as_ref());
    data.updated_at = timestamp(pr.updated_at.as_ref());
}

fn fill_pull_request_event(data: &mut GitHubTemplateData, event: &PullRequestEvent) {
    match &event.pull_request {
        Some(pr) => fill_pull_request(data, pr),
        None => {
            data.is_pr = true;
            data.pr_number = number(event.number);
        }
    }
    if data.trigger_user.is_empty() {
        data.trigger_user = data.pr_author.clone();
    }
}

fn fill_review_comment(data: &mut GitHubTemplateData, comment: &ReviewComment) {
    data.comment_id = number(comment.id);
    data.comment_body = comment.body.clone();
    data.comment_author = login(comment.user.as_ref());
    data.comment_url = comment.html_url.clone();
    data.file_path = comment.path.clone();

    let line = comment.line.or(comment.original_line);
    data.line_number = line.map(|l| l.to_string()).unwrap_or_default();
    data.start_line = comment
        .start_line
        .map(|l| l.to_string())
        .unwrap_or_default();
    data.line_range = describe_line_range(comment.start_line, line);
    data.diff_hunk = comment.diff_hunk.clone();
    data.commit_id = comment.commit_id.clone();
    if comment.created_at.is_some() {
        data.created_at = timestamp(comment.created_at.as_ref());
        data.updated_at = timestamp(comment.updated_at.as_ref());
    }
}

fn fill_review_comment_event(data: &mut GitHubTemplateData, event: &ReviewCommentEvent) {
    // PR first so the comment's timestamps win
    match &event.pull_request {
        Some(pr) => fill_pull_request(data, pr),
        None => data.is_pr = true,
    }
    if let Some(comment) = &event.comment {
        fill_review_comment(data, comment);
    }
    if data.trigger_user.is_empty() {
        data.trigger_user = data.comment_author.clone();
    }
}
