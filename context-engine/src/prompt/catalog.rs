//! Fixed prompt text: mode templates and assembly sections.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any text here changes so
//! a rendered prompt can be traced back to the catalog that produced it.
//!
//! Mode templates use `$NAME` placeholders from
//! [`CATALOG_VARIABLES`](crate::template::CATALOG_VARIABLES) only.

use crate::model::ContextType;
use crate::template::Mode;

/// Catalog version. Bump on any content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Role description placed first in every assembled prompt.
pub const SYSTEM_ROLE: &str = "\
You are an autonomous coding assistant working on a GitHub repository. \
You receive a summary of recent activity (issues, pull requests, review comments) \
and a task. You read the relevant code, make focused changes, and explain what you did.";

const CONTINUE_TEMPLATE: &str = "\
# Continue Work on $REPOSITORY

Mode: $MODE | Context: $CONTEXT_TYPE | Priority: $PRIORITY

## Where Things Stand
Issue #$ISSUE_NUMBER: $ISSUE_TITLE
Pull request #$PR_NUMBER: $PR_TITLE ($HEAD_BRANCH -> $BASE_BRANCH)

$FORMATTED_CONTEXT

## Recent Discussion ($COMMENT_COUNT comments)
$COMMENTS

## Instructions
Pick up from the most recent state of the work above. \
Requested by @$TRIGGER_USER: $ARGS
";

const FIX_TEMPLATE: &str = "\
# Fix Request for $REPOSITORY

Mode: $MODE | Context: $CONTEXT_TYPE | Priority: $PRIORITY

## Problem
Issue #$ISSUE_NUMBER: $ISSUE_TITLE (reported by @$ISSUE_AUTHOR)

$ISSUE_BODY

## Collected Context
$FORMATTED_CONTEXT

## Changed Files ($FILE_COUNT, +$TOTAL_ADDITIONS/-$TOTAL_DELETIONS)
$CHANGED_FILES

## Instructions
Find the root cause and fix it on a branch based on $BASE_BRANCH. \
Requested by @$TRIGGER_USER: $ARGS
";

const CODE_TEMPLATE: &str = "\
# Implementation Request for $REPOSITORY

Mode: $MODE | Context: $CONTEXT_TYPE | Priority: $PRIORITY

## Request
$TRIGGER_COMMENT

## Background
Issue #$ISSUE_NUMBER: $ISSUE_TITLE
$ISSUE_BODY

$FORMATTED_CONTEXT

## Instructions
Implement the requested change against $BASE_BRANCH. \
Requested by @$TRIGGER_USER: $ARGS
";

const REVIEW_TEMPLATE: &str = "\
# Review Pull Request #$PR_NUMBER in $REPOSITORY

Mode: $MODE | Context: $CONTEXT_TYPE | Priority: $PRIORITY
Is pull request: $IS_PR

## Pull Request
$PR_TITLE by @$PR_AUTHOR ($HEAD_BRANCH -> $BASE_BRANCH)

$PR_BODY

## Changed Files ($FILE_COUNT, +$TOTAL_ADDITIONS/-$TOTAL_DELETIONS)
$CHANGED_FILES

## Discussion ($COMMENT_COUNT comments)
$COMMENTS

$FORMATTED_CONTEXT

## Instructions
Review the changes for correctness, clarity and test coverage. \
Requested by @$TRIGGER_USER: $ARGS
";

const GENERAL_TEMPLATE: &str = "\
# Request for $REPOSITORY

Mode: $MODE | Context: $CONTEXT_TYPE | Priority: $PRIORITY

$FORMATTED_CONTEXT

## Instructions
Requested by @$TRIGGER_USER: $ARGS
";

/// Long-form `$NAME` template for `mode`.
pub fn mode_template(mode: Mode) -> &'static str {
    match mode {
        Mode::Continue => CONTINUE_TEMPLATE,
        Mode::Fix => FIX_TEMPLATE,
        Mode::Code => CODE_TEMPLATE,
        Mode::Review => REVIEW_TEMPLATE,
        Mode::General => GENERAL_TEMPLATE,
    }
}

/// Task framing for `mode`, used when no free-form instruction is given.
pub fn task_description(mode: Mode) -> &'static str {
    match mode {
        Mode::Continue => {
            "Continue the work already in progress. Re-read the latest comments, \
             determine what remains, and finish it without redoing completed steps."
        }
        Mode::Fix => {
            "Diagnose and fix the reported problem. Reproduce it where possible, \
             identify the root cause, and make the smallest change that resolves it."
        }
        Mode::Code => {
            "Implement the requested functionality. Follow the existing structure \
             and conventions of the repository."
        }
        Mode::Review => {
            "Review the pull request. Point out bugs, risky changes, missing tests \
             and unclear code, citing file and line where possible."
        }
        Mode::General => "Address the request described in the context above.",
    }
}

/// Output requirements for `mode`.
pub fn output_requirements(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Continue => &[
            "Summarize what was already done and what you completed now",
            "List every file you changed",
            "Call out anything still left open",
        ],
        Mode::Fix => &[
            "Explain the root cause in one or two sentences",
            "Describe the fix and list every file you changed",
            "Add or update a test that fails without the fix",
        ],
        Mode::Code => &[
            "Describe the implementation approach briefly",
            "List every file you added or changed",
            "Include tests for the new behavior",
        ],
        Mode::Review => &[
            "Start with an overall verdict: approve, comment or request changes",
            "Group findings by file, most severe first",
            "Quote the relevant lines for each finding",
        ],
        Mode::General => &[
            "Answer directly and concisely",
            "List any files you changed",
        ],
    }
}

/// Rules applied to every prompt.
pub const GENERAL_CONSTRAINTS: &[&str] = &[
    "Do not push directly to the default branch",
    "Keep changes focused on the request; avoid unrelated refactors",
    "Do not commit secrets, credentials or generated artifacts",
    "If the request is ambiguous, state your assumption before acting",
];

/// Additional rules for a context type.
pub fn context_constraints(context_type: ContextType) -> &'static [&'static str] {
    match context_type {
        ContextType::Issue => &["Reference the issue number in your summary"],
        ContextType::PullRequest => &[
            "Work on the pull request's head branch",
            "Do not rewrite history that reviewers have already seen",
        ],
        ContextType::PrComment => &["Respond to the comment that triggered this request"],
        ContextType::ReviewComment => &[
            "Limit changes to the lines under review unless the fix requires more",
            "Reply to the review thread with what changed",
        ],
        ContextType::Review => &["Address every requested change from the review"],
    }
}
