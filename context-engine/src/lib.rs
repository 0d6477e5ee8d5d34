//! GitHub Activity Context Engine
//!
//! This library turns collected GitHub activity into prompts for a coding agent:
//! - A normalized context model for issues, pull requests and review comments
//! - A Markdown formatter with token-budget trimming
//! - Template variables built from a context or straight from a webhook event
//! - A renderer accepting both `$NAME` and `{{.NAME}}` placeholder syntaxes
//! - Section-ordered prompt assembly
//!
//! # Pipeline
//!
//! ```text
//! EnhancedContext ──trim──► EnhancedContext ──format──► Markdown
//!        │                                                  │
//!        └──────────► variables ◄───────────────────────────┘
//!                         │
//!                 mode template / free-form ──render──► prompt text
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use context_engine::{ContextType, EnhancedContext, Mode, TemplateRenderer};
//!
//! let ctx = EnhancedContext::new(ContextType::Issue, chrono::Utc::now());
//! let prompt = TemplateRenderer::new()
//!     .render_mode(&ctx, Mode::Fix, "please look at the crash")
//!     .unwrap();
//! println!("{prompt}");
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod formatter;
pub mod model;
pub mod prompt;
pub mod template;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export context model types
pub use model::{
    CodeContext, CommentContext, CommentKind, ContextMetadata, ContextType, EnhancedContext,
    FileChange, FileStatus, GitHubEvent, Priority, ReviewState,
};

// Re-export formatter types
pub use formatter::{estimate_tokens, ContextFormatter, DEFAULT_MAX_TOKENS};

// Re-export template types
pub use template::{
    build_template_data, build_template_data_with_validation, build_variables,
    render_free_form, render_free_form_strict, GitHubTemplateData, Mode, RenderOutcome,
    RenderStrategy, TemplateError, TemplateErrorKind, TemplateRenderer, TemplateResult,
    VariableBuilder,
};

// Re-export prompt assembly
pub use prompt::{PromptBuilder, PROMPT_VERSION};
