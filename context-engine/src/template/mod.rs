//! Template layer: variable building, event normalization and rendering.
//!
//! Two placeholder syntaxes are supported:
//! - literal `$NAME` over a name → text map ([`literal`])
//! - structured `{{.NAME}}` with conditionals, loops and functions ([`structured`])

pub mod builder;
pub mod data;
pub mod error;
pub mod literal;
pub mod mode;
pub mod renderer;
pub mod structured;
pub mod variables;

pub use builder::{
    build_template_data, build_template_data_with_validation, describe_line_range,
    validate_template_data,
};
pub use data::{CommentSummary, FileSummary, GitHubTemplateData};
pub use error::{TemplateError, TemplateErrorKind, TemplateResult};
pub use mode::{Mode, ParseModeError};
pub use renderer::{
    has_structured_syntax, render_free_form, render_free_form_strict, select_template,
    RenderOutcome, RenderStrategy, TemplateRenderer,
};
pub use structured::{Clock, FixedClock, StructuredEngine, SystemClock};
pub use variables::{build_variables, VariableBuilder, CATALOG_VARIABLES, FORMAT_ERROR_MARKER};
