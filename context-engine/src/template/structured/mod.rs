//! Structured template language: `{{.NAME}}` actions over a [`Value`] tree.
//!
//! Supports field chains, literals, function calls, pipelines, parenthesized
//! sub-expressions, `if`/`else if`/`else`, `range` (with `else`), `with`,
//! comments and `{{-`/`-}}` whitespace trimming.
//!
//! Unknown functions are rejected while parsing; unknown fields and bad
//! arguments fail during execution.

pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use functions::{Clock, FixedClock, FunctionLibrary, SystemClock, BUILTINS};
pub use value::Value;

use crate::template::error::{TemplateError, TemplateResult};
use thiserror::Error;

/// Malformed template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {offset}: {message}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset of the action that failed.
    pub offset: usize,
    /// Undefined function name, when that is the cause.
    pub name: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Failure while executing a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {offset}: {message}")]
pub struct ExecError {
    pub message: String,
    pub offset: usize,
    /// Field or function involved.
    pub name: Option<String>,
}

impl ExecError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl SyntaxError {
    fn into_template_error(self, src: &str) -> TemplateError {
        let mut err = TemplateError::parse(self.to_string()).with_template(src);
        if let Some(name) = self.name {
            err = err.with_variable(name);
        }
        err
    }
}

impl ExecError {
    fn into_template_error(self, src: &str) -> TemplateError {
        let mut err = TemplateError::execute(self.to_string()).with_template(src);
        if let Some(name) = self.name {
            err = err.with_variable(name);
        }
        err
    }
}

/// Parsed template, reusable across renders.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    nodes: Vec<parser::Node>,
}

impl Template {
    pub fn parse(src: &str) -> TemplateResult<Self> {
        let nodes = lexer::lex(src)
            .and_then(parser::parse)
            .map_err(|e| e.into_template_error(src))?;
        Ok(Self {
            source: src.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn execute(&self, data: &Value, functions: &FunctionLibrary) -> TemplateResult<String> {
        eval::Evaluator::new(data, functions)
            .render(&self.nodes)
            .map_err(|e| e.into_template_error(&self.source))
    }
}

/// Parses and executes structured templates with a shared function library.
#[derive(Debug, Clone, Default)]
pub struct StructuredEngine {
    functions: FunctionLibrary,
}

impl StructuredEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` for `timeAgo`.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            functions: FunctionLibrary::with_clock(clock),
        }
    }

    pub fn functions(&self) -> &FunctionLibrary {
        &self.functions
    }

    /// Parse and execute `src` against `data`.
    pub fn render(&self, src: &str, data: &Value) -> TemplateResult<String> {
        Template::parse(src)?.execute(data, &self.functions)
    }
}
