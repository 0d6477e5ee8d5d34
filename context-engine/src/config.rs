//! Engine configuration
//!
//! Parsed from TOML text, then overridden by `PROMPT_*` environment
//! variables. Reading the file is left to the caller.
//!
//! ```toml
//! max_tokens = 30000
//! default_mode = "review"
//! default_base_branch = "develop"
//! strict_templates = false
//!
//! [templates]
//! fix = "Fix {{.ISSUE_TITLE}} in $REPOSITORY"
//! ```

use crate::formatter::{resolve_max_tokens, ContextFormatter, DEFAULT_MAX_TOKENS};
use crate::template::{Mode, TemplateRenderer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const ENV_MAX_TOKENS: &str = "PROMPT_MAX_TOKENS";
pub const ENV_DEFAULT_MODE: &str = "PROMPT_DEFAULT_MODE";
pub const ENV_STRICT_TEMPLATES: &str = "PROMPT_STRICT_TEMPLATES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Token budget; zero or negative means the default (50000).
    pub max_tokens: i64,
    pub default_mode: Mode,
    pub default_base_branch: String,
    /// Fail free-form rendering on structured errors instead of falling back.
    pub strict_templates: bool,
    /// Per-mode template overrides, keyed by mode name.
    pub templates: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS as i64,
            default_mode: Mode::General,
            default_base_branch: "main".to_string(),
            strict_templates: false,
            templates: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.template_overrides()?;
        Ok(config)
    }

    /// Template overrides keyed by parsed mode.
    pub fn template_overrides(&self) -> Result<BTreeMap<Mode, String>, ConfigError> {
        self.templates
            .iter()
            .map(|(key, template)| {
                let mode = key
                    .parse()
                    .map_err(|e| invalid(&format!("templates.{key}"), key, e))?;
                Ok((mode, template.clone()))
            })
            .collect()
    }

    /// Apply `PROMPT_*` overrides from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_MAX_TOKENS) {
            self.max_tokens = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(ENV_MAX_TOKENS, &value, e))?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_MODE) {
            self.default_mode = value
                .parse()
                .map_err(|e| invalid(ENV_DEFAULT_MODE, &value, e))?;
        }
        if let Some(value) = lookup(ENV_STRICT_TEMPLATES) {
            self.strict_templates = parse_bool(&value)
                .ok_or_else(|| invalid(ENV_STRICT_TEMPLATES, &value, "expected true or false"))?;
        }
        Ok(self)
    }

    /// Effective budget after resolving non-positive values.
    pub fn resolved_max_tokens(&self) -> usize {
        resolve_max_tokens(self.max_tokens)
    }

    pub fn formatter(&self) -> ContextFormatter {
        ContextFormatter::new().with_max_tokens(self.max_tokens)
    }

    /// Renderer carrying this config's budget, base branch and overrides.
    pub fn renderer(&self) -> Result<TemplateRenderer, ConfigError> {
        Ok(TemplateRenderer::new()
            .with_formatter(self.formatter())
            .with_default_base_branch(self.default_base_branch.clone())
            .with_overrides(self.template_overrides()?))
    }
}

fn invalid(key: &str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
