use anyhow::{Context, Result};
use context_engine::{EngineConfig, Mode};
use std::path::Path;
use tracing::debug;

/// Flag values that override the file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_tokens: Option<i64>,
    pub default_mode: Option<Mode>,
    pub base_branch: Option<String>,
    pub strict: bool,
}

/// Resolve configuration: defaults, then the TOML file (if any), then
/// `PROMPT_*` environment variables, then command-line flags.
pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => read_config_file(path)?,
        None => EngineConfig::default(),
    };
    let config = config
        .apply_env_overrides()
        .context("Invalid PROMPT_* environment override")?;
    let config = apply_cli(config, overrides);

    debug!(
        max_tokens = config.resolved_max_tokens(),
        default_mode = %config.default_mode,
        strict = config.strict_templates,
        overrides = config.templates.len(),
        "Configuration resolved"
    );
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<EngineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_toml_str(&contents)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn apply_cli(mut config: EngineConfig, overrides: &CliOverrides) -> EngineConfig {
    if let Some(max_tokens) = overrides.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(mode) = overrides.default_mode {
        config.default_mode = mode;
    }
    if let Some(branch) = &overrides.base_branch {
        config.default_base_branch = branch.clone();
    }
    if overrides.strict {
        config.strict_templates = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_values() {
        let config = EngineConfig {
            max_tokens: 9000,
            ..Default::default()
        };
        let config = apply_cli(
            config,
            &CliOverrides {
                max_tokens: Some(1500),
                default_mode: Some(Mode::Review),
                base_branch: Some("develop".into()),
                strict: true,
            },
        );
        assert_eq!(config.max_tokens, 1500);
        assert_eq!(config.default_mode, Mode::Review);
        assert_eq!(config.default_base_branch, "develop");
        assert!(config.strict_templates);
    }

    #[test]
    fn test_absent_flags_keep_values() {
        let config = EngineConfig {
            strict_templates: true,
            ..Default::default()
        };
        let config = apply_cli(config, &CliOverrides::default());
        assert!(config.strict_templates);
        assert_eq!(config.default_mode, Mode::General);
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prompt-agent.toml");
        std::fs::write(&path, "default_base_branch = \"trunk\"\n").unwrap();
        let config = read_config_file(&path).unwrap();
        assert_eq!(config.default_base_branch, "trunk");

        let err = read_config_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"), "{err}");
    }
}
