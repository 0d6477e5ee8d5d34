//! Prompt modes: which built-in template and task framing a render uses.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which built-in prompt template and task framing to use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Pick up where a previous run stopped.
    Continue,
    /// Fix a reported defect.
    Fix,
    /// Implement requested code.
    Code,
    /// Review a pull request.
    Review,
    #[default]
    General,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Continue,
        Mode::Fix,
        Mode::Code,
        Mode::Review,
        Mode::General,
    ];
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Fix => write!(f, "fix"),
            Self::Code => write!(f, "code"),
            Self::Review => write!(f, "review"),
            Self::General => write!(f, "general"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode: {0} (expected continue, fix, code, review or general)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "fix" => Ok(Self::Fix),
            "code" => Ok(Self::Code),
            "review" => Ok(Self::Review),
            "general" | "" => Ok(Self::General),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
