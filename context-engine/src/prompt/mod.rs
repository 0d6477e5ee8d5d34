//! Prompt assembly and the fixed prompt text catalog.

pub mod assembly;
pub mod catalog;

pub use assembly::PromptBuilder;
pub use catalog::PROMPT_VERSION;
