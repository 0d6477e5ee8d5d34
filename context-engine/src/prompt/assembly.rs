//! Section-ordered prompt composition

use crate::formatter::ContextFormatter;
use crate::model::{ContextType, EnhancedContext};
use crate::prompt::catalog;
use crate::template::Mode;
use tracing::debug;

/// Builder for the final prompt.
///
/// Sections are always emitted in this order: role, context, task, output
/// requirements, constraints. An empty context section is omitted.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    mode: Mode,
    context_type: ContextType,
    role: String,
    context: Option<String>,
    instruction: Option<String>,
    extra_constraints: Vec<String>,
}

impl PromptBuilder {
    /// Create a builder with the default role and no context.
    pub fn new(mode: Mode, context_type: ContextType) -> Self {
        Self {
            mode,
            context_type,
            role: catalog::SYSTEM_ROLE.to_string(),
            context: None,
            instruction: None,
            extra_constraints: Vec::new(),
        }
    }

    /// Builder whose context section is `ctx` trimmed to the default budget.
    pub fn for_context(ctx: &EnhancedContext, mode: Mode) -> Self {
        Self::for_context_with(&ContextFormatter::default(), ctx, mode)
    }

    /// Builder whose context section is `ctx` trimmed to `formatter`'s budget.
    pub fn for_context_with(
        formatter: &ContextFormatter,
        ctx: &EnhancedContext,
        mode: Mode,
    ) -> Self {
        let (trimmed, markdown) = formatter.format_trimmed(ctx);
        debug!(
            %mode,
            budget = formatter.max_tokens(),
            tokens = trimmed.token_count,
            files = trimmed.file_count(),
            comments = trimmed.comments.len(),
            "Prepared prompt context"
        );
        Self::new(mode, ctx.context_type).with_context(markdown)
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Free-form instruction appended verbatim to the task section.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Add a constraint after the general and context-type rules.
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.extra_constraints.push(constraint.into());
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Build the prompt string
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.role.trim_end());
        prompt.push_str("\n\n");

        if let Some(context) = self.context.as_deref().filter(|c| !c.trim().is_empty()) {
            prompt.push_str("# Context\n\n");
            prompt.push_str(context.trim_end());
            prompt.push_str("\n\n");
        }

        prompt.push_str("# Task\n\n");
        prompt.push_str(catalog::task_description(self.mode));
        if let Some(instruction) = self.instruction.as_deref().filter(|i| !i.trim().is_empty()) {
            prompt.push_str("\n\n");
            prompt.push_str(instruction);
        }
        prompt.push_str("\n\n");

        prompt.push_str("# Output Requirements\n\n");
        for item in catalog::output_requirements(self.mode) {
            prompt.push_str(&format!("- {item}\n"));
        }
        prompt.push('\n');

        prompt.push_str("# Constraints\n\n");
        let constraints = catalog::GENERAL_CONSTRAINTS
            .iter()
            .chain(catalog::context_constraints(self.context_type))
            .map(|c| c.to_string())
            .chain(self.extra_constraints.iter().cloned());
        for constraint in constraints {
            prompt.push_str(&format!("- {constraint}\n"));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommentContext, ContextMetadata};
    use chrono::{TimeZone, Utc};

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found"))
    }

    #[test]
    fn test_section_order() {
        let prompt = PromptBuilder::new(Mode::Fix, ContextType::Issue)
            .with_context("## Context\n\n**Type:** Issue")
            .build();
        let role = position(&prompt, "autonomous coding assistant");
        let context = position(&prompt, "# Context");
        let task = position(&prompt, "# Task");
        let output = position(&prompt, "# Output Requirements");
        let constraints = position(&prompt, "# Constraints");
        assert!(role < context && context < task && task < output && output < constraints);
    }

    #[test]
    fn test_instruction_injected_verbatim() {
        let instruction = "Please handle `$weird` {{chars}} *exactly*";
        let prompt = PromptBuilder::new(Mode::Code, ContextType::Issue)
            .with_instruction(instruction)
            .build();
        assert!(prompt.contains(instruction));
        assert!(prompt.contains(catalog::task_description(Mode::Code)));
    }

    #[test]
    fn test_empty_context_omitted() {
        let prompt = PromptBuilder::new(Mode::General, ContextType::Issue)
            .with_context("   ")
            .build();
        assert!(!prompt.contains("# Context"));
    }

    #[test]
    fn test_constraints_layered_by_context_type() {
        let prompt = PromptBuilder::new(Mode::Review, ContextType::ReviewComment)
            .with_constraint("Keep replies short")
            .build();
        let general = position(&prompt, catalog::GENERAL_CONSTRAINTS[0]);
        let specific = position(
            &prompt,
            catalog::context_constraints(ContextType::ReviewComment)[0],
        );
        let extra = position(&prompt, "Keep replies short");
        assert!(general < specific && specific < extra);
        assert!(!prompt.contains(catalog::context_constraints(ContextType::Issue)[0]));
    }

    #[test]
    fn test_for_context_uses_trimmed_markdown() {
        let t = |h| Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap();
        let ctx = EnhancedContext::new(ContextType::Issue, t(0))
            .with_metadata(ContextMetadata {
                issue_number: Some(31),
                ..Default::default()
            })
            .with_comments(vec![
                CommentContext::new(1, "alice", "first", t(1)),
                CommentContext::new(2, "bob", "x".repeat(400), t(2)),
            ]);
        let prompt = PromptBuilder::for_context(&ctx, Mode::Fix).build();
        assert!(prompt.contains("**Issue:** #31"));
        assert!(prompt.contains("**alice**"));
        // Trimming clips bodies to 300 chars before display clipping
        assert!(!prompt.contains(&"x".repeat(301)));
    }
}
