use anyhow::Result;
use clap::{Parser, Subcommand};
use context_engine::{Mode, PROMPT_VERSION};
use prompt_agent::commands::{self, PromptRequest};
use prompt_agent::config::{self, CliOverrides};
use prompt_agent::input;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Token budget for context trimming (overrides PROMPT_MAX_TOKENS)
    #[arg(long, global = true)]
    max_tokens: Option<i64>,

    /// Mode used when a command does not name one (overrides PROMPT_DEFAULT_MODE)
    #[arg(long, global = true)]
    default_mode: Option<Mode>,

    /// Fallback base branch when the context names none
    #[arg(long, global = true)]
    base_branch: Option<String>,

    /// Fail on structured template errors instead of falling back
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a mode prompt from a collected context
    Prompt {
        /// Context JSON file
        #[arg(long)]
        context: PathBuf,

        /// continue, fix, code, review or general (defaults to the configured mode)
        #[arg(long)]
        mode: Option<Mode>,

        /// Free-form request text appended to the prompt
        #[arg(long, default_value = "")]
        args: String,

        /// Emit the sectioned prompt instead of the mode template
        #[arg(long, default_value_t = false)]
        assemble: bool,
    },

    /// Render a free-form template against a webhook event
    Render {
        /// Webhook body JSON file
        #[arg(long)]
        event: PathBuf,

        /// X-GitHub-Event name (issues, issue_comment, pull_request, ...)
        #[arg(long)]
        event_name: String,

        /// Template text
        #[arg(long, conflicts_with = "template_file")]
        template: Option<String>,

        /// Read the template from a file
        #[arg(long)]
        template_file: Option<PathBuf>,

        /// Context JSON used to fill file and comment lists
        #[arg(long)]
        context: Option<PathBuf>,
    },

    /// Check a webhook event for required template fields
    Validate {
        #[arg(long)]
        event: PathBuf,

        #[arg(long)]
        event_name: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let overrides = CliOverrides {
        max_tokens: args.max_tokens,
        default_mode: args.default_mode,
        base_branch: args.base_branch.clone(),
        strict: args.strict,
    };
    let config = config::load(args.config.as_deref(), &overrides)?;
    info!(
        version = PROMPT_VERSION,
        max_tokens = config.resolved_max_tokens(),
        "prompt-agent starting"
    );

    let output = match args.command {
        Command::Prompt {
            context,
            mode,
            args: request,
            assemble,
        } => {
            let ctx = input::load_context(&context)?;
            commands::prompt(
                &config,
                &ctx,
                &PromptRequest {
                    mode,
                    args: request,
                    assemble,
                },
            )?
        }
        Command::Render {
            event,
            event_name,
            template,
            template_file,
            context,
        } => {
            let event = input::load_event(&event, &event_name)?;
            let ctx = context.as_deref().map(input::load_context).transpose()?;
            let template = input::template_text(template.as_deref(), template_file.as_deref())?;
            commands::render(&config, &event, ctx.as_ref(), &template)?
        }
        Command::Validate { event, event_name } => {
            let event = input::load_event(&event, &event_name)?;
            commands::validate(&event)?
        }
    };

    println!("{output}");
    Ok(())
}
