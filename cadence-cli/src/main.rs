use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod auth;
mod config;
mod explain;
mod llm;
mod mood_intake;
mod sim;
mod state;

#[derive(Parser, Debug)]
#[command(name = "cadence", version, about = "Personal task-prioritization simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the day-by-day scheduling simulation over a task list
    Simulate {
        /// Path to the task list JSON
        tasks: PathBuf,

        /// Start time "YYYY-MM-DD HH:MM" (default: today 09:00)
        #[arg(long)]
        start: Option<String>,

        /// Directory for per-step snapshots and final results
        #[arg(long, default_value = "score_output")]
        output_dir: PathBuf,

        /// Override the configured urgency weight
        #[arg(long)]
        urgency_weight: Option<f64>,

        /// Override the configured importance weight
        #[arg(long)]
        importance_weight: Option<f64>,

        /// Override the configured mood weight
        #[arg(long)]
        mood_weight: Option<f64>,

        /// Always work on the top-ranked task instead of prompting
        #[arg(long)]
        auto: bool,

        /// Stop after this many work steps (useful with --auto)
        #[arg(long)]
        max_steps: Option<usize>,

        /// Note to run through the mood collaborator before starting
        #[arg(long)]
        mood_note: Option<String>,

        /// Ask the explanation collaborator to narrate each step's ranking
        #[arg(long)]
        explain: bool,
    },

    /// Rank a snapshot and explain its priorities in plain language
    Explain {
        /// Snapshot JSON written by a simulation run
        snapshot: PathBuf,

        /// Also save the explanation text here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Extract per-task mood scores from a written note
    Mood {
        /// How the user is feeling, in their own words
        note: String,

        /// Task list JSON used to constrain the event names
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Also save the reports JSON here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a default config file to ~/.cadence/config.toml
    InitConfig,

    /// Store collaborator API credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an Anthropic token into ~/.cadence/auth.json
    PasteAnthropicToken,

    /// Paste an OpenAI API key into ~/.cadence/auth.json
    PasteOpenaiApiKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            tasks,
            start,
            output_dir,
            urgency_weight,
            importance_weight,
            mood_weight,
            auto,
            max_steps,
            mood_note,
            explain,
        } => {
            sim::run_simulate(sim::SimulateOpts {
                tasks,
                start,
                output_dir,
                urgency_weight,
                importance_weight,
                mood_weight,
                auto,
                max_steps,
                mood_note,
                explain,
            })?;
        }

        Command::Explain { snapshot, out } => {
            let llm_config = require_llm()?;
            let text = explain::explain_snapshot(&llm_config, &snapshot, out.as_deref())?;
            println!("{text}");
        }

        Command::Mood { note, tasks, out } => {
            let llm_config = require_llm()?;
            let names: Vec<String> = match tasks {
                Some(p) => cadence_core::load_task_inputs(&p)?
                    .into_iter()
                    .map(|t| t.name)
                    .collect(),
                None => Vec::new(),
            };
            let reports = mood_intake::extract_mood(&llm_config, &names, &note);
            let json = serde_json::to_string_pretty(&reports)?;
            if let Some(out) = &out {
                std::fs::write(out, &json).with_context(|| format!("write {}", out.display()))?;
                println!("Wrote {}", out.display());
            }
            println!("{json}");
        }

        Command::InitConfig => config::init_config()?,

        Command::Auth { command } => match command {
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
        },
    }

    Ok(())
}

fn require_llm() -> Result<llm::LlmConfig> {
    let cfg = config::load_config()?;
    match llm::resolve_config(&cfg.llm)? {
        Some(c) => Ok(c),
        None => bail!(
            "no LLM credentials found.\n\
             Run: cadence auth paste-anthropic-token (or paste-openai-api-key),\n\
             or set ANTHROPIC_API_KEY / OPENAI_API_KEY."
        ),
    }
}
