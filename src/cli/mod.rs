//! CLI entry point for pairloop.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::TeamConfig;
use crate::types::KeywordMatch;

/// Pair a product-owner model with a programmer model to build a program.
#[derive(Parser, Debug)]
#[command(name = "pairloop", version, about = "Product-owner/programmer LLM pair")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pair until one of them is done or the rounds run out
    Run(RunArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Config file (defaults to the per-user config path)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model id, e.g. gpt-4o-mini
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum product-owner turns
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Only react to keywords sent as the whole reply
    #[arg(long)]
    pub strict_keywords: bool,

    /// Append the conversation to this file
    #[arg(short, long)]
    pub transcript: Option<PathBuf>,

    /// Report raw run output instead of a tester model's summary
    #[arg(long)]
    pub no_review: bool,

    /// What the pair should build
    #[arg(short, long)]
    pub project: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Max tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

impl RunArgs {
    /// Apply flags on top of a loaded configuration.
    pub fn apply(&self, config: &mut TeamConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(rounds) = self.max_rounds {
            config.max_rounds = rounds;
        }
        if self.strict_keywords {
            config.keyword_match = KeywordMatch::WholeMessage;
        }
        if let Some(path) = &self.transcript {
            config.transcript_path = Some(path.clone());
        }
        if self.no_review {
            config.review_tests = false;
        }
        if let Some(project) = &self.project {
            config.project = project.clone();
        }
        if let Some(t) = self.temperature {
            config.generation.temperature = Some(t);
        }
        if let Some(max) = self.max_tokens {
            config.generation.max_tokens = Some(max);
        }
    }
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file (defaults to the per-user config path)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only print where the default config file lives
    #[arg(long)]
    pub path: bool,
}
