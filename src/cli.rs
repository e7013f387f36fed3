//! Command-line argument parsing for askbench.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{AskbenchError, Result};
use crate::llm::LlmProvider;
use crate::output::OutputFormat;

/// Ask a benchmark results database questions in plain English.
#[derive(Parser, Debug)]
#[command(name = "askbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask a single question and print the result
    Ask(AskArgs),
    /// Answer questions over HTTP
    Serve(ServeArgs),
}

/// Arguments for the `ask` subcommand.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to ask (read from stdin when omitted)
    #[arg(value_name = "QUESTION")]
    pub question: Vec<String>,

    /// Output format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (e.g., 127.0.0.1:8080)
    #[arg(long, value_name = "ADDR", env = "ASKBENCH_LISTEN")]
    pub listen: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Flags shared by both subcommands.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the SQLite database file
    #[arg(long, value_name = "PATH", env = "ASKBENCH_DB")]
    pub db: Option<PathBuf>,

    /// LLM provider (openai or mock)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model name (overrides OPENAI_MODEL)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Allow generated INSERT/UPDATE/DELETE statements to run
    #[arg(long)]
    pub allow_writes: bool,
}

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug)]
pub struct Settings {
    pub db_path: PathBuf,
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub allow_writes: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

impl AskArgs {
    /// Returns the question from the positional arguments, if any.
    pub fn question_text(&self) -> Option<String> {
        let joined = self.question.join(" ");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Parses the output format from the --format argument.
    pub fn parse_output_format(&self) -> Result<OutputFormat> {
        self.format.parse().map_err(AskbenchError::Config)
    }
}

impl ServeArgs {
    /// Returns the listen address, falling back to the config file.
    pub fn listen_addr(&self, config: &Config) -> String {
        self.listen
            .clone()
            .unwrap_or_else(|| config.server.listen.clone())
    }
}

impl CommonArgs {
    /// Merges these flags over the file config.
    pub fn resolve(&self, config: &Config) -> Result<Settings> {
        let db_path = self
            .db
            .clone()
            .or_else(|| config.database.path.clone())
            .ok_or_else(|| {
                AskbenchError::config(
                    "No database path configured. Pass --db or set database.path in the config file.",
                )
            })?;

        let provider = self
            .provider
            .as_deref()
            .unwrap_or(&config.llm.provider)
            .parse::<LlmProvider>()
            .map_err(AskbenchError::Config)?;

        let model = self.model.clone().or_else(|| config.llm.model.clone());

        Ok(Settings {
            db_path,
            provider,
            model,
            allow_writes: self.allow_writes || config.allow_writes,
        })
    }
}
