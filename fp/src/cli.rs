//! CLI command definitions and subcommands

use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::domain::parse_timestamp;
use crate::query::PersonaKind;

/// freeplan - turn a free-time window into time-boxed plans
#[derive(Parser)]
#[command(
    name = "fp",
    about = "Plan what to do between two calendar commitments",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide between public transport and moving on foot
    Decide {
        #[command(flatten)]
        window: WindowArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate alternative plans for the window
    Plan {
        #[command(flatten)]
        window: WindowArgs,

        /// Planner persona
        #[arg(short, long, value_enum, default_value_t = PersonaKind::General)]
        persona: PersonaKind,

        /// Report events that do not tile the window (on stderr)
        #[arg(long)]
        validate: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the search queries a run would issue, without any network access
    Queries {
        #[command(flatten)]
        window: WindowArgs,

        /// Planner persona
        #[arg(short, long, value_enum, default_value_t = PersonaKind::General)]
        persona: PersonaKind,

        /// Travel minutes assumed for the plan query
        #[arg(long, default_value = "0")]
        estimated_minutes: u32,

        /// Assume public transport for the plan query
        #[arg(long)]
        transit: bool,
    },
}

/// The free-time window, given directly or looked up in a calendar file
#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    /// Where the previous commitment ends
    #[arg(long, requires_all = ["depart", "to", "arrive"])]
    pub from: Option<String>,

    /// When the previous commitment ends (RFC 3339)
    #[arg(long, value_parser = parse_time)]
    pub depart: Option<DateTime<FixedOffset>>,

    /// Where the next commitment starts
    #[arg(long)]
    pub to: Option<String>,

    /// When the next commitment starts (RFC 3339)
    #[arg(long, value_parser = parse_time)]
    pub arrive: Option<DateTime<FixedOffset>>,

    /// YAML calendar to find the surrounding commitments in
    #[arg(
        long,
        conflicts_with_all = ["from", "depart", "to", "arrive"],
        requires_all = ["free_start", "free_end"]
    )]
    pub calendar: Option<PathBuf>,

    /// Start of the free range (with --calendar)
    #[arg(long, value_parser = parse_time)]
    pub free_start: Option<DateTime<FixedOffset>>,

    /// End of the free range (with --calendar)
    #[arg(long, value_parser = parse_time)]
    pub free_end: Option<DateTime<FixedOffset>>,

    /// Free-text preference, e.g. "minimize cost"
    #[arg(long, default_value = "")]
    pub prefer: String,
}

fn parse_time(s: &str) -> Result<DateTime<FixedOffset>, String> {
    parse_timestamp(s)
}

/// Output format for decisions and plans
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Whether a provider credential is present in the environment
pub struct CredentialCheck {
    pub provider: &'static str,
    pub env: String,
    pub present: bool,
}

impl CredentialCheck {
    pub fn check(provider: &'static str, env: &str) -> Self {
        debug!(provider, %env, "CredentialCheck::check: called");
        let present = std::env::var(env).map(|v| !v.trim().is_empty()).unwrap_or(false);
        Self {
            provider,
            env: env.to_string(),
            present,
        }
    }
}

/// Check the credentials named by the given configuration
pub fn check_credentials(config: &Config) -> Vec<CredentialCheck> {
    debug!(llm_env = %config.llm.api_key_env, search_env = %config.search.api_key_env, "check_credentials: called");
    vec![
        CredentialCheck::check("reasoning", &config.llm.api_key_env),
        CredentialCheck::check("search", &config.search.api_key_env),
    ]
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("freeplan")
        .join("logs")
        .join("freeplan.log")
}

/// Generate the after_help text with credential checks and the log location
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Credentials:\n");
    for check in check_credentials(config) {
        let icon = if check.present { "\u{2705}" } else { "\u{274C}" };
        let status = if check.present { "set" } else { "missing" };
        help.push_str(&format!("  {} {:<10} {:<16} {}\n", icon, check.provider, check.env, status));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
