//! Clap derive structures for the `streamcord` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// streamcord -- mirror media server activity into Discord
#[derive(Debug, Parser)]
#[command(
    name = "streamcord",
    version,
    about = "Mirror Emby and Jellyfin playback activity into Discord",
    long_about = "Polls an Emby or Jellyfin server and keeps a Discord guild in sync:\n\
        a live status message, one voice channel per library with its item\n\
        count, and a recently-added message.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (TOML, or YAML with a .yaml/.yml extension)
    #[arg(long, short = 'c', env = "STREAMCORD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// When to use color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorMode,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the media server and keep Discord in sync until interrupted
    Run(RunArgs),

    /// Show what would be published, without touching Discord
    Preview(PreviewArgs),

    /// Inspect and validate configuration
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Args)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct PreviewArgs {
    /// Output format
    #[arg(long, short = 'o', value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path in use
    Path,

    /// Print the effective configuration with secrets masked
    Show,

    /// Validate the configuration and resolve credentials
    Check,

    /// Store a secret in the system keyring (read from stdin or prompt)
    SetSecret {
        /// Which secret to store
        #[arg(value_enum)]
        secret: SecretArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretArg {
    /// Media server API key
    ApiKey,
    /// Discord bot token
    BotToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}
