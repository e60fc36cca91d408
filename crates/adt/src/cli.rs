//! Clap derive structures for the `adt` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adt -- watch and control an ADT Smart Security alarm panel
#[derive(Debug, Parser)]
#[command(
    name = "adt",
    version,
    about = "Watch and control an ADT Smart Security alarm panel",
    long_about = "Reads panel state from the ADT Smart Security self-care dashboard\n\
        and submits arm/disarm commands through it.",
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
    /// Configured account to use
    #[arg(long, short = 'a', env = "ADT_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// Portal host or URL (overrides account)
    #[arg(long, short = 'd', env = "ADT_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// Portal username (overrides account)
    #[arg(long, short = 'u', env = "ADT_USERNAME", global = true)]
    pub username: Option<String>,

    /// Portal password
    #[arg(long, env = "ADT_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ADT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ADT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ADT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text: the arming state only
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current panel state
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Arm the panel
    Arm(ArmArgs),

    /// Disarm the panel
    Disarm(WaitArgs),

    /// Print every state change until interrupted
    Watch(WatchArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show only this contact sensor
    #[arg(long, short = 's')]
    pub sensor: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArmTarget {
    /// Perimeter only (stay)
    Home,
    /// Full arming
    Away,
}

#[derive(Debug, Args)]
pub struct ArmArgs {
    /// Arming mode
    pub mode: ArmTarget,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Wait until the panel reports the new state
    #[arg(long, short = 'w')]
    pub wait: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create an account in the config file
    Init(InitArgs),

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Account name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Store the password (from --password / ADT_PASSWORD) in the system keyring
    #[arg(long)]
    pub keyring: bool,

    /// Replace an existing account of the same name
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
