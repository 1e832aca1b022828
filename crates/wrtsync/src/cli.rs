//! Clap derive structures for the `wrtsync` CLI.
//!
//! Kept free of workspace types so `build.rs` can include it for man pages.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wrtsync -- forward this host's listening ports through an OpenWrt router
#[derive(Debug, Parser)]
#[command(
    name = "wrtsync",
    version,
    about = "Sync local listening ports into OpenWrt port-forward rules",
    long_about = "Enumerates the TCP and UDP ports this host listens on and makes sure\n\
        the OpenWrt router has a WAN-to-LAN DNAT redirect for each one.\n\n\
        Existing redirects are never modified or removed; missing ones are\n\
        added over SSH with `uci` and committed in a single firewall reload.",
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
    /// Router profile to use
    #[arg(long, short = 'p', env = "WRTSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router host or IP (default: the default gateway)
    #[arg(long, short = 'r', env = "WRTSYNC_ROUTER", global = true)]
    pub router: Option<String>,

    /// Router SSH port
    #[arg(long, env = "WRTSYNC_SSH_PORT", global = true)]
    pub port: Option<u16>,

    /// SSH username
    #[arg(long, short = 'u', env = "WRTSYNC_USERNAME", global = true)]
    pub username: Option<String>,

    /// SSH password
    #[arg(
        long,
        env = "WRTSYNC_PASSWORD",
        global = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Address redirects point at (default: probed outbound address)
    #[arg(long, env = "WRTSYNC_LOCAL_IP", global = true)]
    pub local_ip: Option<IpAddr>,

    /// Accept any SSH host key without verification
    #[arg(long, short = 'k', env = "WRTSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// known_hosts file used to verify the router
    #[arg(long, env = "WRTSYNC_KNOWN_HOSTS", global = true)]
    pub known_hosts: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', env = "WRTSYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// SSH connect and command timeout in seconds
    #[arg(long, env = "WRTSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Add missing port-forward rules for every listening port
    #[command(alias = "s")]
    Sync(SyncArgs),

    /// List this host's listening TCP/UDP ports
    #[command(alias = "ls")]
    Ports,

    /// List port-forward rules currently on the router
    #[command(alias = "redirects")]
    Rules,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYNC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Show what would be added without changing the router
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key (host, port, username, password_env, host_key, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the router password in the system keyring (profile from --profile)
    SetPassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
