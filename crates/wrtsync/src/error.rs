//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use wrtsync_config::ConfigError;
use wrtsync_core::CoreError;

#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const HOST_KEY: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const LOCAL_PROBE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Local probes ─────────────────────────────────────────────────
    #[error("Could not list listening ports: {reason}")]
    #[diagnostic(
        code(wrtsync::port_scan),
        help(
            "wrtsync runs `ss -tuln`, or `netstat -tuln` where ss is missing.\n\
             Install iproute2 (ss) or net-tools (netstat)."
        )
    )]
    PortScan { reason: String },

    #[error("Could not determine this host's LAN address: {reason}")]
    #[diagnostic(
        code(wrtsync::local_address),
        help("Pass the address explicitly with --local-ip or set local_address in your profile.")
    )]
    LocalAddress { reason: String },

    #[error("Could not find the router: {reason}")]
    #[diagnostic(
        code(wrtsync::gateway),
        help("Pass the router address with --router or set host in your profile.")
    )]
    Gateway { reason: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to router at {addr}")]
    #[diagnostic(
        code(wrtsync::connection_failed),
        help(
            "Check that the router is reachable and SSH (dropbear) is running.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { addr: String, reason: String },

    #[error("Router connection timed out after {seconds}s")]
    #[diagnostic(
        code(wrtsync::timeout),
        help("Increase the timeout with --timeout or check the router's responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("{message}")]
    #[diagnostic(
        code(wrtsync::host_key),
        help(
            "Add the router to known_hosts first, e.g. `ssh root@<router>` once,\n\
             or pass --insecure (-k) to skip verification on a trusted network."
        )
    )]
    HostKey { message: String },

    #[error("SSH error: {message}")]
    #[diagnostic(code(wrtsync::ssh))]
    Ssh { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for '{username}'")]
    #[diagnostic(
        code(wrtsync::auth_failed),
        help(
            "The router rejected the password: {message}\n\
             Run: wrtsync config set-password --profile {profile}"
        )
    )]
    AuthFailed {
        username: String,
        message: String,
        profile: String,
    },

    #[error("No router password configured for profile '{profile}'")]
    #[diagnostic(
        code(wrtsync::no_credentials),
        help(
            "Configure one with: wrtsync config init\n\
             Or set the WRTSYNC_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Router ───────────────────────────────────────────────────────
    #[error("Router command failed with status {status}: {command}")]
    #[diagnostic(
        code(wrtsync::remote_command),
        help("Router said: {stderr}")
    )]
    RemoteCommand {
        command: String,
        status: i32,
        stderr: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wrtsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(wrtsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: wrtsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(wrtsync::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PortScan { .. } | Self::LocalAddress { .. } | Self::Gateway { .. } => {
                exit_code::LOCAL_PROBE
            }
            Self::ConnectionFailed { .. } | Self::Ssh { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::HostKey { .. } => exit_code::HOST_KEY,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to errors whose help text mentions it.
    pub fn in_profile(mut self, name: &str) -> Self {
        if let Self::AuthFailed { profile, .. } = &mut self {
            name.clone_into(profile);
        }
        self
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ToolNotFound { .. }
            | CoreError::ToolFailed { .. }
            | CoreError::NoSocketTool { .. } => CliError::PortScan {
                reason: err.to_string(),
            },

            CoreError::LocalAddressUnavailable { reason } => CliError::LocalAddress { reason },

            CoreError::GatewayUnavailable { reason } => CliError::Gateway { reason },

            CoreError::ConnectionFailed { addr, reason } => {
                CliError::ConnectionFailed { addr, reason }
            }

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::AuthenticationFailed { username, message } => CliError::AuthFailed {
                username,
                message,
                profile: "default".into(),
            },

            CoreError::HostKeyUnknown { .. }
            | CoreError::HostKeyMismatch { .. }
            | CoreError::HostKeyCheck { .. } => CliError::HostKey {
                message: err.to_string(),
            },

            CoreError::Ssh { message } => CliError::Ssh { message },

            CoreError::RemoteCommandFailed {
                command,
                status,
                stderr,
            } => CliError::RemoteCommand {
                command,
                status,
                stderr,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_failures_share_an_exit_code() {
        let missing: CliError = CoreError::NoSocketTool {
            tried: "ss, netstat".into(),
        }
        .into();
        let gateway: CliError = CoreError::GatewayUnavailable {
            reason: "no default route".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::LOCAL_PROBE);
        assert_eq!(gateway.exit_code(), exit_code::LOCAL_PROBE);
    }

    #[test]
    fn host_key_and_auth_are_distinct() {
        let host_key: CliError = CoreError::HostKeyMismatch {
            host: "192.168.1.1".into(),
            known_hosts: "~/.ssh/known_hosts".into(),
        }
        .into();
        let auth: CliError = CoreError::AuthenticationFailed {
            username: "root".into(),
            message: "denied".into(),
        }
        .into();
        assert_eq!(host_key.exit_code(), exit_code::HOST_KEY);
        assert_eq!(auth.exit_code(), exit_code::AUTH);
        assert!(matches!(
            auth.in_profile("home"),
            CliError::AuthFailed { ref profile, .. } if profile == "home"
        ));
    }

    #[test]
    fn missing_password_is_an_auth_error() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "home".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
