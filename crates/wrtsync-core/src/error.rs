// ── Core error types ──
//
// User-facing errors from wrtsync-core. Consumers never see raw libssh2
// codes; the `From<wrtsync_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local probes ─────────────────────────────────────────────────
    #[error("Required tool '{program}' is not installed")]
    ToolNotFound { program: String },

    #[error("'{program}' failed: {reason}")]
    ToolFailed { program: String, reason: String },

    #[error("No socket listing utility available (tried {tried})")]
    NoSocketTool { tried: String },

    #[error("Cannot determine local IP address: {reason}")]
    LocalAddressUnavailable { reason: String },

    #[error("Cannot determine default gateway: {reason}")]
    GatewayUnavailable { reason: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to router at {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    #[error("Router connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed for '{username}': {message}")]
    AuthenticationFailed { username: String, message: String },

    #[error("Host key for {host} is not in {known_hosts}")]
    HostKeyUnknown { host: String, known_hosts: String },

    #[error("Host key for {host} does not match {known_hosts}")]
    HostKeyMismatch { host: String, known_hosts: String },

    #[error("Host key verification failed: {message}")]
    HostKeyCheck { message: String },

    #[error("SSH protocol error: {message}")]
    Ssh { message: String },

    // ── Remote operations ────────────────────────────────────────────
    #[error("Router rejected `{command}` (status {status}): {stderr}")]
    RemoteCommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wrtsync_api::Error> for CoreError {
    fn from(err: wrtsync_api::Error) -> Self {
        match err {
            wrtsync_api::Error::Connect { addr, source } => CoreError::ConnectionFailed {
                addr,
                reason: source.to_string(),
            },
            wrtsync_api::Error::Resolve { host } => CoreError::ConnectionFailed {
                addr: host,
                reason: "address does not resolve".into(),
            },
            wrtsync_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            wrtsync_api::Error::Ssh(e) => CoreError::Ssh {
                message: e.to_string(),
            },
            wrtsync_api::Error::HostKeyUnknown { host, known_hosts } => {
                CoreError::HostKeyUnknown { host, known_hosts }
            }
            wrtsync_api::Error::HostKeyMismatch { host, known_hosts } => {
                CoreError::HostKeyMismatch { host, known_hosts }
            }
            wrtsync_api::Error::KnownHosts(message) => CoreError::HostKeyCheck { message },
            wrtsync_api::Error::Authentication { username, message } => {
                CoreError::AuthenticationFailed { username, message }
            }
            wrtsync_api::Error::CommandFailed {
                command,
                status,
                stderr,
            } => CoreError::RemoteCommandFailed {
                command,
                status,
                stderr,
            },
            wrtsync_api::Error::Io(e) => CoreError::Ssh {
                message: format!("I/O error on session: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_keeps_username() {
        let err: CoreError = wrtsync_api::Error::Authentication {
            username: "root".into(),
            message: "denied".into(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::AuthenticationFailed { ref username, .. } if username == "root"
        ));
    }

    #[test]
    fn command_failure_maps_to_remote_command_failed() {
        let err: CoreError = wrtsync_api::Error::CommandFailed {
            command: "uci commit firewall".into(),
            status: 1,
            stderr: "locked".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Router rejected `uci commit firewall` (status 1): locked"
        );
    }
}
