use thiserror::Error;

/// Top-level error type for the `wrtsync-api` crate.
///
/// Covers every failure mode of talking to a router: TCP connect, SSH
/// handshake, host-key verification, authentication, and remote command
/// execution. `wrtsync-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// TCP connection to the router could not be established.
    #[error("Cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Router host could not be resolved to a socket address.
    #[error("Cannot resolve router address '{host}'")]
    Resolve { host: String },

    /// Connection or command timed out.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// SSH protocol failure (handshake, channel, etc.)
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    // ── Host verification ───────────────────────────────────────────
    /// The router's host key is not present in the known_hosts file.
    #[error("Host key for {host} not found in {known_hosts}")]
    HostKeyUnknown { host: String, known_hosts: String },

    /// The router presented a key different from the recorded one.
    #[error("Host key for {host} does not match {known_hosts}")]
    HostKeyMismatch { host: String, known_hosts: String },

    /// The known_hosts file could not be read or checked.
    #[error("Cannot verify host key: {0}")]
    KnownHosts(String),

    // ── Authentication ──────────────────────────────────────────────
    /// Password authentication was rejected.
    #[error("Authentication failed for user '{username}': {message}")]
    Authentication { username: String, message: String },

    // ── Remote execution ────────────────────────────────────────────
    /// A remote command exited unsuccessfully.
    #[error("Remote command `{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// Reading command output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
