// Shared transport configuration for opening SSH sessions.
//
// Host-key policy, port and timeout live here so `SshSession::connect`
// takes one settings value instead of a growing argument list.

use std::path::PathBuf;
use std::time::Duration;

/// Host-key verification mode (api-level mirror of core's HostKeyVerification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Check the router key against an OpenSSH known_hosts file.
    VerifyKnownHosts(PathBuf),
    /// Accept whatever key the router presents. Insecure: skips host
    /// verification entirely (trust-on-first-use without the "first").
    AcceptAny,
}

/// Shared transport configuration for SSH sessions.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host_key: HostKeyPolicy,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host_key: HostKeyPolicy::VerifyKnownHosts(default_known_hosts()),
            port: 22,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Timeout in milliseconds, clamped to what libssh2 accepts.
    pub(crate) fn timeout_ms(&self) -> u32 {
        u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX)
    }
}

/// `~/.ssh/known_hosts`, or a relative `.ssh/known_hosts` when `HOME` is unset.
pub fn default_known_hosts() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".ssh");
    p.push("known_hosts");
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_verifies_known_hosts_on_port_22() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.port, 22);
        assert!(matches!(cfg.host_key, HostKeyPolicy::VerifyKnownHosts(_)));
    }

    #[test]
    fn timeout_ms_clamps() {
        let cfg = TransportConfig {
            timeout: Duration::from_secs(u64::MAX / 2000),
            ..TransportConfig::default()
        };
        assert_eq!(cfg.timeout_ms(), u32::MAX);
    }

    #[test]
    fn default_known_hosts_ends_in_ssh_dir() {
        let path = default_known_hosts();
        assert!(path.ends_with(".ssh/known_hosts"));
    }
}
