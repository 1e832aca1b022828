// ── Runtime sync configuration ──
//
// These types describe *how* to reach the router and which local
// overrides apply. They carry credential data but never touch disk.
// The CLI constructs a `SyncConfig` and hands it in.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use wrtsync_api::{HostKeyPolicy, TransportConfig, default_known_hosts};

/// Address used to discover the outbound local IP. Nothing is sent to it.
pub const DEFAULT_PROBE_TARGET: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80));

/// How to verify the router's SSH host key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Check against the user's `~/.ssh/known_hosts`.
    #[default]
    VerifyKnownHosts,
    /// Same, with an explicit known_hosts path.
    KnownHostsFile(PathBuf),
    /// Accept any host key. Insecure: a spoofed router receives the password.
    AcceptAny,
}

/// Where and as whom to log in on the router.
#[derive(Debug, Clone)]
pub struct RouterEndpoint {
    /// Router host or IP. `None` means "use the default gateway".
    pub host: Option<String>,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

/// Configuration for one sync run.
///
/// Built by the CLI, passed to `Synchronizer` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub router: RouterEndpoint,
    pub host_key: HostKeyVerification,
    /// Connect and per-command timeout.
    pub timeout: Duration,
    /// Redirect target address. Probed when `None`.
    pub local_address: Option<IpAddr>,
    /// Destination of the connect-mode UDP probe for the local address.
    pub probe_target: SocketAddr,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            router: RouterEndpoint {
                host: None,
                port: 22,
                username: "root".into(),
                password: SecretString::from(String::new()),
            },
            host_key: HostKeyVerification::default(),
            timeout: Duration::from_secs(10),
            local_address: None,
            probe_target: DEFAULT_PROBE_TARGET,
        }
    }
}

impl SyncConfig {
    /// Translate into the api crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let host_key = match &self.host_key {
            HostKeyVerification::VerifyKnownHosts => {
                HostKeyPolicy::VerifyKnownHosts(default_known_hosts())
            }
            HostKeyVerification::KnownHostsFile(path) => {
                HostKeyPolicy::VerifyKnownHosts(path.clone())
            }
            HostKeyVerification::AcceptAny => HostKeyPolicy::AcceptAny,
        };
        TransportConfig {
            host_key,
            port: self.router.port,
            timeout: self.timeout,
        }
    }
}
