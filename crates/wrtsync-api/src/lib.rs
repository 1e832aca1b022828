// wrtsync-api: SSH transport and UCI firewall protocol for OpenWrt routers

pub mod error;
pub mod session;
pub mod transport;
pub mod uci;

pub use error::Error;
pub use session::{CommandOutput, RemoteShell, SshSession};
pub use transport::{HostKeyPolicy, TransportConfig, default_known_hosts};
pub use uci::{RawRedirect, UciClient};
