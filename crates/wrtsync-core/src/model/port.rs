// ── Listening port domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Transport protocol of a listening socket or redirect rule.
///
/// Declaration order doubles as sort order (`tcp` before `udp`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A (protocol, port) pair observed listening on this host.
///
/// Ordering is (protocol, port) ascending, which is also display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortBinding {
    pub protocol: Protocol,
    pub port: u16,
}

impl PortBinding {
    /// `None` for port 0, which can never be forwarded.
    pub fn new(protocol: Protocol, port: u16) -> Option<Self> {
        (port != 0).then_some(Self { protocol, port })
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.port)
    }
}
