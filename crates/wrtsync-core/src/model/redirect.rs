// ── Firewall redirect domain types ──

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::port::{PortBinding, Protocol};

pub const TARGET_DNAT: &str = "DNAT";
pub const ZONE_WAN: &str = "wan";
pub const ZONE_LAN: &str = "lan";

/// Identity of a redirect for matching: the rule name is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectKey {
    pub protocol: Protocol,
    pub src_dport: u16,
    pub dest_ip: IpAddr,
    pub dest_port: u16,
}

impl RedirectKey {
    /// Same port outside and inside, pointed at `dest_ip`.
    pub fn forward(binding: PortBinding, dest_ip: IpAddr) -> Self {
        Self {
            protocol: binding.protocol,
            src_dport: binding.port,
            dest_ip,
            dest_port: binding.port,
        }
    }
}

/// A WAN→LAN DNAT redirect that wrtsync creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub name: String,
    pub target: String,
    pub src: String,
    pub dest: String,
    pub protocol: Protocol,
    pub src_dport: u16,
    pub dest_ip: IpAddr,
    pub dest_port: u16,
}

impl RedirectRule {
    /// The rule that forwards `binding` from the WAN to `dest_ip`.
    ///
    /// Named `auto-<protocol>-<port>`.
    pub fn forward(binding: PortBinding, dest_ip: IpAddr) -> Self {
        Self {
            name: format!("auto-{}-{}", binding.protocol, binding.port),
            target: TARGET_DNAT.into(),
            src: ZONE_WAN.into(),
            dest: ZONE_LAN.into(),
            protocol: binding.protocol,
            src_dport: binding.port,
            dest_ip,
            dest_port: binding.port,
        }
    }

    pub fn key(&self) -> RedirectKey {
        RedirectKey {
            protocol: self.protocol,
            src_dport: self.src_dport,
            dest_ip: self.dest_ip,
            dest_port: self.dest_port,
        }
    }
}

/// A redirect section already present on the router.
///
/// `key` is `None` when any identity field is missing or unparsable
/// (port ranges, multi-protocol rules, hostnames); such records are
/// listed but never suppress a new rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRedirect {
    pub index: u32,
    pub name: Option<String>,
    pub key: Option<RedirectKey>,
    pub fields: BTreeMap<String, String>,
}

impl ExistingRedirect {
    pub fn matches(&self, key: &RedirectKey) -> bool {
        self.key.as_ref() == Some(key)
    }
}
