// ── UCI-to-domain type conversions ──
//
// Bridges raw `wrtsync_api::RawRedirect` records into canonical
// `wrtsync_core::model` types and back into the field list the UCI
// client writes. Text only exists on the far side of this module.

use std::net::IpAddr;

use wrtsync_api::RawRedirect;

use crate::model::{ExistingRedirect, Protocol, RedirectKey, RedirectRule};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_port(raw: Option<&str>) -> Option<u16> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn parse_ip(raw: Option<&str>) -> Option<IpAddr> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Typed identity of a raw record, if every identity field parses.
fn identity(raw: &RawRedirect) -> Option<RedirectKey> {
    Some(RedirectKey {
        protocol: raw.get("proto")?.parse::<Protocol>().ok()?,
        src_dport: parse_port(raw.get("src_dport"))?,
        dest_ip: parse_ip(raw.get("dest_ip"))?,
        dest_port: parse_port(raw.get("dest_port"))?,
    })
}

// ── Router → domain ────────────────────────────────────────────────

impl From<RawRedirect> for ExistingRedirect {
    fn from(raw: RawRedirect) -> Self {
        let key = identity(&raw);
        Self {
            index: raw.index,
            name: raw.get("name").map(str::to_owned),
            key,
            fields: raw.fields,
        }
    }
}

// ── Domain → router ────────────────────────────────────────────────

/// UCI option list for a new redirect section, in write order.
pub fn rule_fields(rule: &RedirectRule) -> Vec<(&'static str, String)> {
    vec![
        ("name", rule.name.clone()),
        ("target", rule.target.clone()),
        ("src", rule.src.clone()),
        ("dest", rule.dest.clone()),
        ("proto", rule.protocol.to_string()),
        ("src_dport", rule.src_dport.to_string()),
        ("dest_ip", rule.dest_ip.to_string()),
        ("dest_port", rule.dest_port.to_string()),
    ]
}
