// ── Desired-vs-existing redirect diff ──
//
// Pure: no I/O, no logging side effects beyond tracing. The same inputs
// always produce the same plan.

use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;

use serde::Serialize;
use tracing::{debug, info};

use crate::model::{ExistingRedirect, PortBinding, RedirectKey};

/// What a sync run would do to the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Bindings with no matching redirect; one rule each will be created.
    pub to_create: Vec<PortBinding>,
    /// Bindings already covered by an existing redirect of any name.
    pub skipped: Vec<PortBinding>,
}

impl Plan {
    pub fn added_count(&self) -> usize {
        self.to_create.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Nothing to create, so no commit or reload either.
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty()
    }
}

/// Split `desired` into bindings to create and bindings already forwarded
/// to `local_ip` by one of the `existing` redirects.
pub fn reconcile(
    desired: &BTreeSet<PortBinding>,
    existing: &[ExistingRedirect],
    local_ip: IpAddr,
) -> Plan {
    let mut present: HashSet<RedirectKey> = existing.iter().filter_map(|r| r.key).collect();
    let mut plan = Plan::default();

    for binding in desired {
        let wanted = RedirectKey::forward(*binding, local_ip);
        if present.contains(&wanted) {
            info!(%binding, %local_ip, "redirect exists, skipping");
            plan.skipped.push(*binding);
        } else {
            debug!(%binding, %local_ip, "redirect missing");
            present.insert(wanted);
            plan.to_create.push(*binding);
        }
    }
    plan
}
