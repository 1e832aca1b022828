// ── Rule application ──
//
// Turns a plan into UCI writes: one batched add per missing binding,
// then a single commit + reload if anything was added.

use std::net::IpAddr;

use serde::Serialize;
use tracing::{debug, info};

use wrtsync_api::{RemoteShell, UciClient};

use crate::convert::rule_fields;
use crate::error::CoreError;
use crate::model::RedirectRule;
use crate::reconcile::Plan;

/// What was written to the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub created: Vec<RedirectRule>,
    /// Whether `uci commit` + firewall reload ran.
    pub committed: bool,
}

/// Create a redirect for every binding in `plan.to_create`.
///
/// Each add completes before the next starts. The first failure aborts
/// the run; already-added sections stay staged and uncommitted.
pub fn apply_plan<S: RemoteShell>(
    uci: &mut UciClient<S>,
    plan: &Plan,
    local_ip: IpAddr,
) -> Result<ApplyReport, CoreError> {
    let mut report = ApplyReport::default();

    for binding in &plan.to_create {
        let rule = RedirectRule::forward(*binding, local_ip);
        info!(
            name = %rule.name,
            protocol = %rule.protocol,
            port = rule.src_dport,
            dest = %local_ip,
            "adding redirect"
        );
        uci.add_redirect(&rule_fields(&rule))?;
        report.created.push(rule);
    }

    if report.created.is_empty() {
        debug!("no redirects added, skipping commit");
    } else {
        uci.commit_and_reload()?;
        report.committed = true;
        info!(added = report.created.len(), "firewall committed and reloaded");
    }
    Ok(report)
}
