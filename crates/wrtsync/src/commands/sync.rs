//! `wrtsync sync`: add a redirect for every listening port that lacks one.

use std::fmt::Write as _;

use tabled::Tabled;

use wrtsync_core::{
    CommandRunner, Connector, PortScan, RedirectRule, SyncOptions, SyncOutcome, SyncReport,
    Synchronizer,
};

use crate::cli::SyncArgs;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::OutputCtx;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Action")]
    action: String,
}

/// One row per listening port, in (protocol, port) order.
fn plan_rows(report: &SyncReport, painter: Painter) -> Vec<PlanRow> {
    let verb = if report.dry_run { "would add" } else { "added" };
    report
        .ports
        .iter()
        .map(|b| PlanRow {
            protocol: b.protocol.to_string(),
            port: b.port,
            rule: RedirectRule::forward(*b, report.local_ip).name,
            action: if report.plan.to_create.binary_search(b).is_ok() {
                painter.added(verb)
            } else {
                painter.skipped("exists")
            },
        })
        .collect()
}

// ── Rendering ───────────────────────────────────────────────────────

fn render_detail(outcome: &SyncOutcome, painter: Painter) -> String {
    let report = match outcome {
        SyncOutcome::NoPorts => return "No listening ports found; nothing to sync.".into(),
        SyncOutcome::Synced(report) => report,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", painter.heading("Local IP:"), report.local_ip);
    let _ = writeln!(out, "{}   {}", painter.heading("Router:"), report.router);
    let _ = writeln!(
        out,
        "{}    {} listening, {} existing redirects",
        painter.heading("Ports:"),
        report.ports.len(),
        report.existing
    );
    let _ = writeln!(out, "{}", output::render_table(&plan_rows(report, painter)));

    let summary = format!(
        "added {}, skipped {}",
        report.added_count(),
        report.skipped_count()
    );
    if report.dry_run {
        let _ = write!(
            out,
            "{} would add {}, skipped {}",
            painter.warning("dry run:"),
            report.plan.added_count(),
            report.skipped_count()
        );
    } else if report.committed {
        let _ = write!(out, "{} (firewall reloaded)", painter.added(&summary));
    } else {
        let _ = write!(out, "{}", painter.skipped(&summary));
    }
    out
}

/// Rule names, one per line: those created, or those a dry run would create.
fn render_plain(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::NoPorts => String::new(),
        SyncOutcome::Synced(report) if report.dry_run => report
            .plan
            .to_create
            .iter()
            .map(|b| RedirectRule::forward(*b, report.local_ip).name)
            .collect::<Vec<_>>()
            .join("\n"),
        SyncOutcome::Synced(report) => report
            .created
            .iter()
            .map(|r| r.name.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn print_outcome(outcome: &SyncOutcome, ctx: &OutputCtx) {
    let painter = ctx.painter;
    let out = output::render_single(
        ctx.format,
        outcome,
        |o| render_detail(o, painter),
        render_plain,
    );
    output::print_output(&out, ctx.quiet);
}

/// Sync the ports in `scan`, which the caller enumerated up front.
pub fn handle<R: CommandRunner, C: Connector>(
    args: &SyncArgs,
    sync: &Synchronizer<R, C>,
    scan: &PortScan,
    ctx: &OutputCtx,
) -> Result<(), CliError> {
    let outcome = sync.run_with_scan(
        scan,
        SyncOptions {
            dry_run: args.dry_run,
        },
    )?;
    print_outcome(&outcome, ctx);
    Ok(())
}
