//! `wrtsync rules`: redirects currently configured on the router.

use tabled::Tabled;

use wrtsync_core::{CommandRunner, Connector, ExistingRedirect, Synchronizer};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

use super::OutputCtx;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    index: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Proto")]
    proto: String,
    #[tabled(rename = "WAN Port")]
    src_dport: String,
    #[tabled(rename = "Destination")]
    dest: String,
    #[tabled(rename = "Target")]
    target: String,
}

impl From<&ExistingRedirect> for RuleRow {
    fn from(r: &ExistingRedirect) -> Self {
        let field = |name: &str| r.fields.get(name).cloned().unwrap_or_else(|| "-".into());
        let dest = match (r.fields.get("dest_ip"), r.fields.get("dest_port")) {
            (Some(ip), Some(port)) => format!("{ip}:{port}"),
            (Some(ip), None) => ip.clone(),
            (None, _) => "-".into(),
        };
        Self {
            index: r.index,
            name: r.name.clone().unwrap_or_else(|| "-".into()),
            proto: field("proto"),
            src_dport: field("src_dport"),
            dest,
            target: field("target"),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle<R: CommandRunner, C: Connector>(
    sync: &Synchronizer<R, C>,
    ctx: &OutputCtx,
) -> Result<(), CliError> {
    let listing = sync.list_rules()?;

    if ctx.format == OutputFormat::Table && !ctx.quiet {
        eprintln!("{} {}", ctx.painter.heading("Router:"), listing.router);
    }
    let out = output::render_list(ctx.format, &listing.rules, |r| RuleRow::from(r), |r| {
        r.name
            .clone()
            .unwrap_or_else(|| format!("@redirect[{}]", r.index))
    });
    output::print_output(&out, ctx.quiet);
    Ok(())
}
