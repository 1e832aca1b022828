//! `wrtsync ports`: local listening ports, no router contact.

use wrtsync_core::{CommandRunner, Connector, PortBinding, Synchronizer};

use crate::error::CliError;
use crate::output;

use super::OutputCtx;
use super::util::PortRow;

pub fn handle<R: CommandRunner, C: Connector>(
    sync: &Synchronizer<R, C>,
    ctx: &OutputCtx,
) -> Result<(), CliError> {
    let scan = sync.scan_ports()?;
    tracing::debug!(duplicates = scan.duplicates(), "collapsed duplicate bindings");

    let ports: Vec<PortBinding> = scan.bindings.into_iter().collect();
    let out = output::render_list(
        ctx.format,
        &ports,
        |b| PortRow::from(b),
        ToString::to_string,
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
