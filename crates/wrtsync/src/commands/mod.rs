//! Command dispatch: bridges CLI args -> core `Synchronizer` -> output formatting.

pub mod config_cmd;
pub mod ports;
pub mod rules;
pub mod sync;
pub mod util;

use wrtsync_core::{SyncConfig, SyncOutcome, Synchronizer};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::Painter;

/// Output settings resolved from flags and config defaults.
#[derive(Debug, Clone, Copy)]
pub struct OutputCtx {
    pub format: OutputFormat,
    pub painter: Painter,
    pub quiet: bool,
}

impl OutputCtx {
    pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Self {
        Self {
            format: config::output_format(global, cfg),
            painter: Painter::new(config::color_mode(global, cfg)),
            quiet: global.quiet,
        }
    }
}

/// Dispatch a command that works on local ports or the router.
pub fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let ctx = OutputCtx::resolve(global, cfg);

    match cmd {
        // Listing local ports needs no router credentials.
        Command::Ports => ports::handle(&Synchronizer::system(SyncConfig::default()), &ctx),
        Command::Sync(args) => {
            // Scan before resolving credentials: with nothing listening the
            // router is never contacted and no password is needed.
            let scan = Synchronizer::system(SyncConfig::default()).scan_ports()?;
            if scan.is_empty() {
                sync::print_outcome(&SyncOutcome::NoPorts, &ctx);
                return Ok(());
            }
            let sync = Synchronizer::system(config::resolve_sync_config(global, cfg)?);
            sync::handle(&args, &sync, &scan, &ctx)
        }
        Command::Rules => {
            let sync = Synchronizer::system(config::resolve_sync_config(global, cfg)?);
            rules::handle(&sync, &ctx)
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
