//! Port discovery and redirect reconciliation between `wrtsync-api` and the CLI.
//!
//! - **Probes** ([`probe`]): listening sockets via `ss`/`netstat`, the
//!   outbound local address, and the default gateway. External tools run
//!   behind [`CommandRunner`].
//! - **Domain model** ([`model`]): [`PortBinding`], [`RedirectRule`],
//!   [`ExistingRedirect`] and the [`RedirectKey`] used to match them.
//! - **[`reconcile()`]**: pure diff of desired bindings against existing
//!   redirects.
//! - **[`Synchronizer`]**: one full run over a [`Connector`]-supplied
//!   session, closed on every path.

pub mod apply;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod probe;
pub mod reconcile;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use apply::{ApplyReport, apply_plan};
pub use config::{DEFAULT_PROBE_TARGET, HostKeyVerification, RouterEndpoint, SyncConfig};
pub use error::CoreError;
pub use model::{ExistingRedirect, PortBinding, Protocol, RedirectKey, RedirectRule};
pub use probe::ports::PortScan;
pub use probe::{CommandRunner, SystemRunner};
pub use reconcile::{Plan, reconcile};
pub use sync::{
    Connector, RouterRules, SshConnector, SyncOptions, SyncOutcome, SyncReport, Synchronizer,
};
