// ── Sync orchestration ──
//
// One run: enumerate local ports, locate this host and the router, read
// the router's redirects, create what is missing, commit once. The SSH
// session is opened at most once and closed on every path out.

use std::net::IpAddr;

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info, warn};

use wrtsync_api::{RemoteShell, SshSession, TransportConfig, UciClient};

use crate::apply::{ApplyReport, apply_plan};
use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{ExistingRedirect, PortBinding, RedirectRule};
use crate::probe::network::{default_gateway, local_address};
use crate::probe::ports::{PortScan, enumerate_listening_ports};
use crate::probe::{CommandRunner, SystemRunner};
use crate::reconcile::{Plan, reconcile};

// ── Connection seam ─────────────────────────────────────────────────

/// Opens an authenticated remote shell on the router.
pub trait Connector {
    type Shell: RemoteShell;

    fn connect(&self, host: &str) -> Result<Self::Shell, CoreError>;
}

/// Password-authenticated SSH via libssh2.
#[derive(Debug, Clone)]
pub struct SshConnector {
    username: String,
    password: SecretString,
    transport: TransportConfig,
}

impl SshConnector {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            username: config.router.username.clone(),
            password: config.router.password.clone(),
            transport: config.transport(),
        }
    }
}

impl Connector for SshConnector {
    type Shell = SshSession;

    fn connect(&self, host: &str) -> Result<SshSession, CoreError> {
        Ok(SshSession::connect(
            host,
            &self.username,
            &self.password,
            &self.transport,
        )?)
    }
}

// ── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Read and reconcile, but send no `uci add` or commit.
    pub dry_run: bool,
}

/// Everything a completed run observed and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub local_ip: IpAddr,
    pub router: String,
    pub ports: Vec<PortBinding>,
    /// Redirect sections present before the run.
    pub existing: usize,
    pub plan: Plan,
    /// Rules actually written. Empty on a dry run.
    pub created: Vec<RedirectRule>,
    pub committed: bool,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn added_count(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.plan.skipped_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing is listening; the router was not contacted.
    NoPorts,
    Synced(SyncReport),
}

/// Redirects read from a router, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterRules {
    pub router: String,
    pub rules: Vec<ExistingRedirect>,
}

// ── Synchronizer ────────────────────────────────────────────────────

pub struct Synchronizer<R, C> {
    config: SyncConfig,
    runner: R,
    connector: C,
}

impl Synchronizer<SystemRunner, SshConnector> {
    /// Real child processes and a real SSH session.
    pub fn system(config: SyncConfig) -> Self {
        let connector = SshConnector::from_config(&config);
        Self::new(config, SystemRunner, connector)
    }
}

impl<R: CommandRunner, C: Connector> Synchronizer<R, C> {
    pub fn new(config: SyncConfig, runner: R, connector: C) -> Self {
        Self {
            config,
            runner,
            connector,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn scan_ports(&self) -> Result<PortScan, CoreError> {
        enumerate_listening_ports(&self.runner)
    }

    /// Configured override, else the outbound address towards the probe target.
    pub fn resolve_local_ip(&self) -> Result<IpAddr, CoreError> {
        match self.config.local_address {
            Some(ip) => Ok(ip),
            None => local_address(self.config.probe_target),
        }
    }

    /// Configured router host, else the default gateway.
    pub fn resolve_router(&self) -> Result<String, CoreError> {
        match &self.config.router.host {
            Some(host) => Ok(host.clone()),
            None => Ok(default_gateway(&self.runner)?.to_string()),
        }
    }

    /// Read every redirect on the router without changing anything.
    pub fn list_rules(&self) -> Result<RouterRules, CoreError> {
        let router = self.resolve_router()?;
        let rules = self.with_session(&router, read_rules)?;
        Ok(RouterRules { router, rules })
    }

    /// Run the full sync.
    pub fn run(&self, options: SyncOptions) -> Result<SyncOutcome, CoreError> {
        let scan = self.scan_ports()?;
        self.run_with_scan(&scan, options)
    }

    /// Sync ports the caller already enumerated with [`scan_ports`](Self::scan_ports).
    pub fn run_with_scan(
        &self,
        scan: &PortScan,
        options: SyncOptions,
    ) -> Result<SyncOutcome, CoreError> {
        if scan.is_empty() {
            info!("no listening ports found");
            return Ok(SyncOutcome::NoPorts);
        }
        let ports: Vec<PortBinding> = scan.bindings.iter().copied().collect();

        let local_ip = self.resolve_local_ip()?;
        let router = self.resolve_router()?;
        info!(%local_ip, %router, ports = ports.len(), "starting sync");

        let (existing, plan, applied) = self.with_session(&router, |uci| {
            let existing = read_rules(uci)?;
            let plan = reconcile(&scan.bindings, &existing, local_ip);
            let applied = if options.dry_run {
                debug!(would_add = plan.added_count(), "dry run, not writing");
                ApplyReport::default()
            } else {
                apply_plan(uci, &plan, local_ip)?
            };
            Ok((existing.len(), plan, applied))
        })?;

        let report = SyncReport {
            local_ip,
            router,
            ports,
            existing,
            plan,
            created: applied.created,
            committed: applied.committed,
            dry_run: options.dry_run,
        };
        info!(
            added = report.added_count(),
            skipped = report.skipped_count(),
            "sync finished"
        );
        Ok(SyncOutcome::Synced(report))
    }

    /// Connect, run `work`, then close the session whatever `work` returned.
    ///
    /// A close failure after successful work is logged, not raised.
    fn with_session<T>(
        &self,
        router: &str,
        work: impl FnOnce(&mut UciClient<C::Shell>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let shell = self.connector.connect(router)?;
        let mut uci = UciClient::new(shell);

        let result = work(&mut uci);
        if let Err(e) = uci.close() {
            warn!(error = %e, %router, "failed to close router session");
        }
        result
    }
}

fn read_rules<S: RemoteShell>(uci: &mut UciClient<S>) -> Result<Vec<ExistingRedirect>, CoreError> {
    Ok(uci
        .list_redirects()?
        .into_iter()
        .map(ExistingRedirect::from)
        .collect())
}
