#![allow(clippy::unwrap_used)]

// Sync routine tests over a scripted shell and canned local tools.

use std::cell::RefCell;
use std::net::IpAddr;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use wrtsync_api::{CommandOutput, RemoteShell};
use wrtsync_core::{
    CommandRunner, Connector, CoreError, PortBinding, PortScan, Protocol, SyncConfig,
    SyncOptions, SyncOutcome, SyncReport, Synchronizer,
};

const COMMIT: &str = "uci commit firewall && /etc/init.d/firewall reload";

// ── Fakes ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RouterLog {
    connected_to: Vec<String>,
    commands: Vec<String>,
    closed: usize,
}

#[derive(Clone, Default)]
struct FakeRouter {
    log: Rc<RefCell<RouterLog>>,
    /// Output of `uci show firewall | grep redirect`; empty means grep found nothing.
    show: &'static str,
    /// `uci show` itself fails, as when the firewall package is missing.
    fail_show: bool,
    fail_adds: bool,
}

struct FakeShell(FakeRouter);

impl RemoteShell for FakeShell {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, wrtsync_api::Error> {
        self.0.log.borrow_mut().commands.push(command.to_owned());
        let reply = if command.starts_with("uci show") && self.0.fail_show {
            CommandOutput {
                status: 2,
                stdout: String::new(),
                stderr: "uci: Entry not found".into(),
            }
        } else if command.starts_with("uci show") {
            CommandOutput {
                status: i32::from(self.0.show.is_empty()),
                stdout: self.0.show.to_owned(),
                stderr: String::new(),
            }
        } else if command.contains("uci add") && self.0.fail_adds {
            CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr: "uci: I/O error".into(),
            }
        } else {
            CommandOutput::default()
        };
        Ok(reply)
    }

    fn close(&mut self) -> Result<(), wrtsync_api::Error> {
        self.0.log.borrow_mut().closed += 1;
        Ok(())
    }
}

impl Connector for FakeRouter {
    type Shell = FakeShell;

    fn connect(&self, host: &str) -> Result<FakeShell, CoreError> {
        self.log.borrow_mut().connected_to.push(host.to_owned());
        Ok(FakeShell(self.clone()))
    }
}

struct Tools {
    ss: &'static str,
}

impl CommandRunner for Tools {
    fn run(&self, program: &str, _args: &[&str]) -> Result<String, CoreError> {
        match program {
            "ss" => Ok(self.ss.to_owned()),
            "ip" => Ok("default via 192.168.1.1 dev eth0 proto dhcp metric 100\n".to_owned()),
            other => Err(CoreError::ToolNotFound {
                program: other.into(),
            }),
        }
    }
}

const SS_SSH_AND_DNS: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port
tcp   LISTEN 0      128          0.0.0.0:22        0.0.0.0:*
tcp   LISTEN 0      128             [::]:22           [::]:*
udp   UNCONN 0      0            0.0.0.0:53        0.0.0.0:*
";

const SS_NOTHING: &str = "Netid State Recv-Q Send-Q Local Address:Port Peer Address:Port\n";

fn local_ip() -> IpAddr {
    "192.168.1.50".parse().unwrap()
}

fn config() -> SyncConfig {
    SyncConfig {
        local_address: Some(local_ip()),
        ..SyncConfig::default()
    }
}

fn synced(outcome: SyncOutcome) -> SyncReport {
    match outcome {
        SyncOutcome::Synced(report) => report,
        SyncOutcome::NoPorts => panic!("expected a sync report"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn no_ports_never_contacts_router() {
    let router = FakeRouter::default();
    let sync = Synchronizer::new(config(), Tools { ss: SS_NOTHING }, router.clone());

    let outcome = sync.run(SyncOptions::default()).unwrap();

    assert_eq!(outcome, SyncOutcome::NoPorts);
    let log = router.log.borrow();
    assert!(log.connected_to.is_empty());
    assert!(log.commands.is_empty());
}

#[test]
fn missing_rules_are_added_and_committed_once() {
    let router = FakeRouter::default();
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let report = synced(sync.run(SyncOptions::default()).unwrap());

    assert_eq!(report.router, "192.168.1.1");
    assert_eq!(report.added_count(), 2);
    assert_eq!(report.skipped_count(), 0);
    assert!(report.committed);

    let log = router.log.borrow();
    assert_eq!(log.connected_to, ["192.168.1.1"]);
    let adds: Vec<&String> = log
        .commands
        .iter()
        .filter(|c| c.contains("uci add firewall redirect"))
        .collect();
    assert_eq!(adds.len(), 2);
    assert!(adds[0].contains("name='auto-tcp-22'"));
    assert!(adds[0].contains("dest_ip='192.168.1.50'"));
    assert!(adds[1].contains("name='auto-udp-53'"));
    assert_eq!(log.commands.iter().filter(|c| *c == COMMIT).count(), 1);
    assert_eq!(log.commands.last().unwrap(), COMMIT);
    assert_eq!(log.closed, 1);
}

#[test]
fn existing_rules_mean_no_commit() {
    let router = FakeRouter {
        show: "\
firewall.@redirect[0]=redirect
firewall.@redirect[0].name='ssh'
firewall.@redirect[0].proto='tcp'
firewall.@redirect[0].src_dport='22'
firewall.@redirect[0].dest_ip='192.168.1.50'
firewall.@redirect[0].dest_port='22'
firewall.@redirect[1].name='dns'
firewall.@redirect[1].proto='udp'
firewall.@redirect[1].src_dport='53'
firewall.@redirect[1].dest_ip='192.168.1.50'
firewall.@redirect[1].dest_port='53'
",
        ..FakeRouter::default()
    };
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let report = synced(sync.run(SyncOptions::default()).unwrap());

    assert_eq!(report.existing, 2);
    assert_eq!(report.added_count(), 0);
    assert_eq!(report.skipped_count(), 2);
    assert!(!report.committed);
    let log = router.log.borrow();
    assert_eq!(log.commands, ["uci show firewall | grep redirect"]);
    assert_eq!(log.closed, 1);
}

#[test]
fn dry_run_sends_no_writes() {
    let router = FakeRouter::default();
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let report = synced(sync.run(SyncOptions { dry_run: true }).unwrap());

    assert!(report.dry_run);
    assert_eq!(report.plan.added_count(), 2);
    assert!(report.created.is_empty());
    assert!(!report.committed);
    let log = router.log.borrow();
    assert!(log.commands.iter().all(|c| c.starts_with("uci show")));
    assert_eq!(log.closed, 1);
}

#[test]
fn session_is_closed_when_apply_fails() {
    let router = FakeRouter {
        fail_adds: true,
        ..FakeRouter::default()
    };
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let err = sync.run(SyncOptions::default()).unwrap_err();

    assert!(matches!(err, CoreError::RemoteCommandFailed { status: 1, .. }));
    let log = router.log.borrow();
    assert!(!log.commands.iter().any(|c| c == COMMIT));
    assert_eq!(log.closed, 1);
}

#[test]
fn configured_router_host_skips_gateway_lookup() {
    let router = FakeRouter::default();
    let mut cfg = config();
    cfg.router.host = Some("openwrt.lan".into());
    let sync = Synchronizer::new(cfg, Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let rules = sync.list_rules().unwrap();

    assert_eq!(rules.router, "openwrt.lan");
    assert!(rules.rules.is_empty());
    assert_eq!(router.log.borrow().connected_to, ["openwrt.lan"]);
    assert_eq!(router.log.borrow().closed, 1);
}

#[test]
fn session_is_closed_when_reading_rules_fails() {
    let router = FakeRouter {
        fail_show: true,
        ..FakeRouter::default()
    };
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let err = sync.run(SyncOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        CoreError::RemoteCommandFailed { status: 2, ref stderr, .. } if stderr == "uci: Entry not found"
    ));
    let log = router.log.borrow();
    assert_eq!(log.commands, ["uci show firewall | grep redirect"]);
    assert_eq!(log.closed, 1);
}

#[test]
fn supplied_scan_is_used_as_is() {
    let router = FakeRouter::default();
    // The runner reports nothing listening; only the supplied scan counts.
    let sync = Synchronizer::new(config(), Tools { ss: SS_NOTHING }, router.clone());
    let scan = PortScan {
        bindings: [PortBinding::new(Protocol::Tcp, 443).unwrap()].into(),
        observed: 1,
    };

    let report = synced(sync.run_with_scan(&scan, SyncOptions::default()).unwrap());

    assert_eq!(report.ports, [PortBinding::new(Protocol::Tcp, 443).unwrap()]);
    assert_eq!(report.created[0].name, "auto-tcp-443");
    assert_eq!(router.log.borrow().closed, 1);
}

#[test]
fn empty_supplied_scan_never_contacts_router() {
    let router = FakeRouter::default();
    let sync = Synchronizer::new(config(), Tools { ss: SS_SSH_AND_DNS }, router.clone());

    let outcome = sync
        .run_with_scan(&PortScan::default(), SyncOptions::default())
        .unwrap();

    assert_eq!(outcome, SyncOutcome::NoPorts);
    assert!(router.log.borrow().connected_to.is_empty());
}
