//! Listening socket enumeration.
//!
//! Runs `ss -tuln`, or `netstat -tuln` where `ss` is not installed, and
//! folds the output into a sorted set of [`PortBinding`]s. IPv4 and IPv6
//! wildcard binds of the same port collapse into one entry.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::CommandRunner;
use crate::error::CoreError;
use crate::model::{PortBinding, Protocol};

/// A socket listing tool and where it prints the local address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketLister {
    pub program: &'static str,
    pub args: &'static [&'static str],
    /// Zero-based whitespace column holding `address:port`.
    pub address_column: usize,
}

/// `Netid State Recv-Q Send-Q Local:Port Peer:Port`
pub const SS: SocketLister = SocketLister {
    program: "ss",
    args: &["-tuln"],
    address_column: 4,
};

/// `Proto Recv-Q Send-Q Local Foreign [State]`
pub const NETSTAT: SocketLister = SocketLister {
    program: "netstat",
    args: &["-tuln"],
    address_column: 3,
};

/// Tried in order; the next one only when the previous is not installed.
pub const LISTERS: [SocketLister; 2] = [SS, NETSTAT];

const MIN_COLUMNS: usize = 5;

/// Result of one enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortScan {
    /// Distinct bindings, (protocol, port) ascending.
    pub bindings: BTreeSet<PortBinding>,
    /// Accepted observations before deduplication.
    pub observed: usize,
}

impl PortScan {
    pub fn duplicates(&self) -> usize {
        self.observed - self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Parse socket listing text. Lines that don't describe a tcp/udp socket
/// with a numeric, non-zero port are skipped.
pub fn parse_socket_listing(text: &str, address_column: usize) -> PortScan {
    let mut scan = PortScan::default();

    for line in text.lines() {
        if line.starts_with("Netid") || line.starts_with("Proto") {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < MIN_COLUMNS {
            continue;
        }
        let Some(binding) = parse_columns(&columns, address_column) else {
            continue;
        };
        scan.observed += 1;
        scan.bindings.insert(binding);
    }
    scan
}

fn parse_columns(columns: &[&str], address_column: usize) -> Option<PortBinding> {
    let protocol: Protocol = columns.first()?.to_lowercase().parse().ok()?;
    let address = columns.get(address_column)?;
    let (_, port) = address.rsplit_once(':')?;
    PortBinding::new(protocol, port.parse().ok()?)
}

/// Enumerate listening TCP/UDP ports on this host.
///
/// Fails when no listing tool is installed or the tool itself fails;
/// an empty result means the tool ran and reported nothing.
pub fn enumerate_listening_ports(runner: &impl CommandRunner) -> Result<PortScan, CoreError> {
    for lister in LISTERS {
        match runner.run(lister.program, lister.args) {
            Ok(text) => {
                let scan = parse_socket_listing(&text, lister.address_column);
                debug!(
                    tool = lister.program,
                    observed = scan.observed,
                    distinct = scan.bindings.len(),
                    duplicates = scan.duplicates(),
                    "enumerated listening ports"
                );
                return Ok(scan);
            }
            Err(CoreError::ToolNotFound { program }) => {
                debug!(%program, "socket lister not installed, trying next");
            }
            Err(e) => return Err(e),
        }
    }

    Err(CoreError::NoSocketTool {
        tried: LISTERS
            .iter()
            .map(|l| l.program)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SS_OUTPUT: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
udp   UNCONN 0      0      127.0.0.53%lo:53         0.0.0.0:*
udp   UNCONN 0      0            0.0.0.0:5353       0.0.0.0:*
udp   UNCONN 0      0               [::]:5353          [::]:*
tcp   LISTEN 0      128          0.0.0.0:22         0.0.0.0:*
tcp   LISTEN 0      128             [::]:22            [::]:*
tcp   LISTEN 0      511                *:8080             *:*
";

    const NETSTAT_OUTPUT: &str = "\
Active Internet connections (only servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State
tcp        0      0 0.0.0.0:22              0.0.0.0:*               LISTEN
tcp6       0      0 :::22                   :::*                    LISTEN
udp        0      0 0.0.0.0:68              0.0.0.0:*
";

    fn ports(scan: &PortScan) -> Vec<String> {
        scan.bindings.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ss_output_is_deduplicated_and_sorted() {
        let scan = parse_socket_listing(SS_OUTPUT, SS.address_column);
        assert_eq!(ports(&scan), ["tcp/22", "tcp/8080", "udp/53", "udp/5353"]);
        assert_eq!(scan.observed, 6);
        assert_eq!(scan.duplicates(), 2);
    }

    #[test]
    fn other_protocols_are_excluded() {
        let text = "\
raw   UNCONN 0 0 0.0.0.0:1 0.0.0.0:*
tcp6  LISTEN 0 0 [::]:443 [::]:*
u_str LISTEN 0 0 /run/x.sock:99 * 0
sctp  LISTEN 0 0 0.0.0.0:9 0.0.0.0:*
";
        assert!(parse_socket_listing(text, SS.address_column).is_empty());
    }

    #[test]
    fn malformed_ports_are_skipped() {
        let text = "\
tcp LISTEN 0 0 0.0.0.0:http 0.0.0.0:*
tcp LISTEN 0 0 0.0.0.0:70000 0.0.0.0:*
tcp LISTEN 0 0 0.0.0.0:0 0.0.0.0:*
tcp LISTEN 0 0 no-port-here 0.0.0.0:*
tcp LISTEN 0
TCP LISTEN 0 0 0.0.0.0:443 0.0.0.0:*
";
        let scan = parse_socket_listing(text, SS.address_column);
        assert_eq!(ports(&scan), ["tcp/443"]);
    }

    #[test]
    fn netstat_reads_local_address_column() {
        let scan = parse_socket_listing(NETSTAT_OUTPUT, NETSTAT.address_column);
        assert_eq!(ports(&scan), ["tcp/22", "udp/68"]);
    }

    struct Canned(Vec<(&'static str, Result<&'static str, &'static str>)>);

    impl CommandRunner for Canned {
        fn run(&self, program: &str, _args: &[&str]) -> Result<String, CoreError> {
            match self.0.iter().find(|(p, _)| *p == program) {
                Some((_, Ok(text))) => Ok((*text).to_owned()),
                Some((_, Err(reason))) => Err(CoreError::ToolFailed {
                    program: program.into(),
                    reason: (*reason).into(),
                }),
                None => Err(CoreError::ToolNotFound {
                    program: program.into(),
                }),
            }
        }
    }

    #[test]
    fn falls_back_to_netstat_when_ss_missing() {
        let runner = Canned(vec![("netstat", Ok(NETSTAT_OUTPUT))]);
        let scan = enumerate_listening_ports(&runner).unwrap();
        assert_eq!(ports(&scan), ["tcp/22", "udp/68"]);
    }

    #[test]
    fn no_tool_is_fatal_not_empty() {
        let err = enumerate_listening_ports(&Canned(vec![])).unwrap_err();
        assert!(matches!(err, CoreError::NoSocketTool { ref tried } if tried == "ss, netstat"));
    }

    #[test]
    fn failing_ss_does_not_fall_back() {
        let runner = Canned(vec![
            ("ss", Err("permission denied")),
            ("netstat", Ok(NETSTAT_OUTPUT)),
        ]);
        let err = enumerate_listening_ports(&runner).unwrap_err();
        assert!(matches!(err, CoreError::ToolFailed { ref program, .. } if program == "ss"));
    }
}
