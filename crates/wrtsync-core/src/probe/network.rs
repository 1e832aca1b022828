//! Outbound local address and default gateway discovery.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::debug;

use super::CommandRunner;
use crate::error::CoreError;

/// The address this host would use to reach `probe_target`.
///
/// Connecting a UDP socket only selects a route and a local endpoint;
/// no datagram is sent, so this works without internet access as long
/// as a route exists.
pub fn local_address(probe_target: SocketAddr) -> Result<IpAddr, CoreError> {
    let unavailable = |reason: String| CoreError::LocalAddressUnavailable { reason };

    let bind: SocketAddr = if probe_target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind).map_err(|e| unavailable(format!("bind: {e}")))?;
    socket
        .connect(probe_target)
        .map_err(|e| unavailable(format!("no route towards {probe_target}: {e}")))?;
    let ip = socket
        .local_addr()
        .map_err(|e| unavailable(e.to_string()))?
        .ip();

    if ip.is_unspecified() {
        return Err(unavailable("kernel reported an unspecified address".into()));
    }
    debug!(%ip, %probe_target, "resolved local address");
    Ok(ip)
}

/// Next hop of the default route, read from `ip route show default`.
pub fn default_gateway(runner: &impl CommandRunner) -> Result<IpAddr, CoreError> {
    let text = runner
        .run("ip", &["route", "show", "default"])
        .map_err(|e| CoreError::GatewayUnavailable {
            reason: e.to_string(),
        })?;
    let gateway = parse_default_gateway(&text).ok_or_else(|| CoreError::GatewayUnavailable {
        reason: "no default route with a gateway address".into(),
    })?;
    debug!(%gateway, "resolved default gateway");
    Ok(gateway)
}

/// Third field of the first `default ...` line that holds an IP address.
///
/// `default via 192.168.1.1 dev eth0` yields `192.168.1.1`; device-only
/// defaults such as `default dev wg0 scope link` are passed over.
pub fn parse_default_gateway(text: &str) -> Option<IpAddr> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.first() == Some(&"default"))
        .find_map(|fields| fields.get(2).and_then(|f| f.parse().ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gateway_from_default_via_line() {
        let text = "default via 192.168.1.1 dev eth0 proto dhcp src 192.168.1.50 metric 100\n";
        assert_eq!(
            parse_default_gateway(text),
            Some("192.168.1.1".parse().unwrap())
        );
    }

    #[test]
    fn device_only_default_is_skipped() {
        let text = "\
default dev wg0 scope link
default via 10.0.0.1 dev wlan0 metric 600
";
        assert_eq!(parse_default_gateway(text), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn no_default_route() {
        assert_eq!(parse_default_gateway(""), None);
        assert_eq!(
            parse_default_gateway("192.168.1.0/24 dev eth0 proto kernel scope link\n"),
            None
        );
    }

    #[test]
    fn ipv6_gateway() {
        let text = "default via fe80::1 dev eth0 proto ra metric 1024\n";
        assert_eq!(parse_default_gateway(text), Some("fe80::1".parse().unwrap()));
    }

    struct Failing;

    impl CommandRunner for Failing {
        fn run(&self, program: &str, _args: &[&str]) -> Result<String, CoreError> {
            Err(CoreError::ToolNotFound {
                program: program.into(),
            })
        }
    }

    #[test]
    fn missing_ip_tool_is_gateway_unavailable() {
        let err = default_gateway(&Failing).unwrap_err();
        assert!(matches!(err, CoreError::GatewayUnavailable { .. }));
    }

    #[test]
    fn loopback_probe_resolves_loopback() {
        let ip = local_address("127.0.0.1:9".parse().unwrap()).unwrap();
        assert!(ip.is_loopback());
    }
}
