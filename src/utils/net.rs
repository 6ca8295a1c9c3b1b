//! Network helpers: outbound address discovery and subnet checks

use ipnet::IpNet;
use std::net::{IpAddr, UdpSocket};

/// Header carrying the agent's own address
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// Address used to pick the outbound interface. No packet is sent.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Local IP address of the interface that routes to the public internet.
///
/// Returns `None` when the host has no route (air-gapped test boxes).
pub fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(PROBE_ADDR).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

/// Parse `ip` and check whether it belongs to `subnet`.
///
/// Unparseable addresses are never inside a subnet.
pub fn ip_in_subnet(ip: &str, subnet: &IpNet) -> bool {
    ip.trim()
        .parse::<IpAddr>()
        .map(|addr| subnet.contains(&addr))
        .unwrap_or(false)
}
