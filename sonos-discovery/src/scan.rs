//! Subnet scanning for players that multicast cannot reach.
//!
//! Every host address of a configured IPv4 network is probed with a TCP
//! connect to the player port. Responders become discovery candidates and go
//! through the same description fetch and validation as SSDP results.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DiscoveryError;

/// Upper bound on concurrent probe workers
const MAX_PROBE_THREADS: usize = 32;

/// An IPv4 network in CIDR form. Host bits of the input are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    base: Ipv4Addr,
    prefix: u8,
}

impl Network {
    /// Network address (host bits cleared)
    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    /// Prefix length in bits
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Host addresses of this network.
    ///
    /// Network and broadcast addresses are excluded unless the prefix is
    /// /31 or /32, where every address is a host.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let base = u32::from(self.base);
        let size: u64 = 1u64 << (32 - u32::from(self.prefix));
        let (first, last) = if self.prefix >= 31 {
            (0, size - 1)
        } else {
            (1, size - 2)
        };
        (first..=last).map(move |offset| Ipv4Addr::from(base.wrapping_add(offset as u32)))
    }
}

impl FromStr for Network {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => {
                let prefix = prefix
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|p| *p <= 32)
                    .ok_or_else(|| DiscoveryError::InvalidNetwork(format!("bad prefix in '{}'", s)))?;
                (addr.trim(), prefix)
            }
            None => (s, 32),
        };

        let addr = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| DiscoveryError::InvalidNetwork(format!("bad address in '{}'", s)))?;

        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };

        Ok(Self {
            base: Ipv4Addr::from(u32::from(addr) & mask),
            prefix,
        })
    }
}

/// Parse the configured networks, dropping ones that are invalid or too broad
pub(crate) fn parse_networks(networks: &[String], min_prefix: u8) -> Vec<Network> {
    networks
        .iter()
        .filter(|n| !n.trim().is_empty())
        .filter_map(|n| match n.parse::<Network>() {
            Ok(network) if network.prefix >= min_prefix => Some(network),
            Ok(network) => {
                tracing::warn!(
                    network = %n,
                    prefix = network.prefix,
                    min_prefix,
                    "Skipping network scan: network is too large"
                );
                None
            }
            Err(e) => {
                tracing::warn!(network = %n, error = %e, "Skipping network scan");
                None
            }
        })
        .collect()
}

/// Probe every host for an open `port`, returning responders in address order
pub(crate) fn probe_hosts(hosts: Vec<Ipv4Addr>, port: u16, timeout: Duration) -> Vec<Ipv4Addr> {
    if hosts.is_empty() {
        return Vec::new();
    }

    let chunk_size = hosts.len().div_ceil(MAX_PROBE_THREADS);

    let mut open: Vec<Ipv4Addr> = std::thread::scope(|scope| {
        let workers: Vec<_> = hosts
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .copied()
                        .filter(|ip| is_port_open(*ip, port, timeout))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|worker| worker.join().ok())
            .flatten()
            .collect()
    });

    open.sort();
    open
}

fn is_port_open(ip: Ipv4Addr, port: u16, timeout: Duration) -> bool {
    TcpStream::connect_timeout(&SocketAddr::from((ip, port)), timeout).is_ok()
}
