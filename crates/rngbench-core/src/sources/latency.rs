//! Network latency entropy source: TCP handshake timing to diverse endpoints.
//!
//! Times the TCP three-way handshake to hosts on several continents. The
//! nanosecond-resolution timing captures NIC interrupt coalescing, kernel
//! socket buffer allocation, router queuing, and path congestion. Endpoints
//! are probed concurrently so the whole fetch stays inside one timeout.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::SourceError;
use crate::source::{EntropySource, Fetched, SourceInfo, SourceKind};

/// Geographically diverse endpoints, one per region.
const ENDPOINTS: &[(&str, u16)] = &[
    ("www.google.com", 443),
    ("www.yandex.ru", 443),
    ("www.baidu.com", 443),
    ("www.mercadolibre.com.ar", 443),
];

/// Entropy source that measures TCP connect round-trip times.
pub struct NetworkLatencySource {
    info: SourceInfo,
    endpoints: Vec<(String, u16)>,
}

impl NetworkLatencySource {
    pub fn new() -> Self {
        Self::with_endpoints(
            ENDPOINTS
                .iter()
                .map(|&(h, p)| (h.to_string(), p))
                .collect(),
        )
    }

    /// Probe a custom endpoint set (tests use a local listener).
    pub fn with_endpoints(endpoints: Vec<(String, u16)>) -> Self {
        Self {
            info: SourceInfo {
                name: "network_latency",
                description: "TCP handshake timing to endpoints on four continents",
                kind: SourceKind::NetworkTiming,
            },
            endpoints,
        }
    }
}

impl Default for NetworkLatencySource {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve, connect, and return the handshake duration in nanoseconds.
fn connect_rtt(host: &str, port: u16, timeout: Duration) -> Option<u128> {
    let addr = (host, port).to_socket_addrs().ok()?.next()?;
    let start = Instant::now();
    let _stream = TcpStream::connect_timeout(&addr, timeout).ok()?;
    Some(start.elapsed().as_nanos())
}

impl EntropySource for NetworkLatencySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn fetch(&self, timeout: Duration) -> Result<Fetched, SourceError> {
        let start = Instant::now();
        let mut latencies: Vec<Option<u128>> = Vec::with_capacity(self.endpoints.len());

        std::thread::scope(|s| {
            let handles: Vec<_> = self
                .endpoints
                .iter()
                .map(|(host, port)| s.spawn(move || connect_rtt(host, *port, timeout)))
                .collect();
            for handle in handles {
                latencies.push(handle.join().unwrap_or(None));
            }
        });

        let mut data = Vec::with_capacity(latencies.len() * 16);
        let mut reachable = 0usize;
        for rtt in latencies.into_iter().flatten() {
            data.extend_from_slice(&rtt.to_le_bytes());
            reachable += 1;
        }

        if reachable == 0 {
            return Err(SourceError::Transport {
                source: "network_latency",
                detail: "no endpoint reachable".into(),
            });
        }

        Ok(Fetched {
            data,
            elapsed: start.elapsed(),
        })
    }
}
