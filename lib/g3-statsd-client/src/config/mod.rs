/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;
#[cfg(unix)]
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};

use crate::{StatsdClient, StatsdMetricsSink};

mod env;

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_UDP_PORT: u16 = 8125;
const DEFAULT_UDP_MAX_PACKET_SIZE: usize = 1432;
#[cfg(unix)]
const DEFAULT_UNIX_MAX_PACKET_SIZE: usize = 8192;
const MIN_MAX_PACKET_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsdBackend {
    Udp(SocketAddr, Option<IpAddr>),
    #[cfg(unix)]
    Unix(PathBuf),
}

impl Default for StatsdBackend {
    fn default() -> Self {
        StatsdBackend::Udp(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_UDP_PORT),
            None,
        )
    }
}

impl StatsdBackend {
    fn default_max_packet_size(&self) -> usize {
        match self {
            StatsdBackend::Udp(_, _) => DEFAULT_UDP_MAX_PACKET_SIZE,
            #[cfg(unix)]
            StatsdBackend::Unix(_) => DEFAULT_UNIX_MAX_PACKET_SIZE,
        }
    }

    fn transport_name(&self) -> &'static str {
        match self {
            StatsdBackend::Udp(_, _) => "udp",
            #[cfg(unix)]
            StatsdBackend::Unix(_) => "uds",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatsdClientConfig {
    backend: Option<StatsdBackend>,
    prefix: String,
    max_packet_size: Option<usize>,
    pub enable_aggregation: bool,
    pub aggregation_flush_interval: Duration,
    pub aggregation_shards: usize,
    pub enable_telemetry: bool,
}

impl Default for StatsdClientConfig {
    fn default() -> Self {
        StatsdClientConfig::with_prefix("datadog")
    }
}

impl StatsdClientConfig {
    pub fn with_prefix(prefix: &str) -> Self {
        StatsdClientConfig {
            backend: None,
            prefix: prefix.to_string(),
            max_packet_size: None,
            enable_aggregation: false,
            aggregation_flush_interval: Duration::from_secs(3),
            aggregation_shards: 4,
            enable_telemetry: true,
        }
    }

    pub fn set_backend(&mut self, target: StatsdBackend) {
        self.backend = Some(target);
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_string();
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_max_packet_size(&mut self, size: usize) {
        self.max_packet_size = Some(size);
    }

    /// The max packet size, or the default value of the backend.
    pub fn max_packet_size(&self, backend: &StatsdBackend) -> usize {
        self.max_packet_size
            .unwrap_or_else(|| backend.default_max_packet_size())
    }

    /// Get the configured backend.
    ///
    /// If not set, it will be detected from the DogStatsD environment variables,
    /// with a fallback to the local agent at 127.0.0.1:8125.
    pub fn backend(&self) -> anyhow::Result<StatsdBackend> {
        if let Some(backend) = &self.backend {
            return Ok(backend.clone());
        }
        let backend = env::detect_backend(|k| std::env::var(k).ok())
            .context("invalid statsd backend from environment")?;
        Ok(backend.unwrap_or_default())
    }

    pub fn check(&self) -> anyhow::Result<()> {
        check_prefix(&self.prefix)?;
        if let Some(size) = self.max_packet_size
            && size < MIN_MAX_PACKET_SIZE
        {
            return Err(anyhow!(
                "max packet size {size} is too small, at least {MIN_MAX_PACKET_SIZE} is required"
            ));
        }
        if self.enable_aggregation {
            if self.aggregation_shards == 0 {
                return Err(anyhow!("aggregation shards should not be 0"));
            }
            if self.aggregation_flush_interval.is_zero() {
                return Err(anyhow!("aggregation flush interval should not be 0"));
            }
        }
        Ok(())
    }

    pub fn build(&self) -> anyhow::Result<StatsdClient> {
        self.check()?;
        let backend = self.backend()?;
        let max_packet_size = self.max_packet_size(&backend);

        let sink = match &backend {
            StatsdBackend::Udp(addr, bind) => {
                let bind_ip = bind.unwrap_or(match addr {
                    SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                });
                let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0))
                    .map_err(|e| anyhow!("failed to bind udp socket to {bind_ip}: {e}"))?;
                StatsdMetricsSink::udp_with_capacity(*addr, socket, max_packet_size)
            }
            #[cfg(unix)]
            StatsdBackend::Unix(path) => {
                let socket = UnixDatagram::unbound()
                    .map_err(|e| anyhow!("failed to create unix datagram socket: {e}"))?;
                StatsdMetricsSink::unix_with_capacity(path.clone(), socket, max_packet_size)
            }
        };

        let mut client = StatsdClient::new(self.prefix.clone(), sink);
        if self.enable_aggregation {
            client =
                client.with_aggregation(self.aggregation_shards, self.aggregation_flush_interval);
        }
        if self.enable_telemetry {
            client = client.with_telemetry(backend.transport_name());
        }
        Ok(client)
    }
}

fn check_prefix(prefix: &str) -> anyhow::Result<()> {
    for c in prefix.chars() {
        if c.is_whitespace() || c.is_control() {
            return Err(anyhow!("blank or control char is not allowed in metrics prefix"));
        }
        if matches!(c, ':' | '|' | '@' | '#' | ',') {
            return Err(anyhow!("char '{c}' is not allowed in metrics prefix"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StatsdClientConfig::default();
        assert_eq!(config.prefix(), "datadog");
        assert!(!config.enable_aggregation);
        assert_eq!(config.aggregation_flush_interval, Duration::from_secs(3));
        assert_eq!(config.aggregation_shards, 4);
        assert!(config.enable_telemetry);
        assert!(config.check().is_ok());
        assert_eq!(
            config.max_packet_size(&StatsdBackend::default()),
            DEFAULT_UDP_MAX_PACKET_SIZE
        );
    }

    #[test]
    fn explicit_backend() {
        let mut config = StatsdClientConfig::default();
        let backend = StatsdBackend::Udp("127.0.0.2:9125".parse().unwrap(), None);
        config.set_backend(backend.clone());
        assert_eq!(config.backend().unwrap(), backend);
    }

    #[test]
    fn check_errors() {
        let mut config = StatsdClientConfig::default();
        config.set_prefix("a b");
        assert!(config.check().is_err());
        config.set_prefix("a|b");
        assert!(config.check().is_err());
        config.set_prefix("app.metrics");
        assert!(config.check().is_ok());

        config.set_max_packet_size(16);
        assert!(config.check().is_err());
        config.set_max_packet_size(512);
        assert!(config.check().is_ok());

        config.aggregation_shards = 0;
        assert!(config.check().is_ok());
        config.enable_aggregation = true;
        assert!(config.check().is_err());
        config.aggregation_shards = 2;
        config.aggregation_flush_interval = Duration::ZERO;
        assert!(config.check().is_err());
    }

    #[test]
    fn build_udp() {
        let mut config = StatsdClientConfig::with_prefix("");
        config.set_backend(StatsdBackend::default());
        assert!(config.build().is_ok());
    }
}
