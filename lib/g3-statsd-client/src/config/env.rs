/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{SocketAddr, ToSocketAddrs};
#[cfg(unix)]
use std::path::PathBuf;

use anyhow::{Context, anyhow};

use super::{DEFAULT_UDP_PORT, StatsdBackend};

const ENV_DOGSTATSD_URL: &str = "DD_DOGSTATSD_URL";
const ENV_AGENT_HOST: &str = "DD_AGENT_HOST";
const ENV_DOGSTATSD_PORT: &str = "DD_DOGSTATSD_PORT";

/// Detect the backend the same way as the Datadog clients.
///
/// `DD_DOGSTATSD_URL` has the highest priority, then `DD_AGENT_HOST` with `DD_DOGSTATSD_PORT`.
pub(super) fn detect_backend<F>(get_env: F) -> anyhow::Result<Option<StatsdBackend>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get_env(ENV_DOGSTATSD_URL).filter(|s| !s.is_empty()) {
        return parse_url(&url)
            .map(Some)
            .context(format!("invalid value for env {ENV_DOGSTATSD_URL}"));
    }

    let Some(host) = get_env(ENV_AGENT_HOST).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let port = match get_env(ENV_DOGSTATSD_PORT).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<u16>()
            .map_err(|e| anyhow!("invalid value for env {ENV_DOGSTATSD_PORT}: {e}"))?,
        None => DEFAULT_UDP_PORT,
    };
    let addr = resolve(&host, port).context(format!("invalid value for env {ENV_AGENT_HOST}"))?;
    Ok(Some(StatsdBackend::Udp(addr, None)))
}

fn parse_url(url: &str) -> anyhow::Result<StatsdBackend> {
    if let Some(addr) = url.strip_prefix("udp://") {
        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| anyhow!("invalid port in url {url}: {e}"))?;
                (host, port)
            }
            None => (addr, DEFAULT_UDP_PORT),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        return Ok(StatsdBackend::Udp(resolve(host, port)?, None));
    }

    if let Some(r) = parse_unix_url(url) {
        return r;
    }

    Err(anyhow!("unsupported dogstatsd url {url}"))
}

#[cfg(unix)]
fn parse_unix_url(url: &str) -> Option<anyhow::Result<StatsdBackend>> {
    let path = url
        .strip_prefix("unixgram://")
        .or_else(|| url.strip_prefix("unix://"))?;
    let path = PathBuf::from(path);
    if path.is_absolute() {
        Some(Ok(StatsdBackend::Unix(path)))
    } else {
        Some(Err(anyhow!(
            "the unix socket path in url {url} is not absolute"
        )))
    }
}

#[cfg(not(unix))]
fn parse_unix_url(_url: &str) -> Option<anyhow::Result<StatsdBackend>> {
    None
}

fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| anyhow!("failed to resolve {host}: {e}"))?
        .next()
        .ok_or_else(|| anyhow!("no address found for host {host}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn detect(vars: &[(&str, &str)]) -> anyhow::Result<Option<StatsdBackend>> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        detect_backend(|k| map.get(k).cloned())
    }

    #[test]
    fn no_env() {
        assert_eq!(detect(&[]).unwrap(), None);
        assert_eq!(detect(&[(ENV_DOGSTATSD_URL, "")]).unwrap(), None);
    }

    #[test]
    fn udp_url() {
        let backend = detect(&[(ENV_DOGSTATSD_URL, "udp://127.0.0.1:9125")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Udp("127.0.0.1:9125".parse().unwrap(), None))
        );

        let backend = detect(&[(ENV_DOGSTATSD_URL, "udp://[::1]:8000")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Udp("[::1]:8000".parse().unwrap(), None))
        );

        let backend = detect(&[(ENV_DOGSTATSD_URL, "udp://127.0.0.1")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Udp("127.0.0.1:8125".parse().unwrap(), None))
        );
    }

    #[cfg(unix)]
    #[test]
    fn unix_url() {
        let backend = detect(&[(ENV_DOGSTATSD_URL, "unix:///var/run/datadog/dsd.socket")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Unix(PathBuf::from("/var/run/datadog/dsd.socket")))
        );
        let backend = detect(&[(ENV_DOGSTATSD_URL, "unixgram:///tmp/dsd.socket")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Unix(PathBuf::from("/tmp/dsd.socket")))
        );
        assert!(detect(&[(ENV_DOGSTATSD_URL, "unix://dsd.socket")]).is_err());
    }

    #[test]
    fn agent_host() {
        let backend = detect(&[(ENV_AGENT_HOST, "127.0.0.1")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Udp("127.0.0.1:8125".parse().unwrap(), None))
        );

        let backend =
            detect(&[(ENV_AGENT_HOST, "127.0.0.1"), (ENV_DOGSTATSD_PORT, "18125")]).unwrap();
        assert_eq!(
            backend,
            Some(StatsdBackend::Udp("127.0.0.1:18125".parse().unwrap(), None))
        );

        assert!(detect(&[(ENV_AGENT_HOST, "127.0.0.1"), (ENV_DOGSTATSD_PORT, "x")]).is_err());
    }

    #[test]
    fn invalid_url() {
        assert!(detect(&[(ENV_DOGSTATSD_URL, "tcp://127.0.0.1:8125")]).is_err());
        assert!(detect(&[(ENV_DOGSTATSD_URL, "udp://127.0.0.1:port")]).is_err());
    }
}
