/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
#[cfg(unix)]
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::{StatsdBackend, StatsdClientConfig};

impl StatsdBackend {
    pub fn parse_udp_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut addr: Option<SocketAddr> = None;
                let mut bind: Option<IpAddr> = None;

                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "address" | "addr" => {
                        addr = Some(g3_yaml::value::as_sockaddr(v).context(format!(
                            "invalid statsd udp peer socket address value for key {k}"
                        ))?);
                        Ok(())
                    }
                    "bind_ip" | "bind" => {
                        bind = Some(
                            g3_yaml::value::as_ipaddr(v)
                                .context(format!("invalid value for key {k}"))?,
                        );
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;

                match addr {
                    Some(addr) => Ok(StatsdBackend::Udp(addr, bind)),
                    None => Err(anyhow!("no target address has been set")),
                }
            }
            Yaml::String(s) => {
                let addr =
                    SocketAddr::from_str(s).map_err(|e| anyhow!("invalid SocketAddr: {e}"))?;
                Ok(StatsdBackend::Udp(addr, None))
            }
            _ => Err(anyhow!("invalid yaml value for udp statsd backend")),
        }
    }

    #[cfg(unix)]
    pub fn parse_unix_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut path: Option<PathBuf> = None;

                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "path" => {
                        path = Some(
                            g3_yaml::value::as_absolute_path(v)
                                .context(format!("invalid value for key {k}"))?,
                        );
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                path.map(StatsdBackend::Unix)
                    .ok_or_else(|| anyhow!("no path has been set"))
            }
            Yaml::String(_) => {
                let path = g3_yaml::value::as_absolute_path(v)?;
                Ok(StatsdBackend::Unix(path))
            }
            _ => Err(anyhow!("invalid yaml value for unix statsd backend")),
        }
    }
}

impl StatsdClientConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = StatsdClientConfig::default();
            g3_yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
            config.check()?;
            Ok(config)
        } else {
            Err(anyhow!(
                "yaml value type for 'statsd client config' should be 'map'"
            ))
        }
    }

    /// Set a single config key, used by both this config and other configs embedding it.
    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "target_udp" | "backend_udp" => {
                let target = StatsdBackend::parse_udp_yaml(v)
                    .context(format!("invalid value for key {k}"))?;
                self.set_backend(target);
            }
            #[cfg(unix)]
            "target_unix" | "backend_unix" => {
                let target = StatsdBackend::parse_unix_yaml(v)
                    .context(format!("invalid value for key {k}"))?;
                self.set_backend(target);
            }
            "target" | "backend" => {
                return if let Yaml::Hash(map) = v {
                    g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                        "udp" => {
                            let target = StatsdBackend::parse_udp_yaml(v)
                                .context(format!("invalid value for key {k}"))?;
                            self.set_backend(target);
                            Ok(())
                        }
                        #[cfg(unix)]
                        "unix" => {
                            let target = StatsdBackend::parse_unix_yaml(v)
                                .context(format!("invalid value for key {k}"))?;
                            self.set_backend(target);
                            Ok(())
                        }
                        _ => Err(anyhow!("invalid key {k}")),
                    })
                    .context(format!("invalid value for key {k}"))
                } else {
                    Err(anyhow!("yaml value type for key {k} should be 'map'"))
                };
            }
            "prefix" => {
                let prefix = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
                self.set_prefix(&prefix);
            }
            "max_packet_size" | "max_packet_size_bytes" | "max_segment_size" => {
                let size = g3_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                self.set_max_packet_size(size);
            }
            "enable_aggregation" | "aggregation" => {
                self.enable_aggregation = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
            }
            "aggregation_flush_interval" => {
                self.aggregation_flush_interval = as_millis_duration(v)
                    .context(format!("invalid duration value for key {k}"))?;
            }
            "aggregation_shards" => {
                self.aggregation_shards = g3_yaml::humanize::as_usize(v)
                    .context(format!("invalid usize value for key {k}"))?;
            }
            "enable_telemetry" | "enable_client_side_telemetry" => {
                self.enable_telemetry = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}

/// Plain integers are milliseconds here, other values follow the humanize rules.
fn as_millis_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::Integer(i) => {
            let ms = u64::try_from(*i).map_err(|_| anyhow!("negative duration value {i}"))?;
            Ok(Duration::from_millis(ms))
        }
        _ => g3_yaml::humanize::as_duration(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_yaml::yaml_doc;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_udp_yaml_ok() {
        let yaml = yaml_doc!(
            r#"
                address: "127.0.0.1:8125"
                bind_ip: "127.0.0.1"
            "#
        );
        let backend = StatsdBackend::parse_udp_yaml(&yaml).unwrap();
        assert_eq!(
            backend,
            StatsdBackend::Udp(
                "127.0.0.1:8125".parse().unwrap(),
                Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
            )
        );

        let yaml = Yaml::String("127.0.0.1:9125".to_string());
        let backend = StatsdBackend::parse_udp_yaml(&yaml).unwrap();
        assert_eq!(
            backend,
            StatsdBackend::Udp("127.0.0.1:9125".parse().unwrap(), None)
        );
    }

    #[test]
    fn parse_udp_yaml_err() {
        let yaml = yaml_doc!("invalid_key: value");
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        let yaml = yaml_doc!("address: invalid-addr");
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        let yaml = yaml_doc!("bind_ip: 127.0.0.1");
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        assert!(StatsdBackend::parse_udp_yaml(&Yaml::Integer(8125)).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn parse_unix_yaml() {
        let yaml = yaml_doc!("path: /var/run/datadog/dsd.socket");
        assert_eq!(
            StatsdBackend::parse_unix_yaml(&yaml).unwrap(),
            StatsdBackend::Unix(PathBuf::from("/var/run/datadog/dsd.socket"))
        );

        let yaml = Yaml::String("relative.socket".to_string());
        assert!(StatsdBackend::parse_unix_yaml(&yaml).is_err());

        let yaml = yaml_doc!("file: /tmp/a.socket");
        assert!(StatsdBackend::parse_unix_yaml(&yaml).is_err());
    }

    #[test]
    fn parse_full_config() {
        let yaml = yaml_doc!(
            r#"
                target:
                  udp: "127.0.0.1:8126"
                prefix: myapp
                max-packet-size-bytes: 8KiB
                enable_aggregation: true
                aggregation_flush_interval: 2000
                aggregation_shards: 8
                enable_client_side_telemetry: false
            "#
        );
        let config = StatsdClientConfig::parse_yaml(&yaml).unwrap();
        let backend = config.backend().unwrap();
        assert_eq!(
            backend,
            StatsdBackend::Udp("127.0.0.1:8126".parse().unwrap(), None)
        );
        assert_eq!(config.prefix(), "myapp");
        assert_eq!(config.max_packet_size(&backend), 8192);
        assert!(config.enable_aggregation);
        assert_eq!(config.aggregation_flush_interval, Duration::from_secs(2));
        assert_eq!(config.aggregation_shards, 8);
        assert!(!config.enable_telemetry);
    }

    #[test]
    fn parse_config_err() {
        let yaml = yaml_doc!("unknown: 1");
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("target: 127.0.0.1:8125");
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("prefix: 'a:b'");
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("enable_aggregation: true\naggregation_shards: 0");
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        assert!(StatsdClientConfig::parse_yaml(&Yaml::Integer(1)).is_err());
    }
}
