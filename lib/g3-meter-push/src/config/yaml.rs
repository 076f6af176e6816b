/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::PushConfig;

impl PushConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let mut config = PushConfig::default();
        match v {
            Yaml::Hash(map) => {
                g3_yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
            }
            Yaml::Null => {}
            _ => {
                return Err(anyhow!(
                    "yaml value type for 'meter push config' should be 'map'"
                ));
            }
        }
        config.check()?;
        Ok(config)
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "enabled" | "enable" => {
                self.enabled = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
            }
            "step" | "step_interval" => {
                self.step = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
            }
            "align_to_step" => {
                self.align_to_step = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
            }
            "statistic_tag" => {
                self.statistic_tag = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
            }
            "statsd" => {
                let Yaml::Hash(map) = v else {
                    return Err(anyhow!("yaml value type for key {k} should be 'map'"));
                };
                g3_yaml::foreach_kv(map, |k, v| self.statsd.set_by_yaml_kv(k, v))?;
            }
            _ => self.statsd.set_by_yaml_kv(k, v)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_statsd_client::StatsdBackend;
    use g3_yaml::yaml_doc;
    use std::time::Duration;

    #[test]
    fn parse_ok() {
        let config = PushConfig::parse_yaml(&Yaml::Null).unwrap();
        assert!(config.enabled);
        assert_eq!(config.step, Duration::from_secs(10));

        let doc = yaml_doc!(
            r#"
            enable: false
            step-interval: 5s
            align_to_step: false
            statistic_tag: true
            prefix: myapp
            max-packet-size-bytes: 8KiB
            statsd:
              enable_aggregation: true
              aggregation_flush_interval: 500
              aggregation_shards: 8
              target_udp: 127.0.0.1:18125
            "#
        );
        let config = PushConfig::parse_yaml(&doc).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.step, Duration::from_secs(5));
        assert!(!config.align_to_step);
        assert!(config.statistic_tag);
        assert_eq!(config.statsd.prefix(), "myapp");
        assert!(config.statsd.enable_aggregation);
        assert_eq!(
            config.statsd.aggregation_flush_interval,
            Duration::from_millis(500)
        );
        assert_eq!(config.statsd.aggregation_shards, 8);
        let backend = config.statsd.backend().unwrap();
        assert_eq!(config.statsd.max_packet_size(&backend), 8192);
        let StatsdBackend::Udp(addr, None) = backend else {
            panic!("udp backend expected");
        };
        assert_eq!(addr.port(), 18125);
    }

    #[test]
    fn parse_err() {
        for s in [
            "step: 0s",
            "step: 100us",
            "step: abc",
            "enabled: maybe",
            "unknown_key: 1",
            "statsd: 1",
            "aggregation_shards: 0\nenable_aggregation: true",
            "- a\n- b",
        ] {
            let doc = yaml_doc!(s);
            assert!(PushConfig::parse_yaml(&doc).is_err(), "{s}");
        }
    }
}
