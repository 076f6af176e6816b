/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};

use g3_statsd_client::StatsdClientConfig;

mod yaml;

const DEFAULT_STEP: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct PushConfig {
    pub enabled: bool,
    pub step: Duration,
    pub align_to_step: bool,
    pub statistic_tag: bool,
    pub statsd: StatsdClientConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            enabled: true,
            step: DEFAULT_STEP,
            align_to_step: true,
            statistic_tag: false,
            statsd: StatsdClientConfig::default(),
        }
    }
}

impl PushConfig {
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.step < Duration::from_millis(1) {
            return Err(anyhow!(
                "step should be at least 1ms, found {:?}",
                self.step
            ));
        }
        self.statsd
            .check()
            .context("invalid statsd client config")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_check() {
        let config = PushConfig::default();
        assert!(config.enabled);
        assert_eq!(config.step, Duration::from_secs(10));
        assert!(config.check().is_ok());

        let config = PushConfig::default().with_step(Duration::from_micros(999));
        assert!(config.check().is_err());
        let config = PushConfig::default().with_step(Duration::ZERO);
        assert!(config.check().is_err());
        let config = PushConfig::default().with_step(Duration::from_millis(1));
        assert!(config.check().is_ok());

        let mut config = PushConfig::default();
        config.statsd.set_prefix("bad|prefix");
        assert!(config.check().is_err());
    }
}
