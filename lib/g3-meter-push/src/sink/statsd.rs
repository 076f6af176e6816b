/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use g3_statsd_client::StatsdClient;

use super::MetricSink;

impl MetricSink for StatsdClient {
    fn count(
        &mut self,
        name: &str,
        value: f64,
        sample_rate: f64,
        tags: &[String],
    ) -> io::Result<()> {
        StatsdClient::count(self, name, value)
            .with_sample_rate(sample_rate)
            .with_tag_values(tags)
            .try_send()
    }

    fn gauge(
        &mut self,
        name: &str,
        value: f64,
        sample_rate: f64,
        tags: &[String],
    ) -> io::Result<()> {
        StatsdClient::gauge(self, name, value)
            .with_sample_rate(sample_rate)
            .with_tag_values(tags)
            .try_send()
    }

    fn distribution(
        &mut self,
        name: &str,
        value: f64,
        sample_rate: f64,
        tags: &[String],
    ) -> io::Result<()> {
        StatsdClient::distribution(self, name, value)
            .with_sample_rate(sample_rate)
            .with_tag_values(tags)
            .try_send()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.try_flush_sink()
    }

    fn close(&mut self) -> io::Result<()> {
        self.flush_all()
    }
}
