/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::{Duration, Instant};

use log::warn;

use crate::{StatsdMetricsSink, StatsdTagGroup};

mod aggregate;
use aggregate::StatsdAggregator;

mod formatter;
use formatter::MetricType;
pub use formatter::MetricFormatter;

mod telemetry;
use telemetry::ClientTelemetry;

pub struct StatsdClient {
    prefix: String,
    sink: StatsdMetricsSink,
    tags: StatsdTagGroup,
    aggregator: Option<StatsdAggregator>,
    telemetry: Option<ClientTelemetry>,
    line: Vec<u8>,

    create_instant: Instant,
    last_error_report: u64,
}

impl StatsdClient {
    pub(crate) fn new(prefix: String, sink: StatsdMetricsSink) -> Self {
        StatsdClient {
            prefix,
            sink,
            tags: Default::default(),
            aggregator: None,
            telemetry: None,
            line: Vec::with_capacity(256),
            create_instant: Instant::now(),
            last_error_report: 0,
        }
    }

    pub(crate) fn with_aggregation(mut self, shards: usize, flush_interval: Duration) -> Self {
        self.aggregator = Some(StatsdAggregator::new(shards, flush_interval));
        self
    }

    pub(crate) fn with_telemetry(mut self, transport: &str) -> Self {
        self.telemetry = Some(ClientTelemetry::new(transport));
        self
    }

    pub fn with_tag<T: AsRef<str>>(mut self, key: &str, value: T) -> Self {
        self.tags.add_tag(key, value);
        self
    }

    pub fn with_tag_value<T: AsRef<str>>(mut self, value: T) -> Self {
        self.tags.add_tag_value(value);
        self
    }

    fn emit_line(
        &mut self,
        head: &[u8],
        value: f64,
        metric_type: MetricType,
        sample_rate: f64,
        tags: &[u8],
    ) -> io::Result<()> {
        self.line.clear();
        formatter::write_line(&mut self.line, head, value, metric_type, sample_rate, tags);
        self.sink.emit(&self.line)
    }

    pub fn flush_sink(&mut self) {
        if let Err(e) = self.try_flush_sink() {
            self.handle_emit_error(e);
        }
    }

    /// Send all pending lines.
    ///
    /// Aggregated contexts are only written out if the aggregation flush interval has elapsed.
    pub fn try_flush_sink(&mut self) -> io::Result<()> {
        self.flush_inner(false)
    }

    /// Send all pending lines, including all aggregated contexts.
    pub fn flush_all(&mut self) -> io::Result<()> {
        self.flush_inner(true)
    }

    fn flush_inner(&mut self, force: bool) -> io::Result<()> {
        let mut r = Ok(());

        let contexts = match &mut self.aggregator {
            Some(aggregator) if force || aggregator.is_due() => aggregator.take_all(),
            _ => Vec::new(),
        };
        if let Some(telemetry) = &mut self.telemetry {
            telemetry.add_aggregated_contexts(contexts.len());
        }
        for (key, v) in contexts {
            keep_first_error(
                &mut r,
                self.emit_line(&key.head, v, key.metric_type, 1.0, &key.tags),
            );
        }
        keep_first_error(&mut r, self.sink.flush());

        if let Some(mut telemetry) = self.telemetry.take() {
            let stats = self.sink.take_stats();
            for (name, v) in telemetry.take_counts(stats) {
                keep_first_error(
                    &mut r,
                    self.emit_line(
                        name.as_bytes(),
                        v as f64,
                        MetricType::Count,
                        1.0,
                        telemetry.tags(),
                    ),
                );
            }
            self.telemetry = Some(telemetry);
            keep_first_error(&mut r, self.sink.flush());
        }

        r
    }

    fn handle_emit_error(&mut self, e: io::Error) {
        let time_slice = self.create_instant.elapsed().as_secs() / 64;
        if self.last_error_report != time_slice {
            warn!("sending metrics error: {e:?}");
            self.last_error_report = time_slice;
        }
    }
}

fn keep_first_error(r: &mut io::Result<()>, new: io::Result<()>) {
    if r.is_ok() {
        *r = new;
    }
}
