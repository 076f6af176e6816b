/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use super::StatsdClient;
use super::aggregate::ContextKey;
use crate::StatsdTagGroup;

// integers beyond this can not be represented exactly by f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub(super) enum MetricType {
    Count,
    Gauge,
    Distribution,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "c",
            MetricType::Gauge => "g",
            MetricType::Distribution => "d",
        }
    }

    fn aggregatable(&self) -> bool {
        !matches!(self, MetricType::Distribution)
    }
}

pub struct MetricFormatter<'a> {
    client: &'a mut StatsdClient,
    metric_type: MetricType,
    name: &'a str,
    value: f64,
    sample_rate: f64,
    common_tags: Option<&'a StatsdTagGroup>,
    local_tags: StatsdTagGroup,
}

impl StatsdClient {
    pub fn count<'a>(&'a mut self, name: &'a str, value: f64) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Count, name, value)
    }

    pub fn count_with_tags<'a>(
        &'a mut self,
        name: &'a str,
        value: f64,
        common_tags: &'a StatsdTagGroup,
    ) -> MetricFormatter<'a> {
        self.count(name, value).with_tag_group(common_tags)
    }

    pub fn gauge<'a>(&'a mut self, name: &'a str, value: f64) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Gauge, name, value)
    }

    pub fn gauge_with_tags<'a>(
        &'a mut self,
        name: &'a str,
        value: f64,
        common_tags: &'a StatsdTagGroup,
    ) -> MetricFormatter<'a> {
        self.gauge(name, value).with_tag_group(common_tags)
    }

    pub fn distribution<'a>(&'a mut self, name: &'a str, value: f64) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Distribution, name, value)
    }

    pub fn distribution_with_tags<'a>(
        &'a mut self,
        name: &'a str,
        value: f64,
        common_tags: &'a StatsdTagGroup,
    ) -> MetricFormatter<'a> {
        self.distribution(name, value).with_tag_group(common_tags)
    }

    fn metric_with_type<'a>(
        &'a mut self,
        metric_type: MetricType,
        name: &'a str,
        value: f64,
    ) -> MetricFormatter<'a> {
        MetricFormatter {
            client: self,
            metric_type,
            name,
            value,
            sample_rate: 1.0,
            common_tags: None,
            local_tags: StatsdTagGroup::default(),
        }
    }
}

impl<'a> MetricFormatter<'a> {
    fn with_tag_group(mut self, tags: &'a StatsdTagGroup) -> Self {
        if !tags.is_empty() {
            self.common_tags = Some(tags);
        }
        self
    }

    pub fn with_tag<T: AsRef<str>>(mut self, key: &str, value: T) -> Self {
        self.local_tags.add_tag(key, value);
        self
    }

    pub fn with_tag_value<T: AsRef<str>>(mut self, value: T) -> Self {
        self.local_tags.add_tag_value(value);
        self
    }

    pub fn with_tag_values<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.local_tags.add_tag_values(values);
        self
    }

    /// Set the sample rate, which should be in range (0, 1].
    ///
    /// Values out of range are treated as 1.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = if rate > 0.0 && rate < 1.0 { rate } else { 1.0 };
        self
    }

    pub fn send(mut self) {
        if let Err(e) = self.do_send() {
            self.client.handle_emit_error(e);
        }
    }

    pub fn try_send(mut self) -> io::Result<()> {
        self.do_send()
    }

    fn do_send(&mut self) -> io::Result<()> {
        // there is no wire form for these values
        if !self.value.is_finite() {
            return Ok(());
        }
        if self.sample_rate < 1.0 && fastrand::f64() >= self.sample_rate {
            return Ok(());
        }
        let client = &mut *self.client;
        if let Some(telemetry) = &mut client.telemetry {
            telemetry.add_metric();
        }

        let mut head = Vec::with_capacity(client.prefix.len() + self.name.len() + 1);
        if !client.prefix.is_empty() {
            head.extend_from_slice(client.prefix.as_bytes());
            head.push(b'.');
        }
        head.extend_from_slice(self.name.as_bytes());

        let mut tags = Vec::new();
        write_tags(
            &mut tags,
            [Some(&client.tags), self.common_tags, Some(&self.local_tags)],
        );

        if self.sample_rate >= 1.0
            && self.metric_type.aggregatable()
            && let Some(aggregator) = &mut client.aggregator
        {
            let key = ContextKey {
                metric_type: self.metric_type,
                head,
                tags,
            };
            aggregator.add(key, self.value);
            return Ok(());
        }

        client.emit_line(&head, self.value, self.metric_type, self.sample_rate, &tags)
    }
}

fn write_tags<'a, const N: usize>(buf: &mut Vec<u8>, groups: [Option<&'a StatsdTagGroup>; N]) {
    for group in groups.into_iter().flatten() {
        if group.is_empty() {
            continue;
        }
        if buf.is_empty() {
            buf.extend_from_slice(b"|#");
        } else {
            buf.push(b',');
        }
        buf.extend_from_slice(group.as_bytes());
    }
}

fn write_value(buf: &mut Vec<u8>, value: f64) {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        let mut b = itoa::Buffer::new();
        buf.extend_from_slice(b.format(value as i64).as_bytes());
    } else {
        let mut b = ryu::Buffer::new();
        buf.extend_from_slice(b.format(value).as_bytes());
    }
}

/// Write `<head>:<value>|<type>[|@<rate>]<tags>`, `tags` already carries the `|#` part.
pub(super) fn write_line(
    buf: &mut Vec<u8>,
    head: &[u8],
    value: f64,
    metric_type: MetricType,
    sample_rate: f64,
    tags: &[u8],
) {
    buf.extend_from_slice(head);
    buf.push(b':');
    write_value(buf, value);
    buf.push(b'|');
    buf.extend_from_slice(metric_type.as_str().as_bytes());
    if sample_rate < 1.0 {
        buf.extend_from_slice(b"|@");
        let mut b = ryu::Buffer::new();
        buf.extend_from_slice(b.format(sample_rate).as_bytes());
    }
    buf.extend_from_slice(tags);
}
