/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use g3_meter::{MeterId, MeterType};

use crate::escape::escape_json;
use crate::{DogStatsdNamingConvention, Emission, MetricSink, NamingConvention};

const STATISTIC_TAG_KEY: &str = "statistic";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireOperation {
    Count,
    Gauge,
    Distribution,
}

impl WireOperation {
    pub fn for_meter_type(meter_type: MeterType) -> Self {
        match meter_type {
            MeterType::Counter => WireOperation::Count,
            MeterType::LongTaskTimer | MeterType::Timer | MeterType::DistributionSummary => {
                WireOperation::Distribution
            }
            MeterType::Gauge
            | MeterType::TimeGauge
            | MeterType::FunctionCounter
            | MeterType::FunctionTimer
            | MeterType::Other => WireOperation::Gauge,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WireCall {
    pub operation: WireOperation,
    pub name: String,
    pub value: f64,
    pub sample_rate: f64,
    pub tags: Vec<String>,
}

impl WireCall {
    pub fn dispatch(&self, sink: &mut dyn MetricSink) -> io::Result<()> {
        match self.operation {
            WireOperation::Count => {
                sink.count(&self.name, self.value, self.sample_rate, &self.tags)
            }
            WireOperation::Gauge => {
                sink.gauge(&self.name, self.value, self.sample_rate, &self.tags)
            }
            WireOperation::Distribution => {
                sink.distribution(&self.name, self.value, self.sample_rate, &self.tags)
            }
        }
    }
}

pub struct MetricEncoder {
    naming: Arc<dyn NamingConvention>,
}

impl Default for MetricEncoder {
    fn default() -> Self {
        MetricEncoder::new(Arc::new(DogStatsdNamingConvention))
    }
}

impl MetricEncoder {
    pub fn new(naming: Arc<dyn NamingConvention>) -> Self {
        MetricEncoder { naming }
    }

    pub fn encode(&self, id: &MeterId, emission: &Emission) -> WireCall {
        let mut full_id = Cow::Borrowed(id);
        if let Some(suffix) = emission.suffix {
            full_id = Cow::Owned(full_id.with_suffix(suffix));
        }
        if emission.tag_statistic {
            full_id = Cow::Owned(
                full_id.with_tag(STATISTIC_TAG_KEY, emission.statistic.tag_value()),
            );
        }

        let tags = full_id
            .tags()
            .iter()
            .map(|(k, v)| {
                let k = self.naming.tag_key(k);
                let v = self.naming.tag_value(v);
                format!("{}:{}", escape_json(&k), escape_json(&v))
            })
            .collect();
        let name = self
            .naming
            .name(full_id.name(), full_id.meter_type(), full_id.base_unit())
            .into_owned();

        WireCall {
            operation: WireOperation::for_meter_type(full_id.meter_type()),
            name,
            value: emission.value,
            sample_rate: 1.0,
            tags,
        }
    }
}
