/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use g3_meter::{Measurement, Meter, MeterType, Statistic};

/// One value taken from a meter, ready to be encoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
    pub statistic: Statistic,
    pub value: f64,
    pub suffix: Option<&'static str>,
    pub tag_statistic: bool,
}

/// Select the measurements of a meter which should be sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeterDispatcher {
    statistic_tag: bool,
}

impl MeterDispatcher {
    /// Also add a `statistic` tag to each value of multi-statistic meters.
    pub fn with_statistic_tag(statistic_tag: bool) -> Self {
        MeterDispatcher { statistic_tag }
    }

    pub fn dispatch(&self, meter: &dyn Meter) -> Vec<Emission> {
        let measurements = meter.measure();
        match meter.id().meter_type() {
            MeterType::Timer | MeterType::FunctionTimer => raw_value(
                &measurements,
                &[Statistic::Value, Statistic::Duration],
            ),
            MeterType::DistributionSummary => raw_value(&measurements, &[Statistic::Value]),
            MeterType::Counter
            | MeterType::FunctionCounter
            | MeterType::Gauge
            | MeterType::TimeGauge
            | MeterType::LongTaskTimer
            | MeterType::Other => self.every_statistic(&measurements),
        }
    }

    fn every_statistic(&self, measurements: &[Measurement]) -> Vec<Emission> {
        measurements
            .iter()
            .map(|m| Emission {
                statistic: m.statistic,
                value: m.value,
                suffix: Some(m.statistic.tag_value()),
                tag_statistic: self.statistic_tag,
            })
            .collect()
    }
}

/// Take only the first measurement of the most preferred raw statistic.
fn raw_value(measurements: &[Measurement], preferred: &[Statistic]) -> Vec<Emission> {
    preferred
        .iter()
        .find_map(|s| measurements.iter().find(|m| m.statistic == *s))
        .map(|m| Emission {
            statistic: m.statistic,
            value: m.value,
            suffix: None,
            tag_statistic: false,
        })
        .into_iter()
        .collect()
}
