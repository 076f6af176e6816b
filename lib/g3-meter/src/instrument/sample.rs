/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use portable_atomic::AtomicF64;

use crate::{Measurement, Meter, MeterId, MeterType, Statistic};

struct SampleState {
    count: AtomicU64,
    total: AtomicF64,
    max: AtomicF64,
    last: AtomicF64,
}

impl SampleState {
    fn new() -> Self {
        SampleState {
            count: AtomicU64::new(0),
            total: AtomicF64::new(0.0),
            max: AtomicF64::new(0.0),
            last: AtomicF64::new(0.0),
        }
    }

    fn record(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(v, Ordering::Relaxed);
        self.max.fetch_max(v, Ordering::Relaxed);
        self.last.store(v, Ordering::Relaxed);
    }

    fn measure(&self) -> Vec<Measurement> {
        vec![
            Measurement::new(Statistic::Count, self.count.load(Ordering::Relaxed) as f64),
            Measurement::new(Statistic::Total, self.total.load(Ordering::Relaxed)),
            Measurement::new(Statistic::Max, self.max.load(Ordering::Relaxed)),
            Measurement::new(Statistic::Value, self.last.load(Ordering::Relaxed)),
        ]
    }
}

/// Records durations in milliseconds.
pub struct Timer {
    id: MeterId,
    state: SampleState,
}

impl Timer {
    pub fn new(id: MeterId) -> Self {
        Timer {
            id: id.with_type(MeterType::Timer),
            state: SampleState::new(),
        }
    }

    pub fn record(&self, d: Duration) {
        self.state.record(super::duration_ms(d));
    }

    pub fn record_ms(&self, ms: f64) {
        if ms.is_finite() && ms >= 0.0 {
            self.state.record(ms);
        }
    }

    /// Run `f` and record the time it takes.
    pub fn record_fn<R, F: FnOnce() -> R>(&self, f: F) -> R {
        let start = Instant::now();
        let r = f();
        self.record(start.elapsed());
        r
    }

    pub fn count(&self) -> u64 {
        self.state.count.load(Ordering::Relaxed)
    }

    pub fn total_ms(&self) -> f64 {
        self.state.total.load(Ordering::Relaxed)
    }
}

impl Meter for Timer {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        self.state.measure()
    }
}

pub struct DistributionSummary {
    id: MeterId,
    scale: f64,
    state: SampleState,
}

impl DistributionSummary {
    pub fn new(id: MeterId) -> Self {
        DistributionSummary {
            id: id.with_type(MeterType::DistributionSummary),
            scale: 1.0,
            state: SampleState::new(),
        }
    }

    /// Every recorded amount will be multiplied by `scale`.
    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() {
            self.scale = scale;
        }
        self
    }

    pub fn record(&self, amount: f64) {
        if amount.is_finite() {
            self.state.record(amount * self.scale);
        }
    }

    pub fn count(&self) -> u64 {
        self.state.count.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> f64 {
        self.state.total.load(Ordering::Relaxed)
    }
}

impl Meter for DistributionSummary {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        self.state.measure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(m: &[Measurement], s: Statistic) -> Option<f64> {
        m.iter().find(|m| m.statistic == s).map(|m| m.value)
    }

    #[test]
    fn timer() {
        let t = Timer::new(MeterId::new("timer_example", MeterType::Other));
        assert_eq!(t.id().meter_type(), MeterType::Timer);
        t.record(Duration::from_millis(1500));
        t.record(Duration::from_millis(20));
        t.record_ms(-1.0);

        let m = t.measure();
        assert_eq!(m.len(), 4);
        assert_eq!(value_of(&m, Statistic::Count), Some(2.0));
        assert_eq!(value_of(&m, Statistic::Total), Some(1520.0));
        assert_eq!(value_of(&m, Statistic::Max), Some(1500.0));
        assert_eq!(value_of(&m, Statistic::Value), Some(20.0));

        let v = t.record_fn(|| 5);
        assert_eq!(v, 5);
        assert_eq!(t.count(), 3);
    }

    #[test]
    fn summary() {
        let s = DistributionSummary::new(MeterId::new("summary_example", MeterType::Other))
            .with_scale(100.0);
        s.record(0.5);
        s.record(0.25);
        s.record(f64::INFINITY);

        let m = s.measure();
        assert_eq!(s.count(), 2);
        assert_eq!(value_of(&m, Statistic::Total), Some(75.0));
        assert_eq!(value_of(&m, Statistic::Max), Some(50.0));
        assert_eq!(value_of(&m, Statistic::Value), Some(25.0));
    }
}
