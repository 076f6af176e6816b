/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Weak;
use std::sync::atomic::Ordering;
use std::time::Duration;

use portable_atomic::AtomicF64;

use crate::{Measurement, Meter, MeterId, MeterType, Statistic};

enum GaugeSource {
    Value(AtomicF64),
    Function(Box<dyn Fn() -> f64 + Send + Sync>),
}

/// A gauge samples its value at measure time.
///
/// A gauge bound to a [`Weak`] reference reports NaN once the referent is
/// gone, such values are dropped by the transport.
pub struct Gauge {
    id: MeterId,
    source: GaugeSource,
}

impl Gauge {
    /// A gauge holding a value which can be changed by [`Gauge::set`].
    pub fn new(id: MeterId) -> Self {
        Gauge {
            id: id.with_type(MeterType::Gauge),
            source: GaugeSource::Value(AtomicF64::new(0.0)),
        }
    }

    pub fn with_fn<F>(id: MeterId, f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Gauge {
            id: id.with_type(MeterType::Gauge),
            source: GaugeSource::Function(Box::new(f)),
        }
    }

    pub fn with_weak<T, F>(id: MeterId, obj: Weak<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Gauge::with_fn(id, move || match obj.upgrade() {
            Some(v) => f(&v),
            None => f64::NAN,
        })
    }

    /// Set the value of a value-holding gauge, no effect for function gauges.
    pub fn set(&self, v: f64) {
        if let GaugeSource::Value(cell) = &self.source {
            cell.store(v, Ordering::Relaxed);
        }
    }

    pub fn value(&self) -> f64 {
        match &self.source {
            GaugeSource::Value(cell) => cell.load(Ordering::Relaxed),
            GaugeSource::Function(f) => f(),
        }
    }
}

impl Meter for Gauge {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        vec![Measurement::new(Statistic::Value, self.value())]
    }
}

pub struct TimeGauge {
    id: MeterId,
    f: Box<dyn Fn() -> Duration + Send + Sync>,
}

impl TimeGauge {
    pub fn new<F>(id: MeterId, f: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        TimeGauge {
            id: id.with_type(MeterType::TimeGauge),
            f: Box::new(f),
        }
    }

    pub fn value_ms(&self) -> f64 {
        super::duration_ms((self.f)())
    }
}

impl Meter for TimeGauge {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        vec![Measurement::new(Statistic::Value, self.value_ms())]
    }
}
