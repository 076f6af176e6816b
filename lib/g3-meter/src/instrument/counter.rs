/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::Ordering;

use portable_atomic::AtomicF64;

use crate::{Measurement, Meter, MeterId, MeterType, Statistic};

pub struct Counter {
    id: MeterId,
    total: AtomicF64,
}

impl Counter {
    pub fn new(id: MeterId) -> Self {
        Counter {
            id: id.with_type(MeterType::Counter),
            total: AtomicF64::new(0.0),
        }
    }

    #[inline]
    pub fn increment(&self) {
        self.increment_by(1.0);
    }

    /// Negative or non-finite amounts are ignored, the counter is monotonic.
    pub fn increment_by(&self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.total.fetch_add(amount, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> f64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Meter for Counter {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        vec![Measurement::new(Statistic::Count, self.count())]
    }
}

type CountFn = Box<dyn Fn() -> f64 + Send + Sync>;

pub struct FunctionCounter {
    id: MeterId,
    f: CountFn,
}

impl FunctionCounter {
    pub fn new<F>(id: MeterId, f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        FunctionCounter {
            id: id.with_type(MeterType::FunctionCounter),
            f: Box::new(f),
        }
    }

    pub fn count(&self) -> f64 {
        (self.f)()
    }
}

impl Meter for FunctionCounter {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        vec![Measurement::new(Statistic::Count, self.count())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn cumulative() {
        let c = Counter::new(MeterId::new("counter_example", MeterType::Other));
        assert_eq!(c.id().meter_type(), MeterType::Counter);
        c.increment();
        c.increment_by(2.0);
        c.increment_by(-5.0);
        c.increment_by(f64::NAN);
        assert_eq!(c.measure(), vec![Measurement::new(Statistic::Count, 3.0)]);
        assert_eq!(c.measure(), vec![Measurement::new(Statistic::Count, 3.0)]);
    }

    #[test]
    fn function_backed() {
        let source = Arc::new(AtomicU64::new(7));
        let s = source.clone();
        let c = FunctionCounter::new(MeterId::new("fc", MeterType::Other), move || {
            s.load(Ordering::Relaxed) as f64
        });
        assert_eq!(c.count(), 7.0);
        source.store(9, Ordering::Relaxed);
        assert_eq!(c.measure(), vec![Measurement::new(Statistic::Count, 9.0)]);
    }
}
