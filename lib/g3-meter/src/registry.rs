/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use arc_swap::ArcSwap;
use foldhash::fast::FixedState;
use thiserror::Error;

use crate::{
    ArcMeter, Counter, DistributionSummary, FunctionCounter, FunctionTimer, Gauge, GenericMeter,
    LongTaskTimer, Measurement, Meter, MeterId, MeterType, TimeGauge, Timer,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("meter {id} has already been registered as {existed}, requested {requested}")]
    TypeMismatch {
        id: String,
        existed: MeterType,
        requested: MeterType,
    },
}

struct RegisteredMeter {
    meter: ArcMeter,
    typed: Arc<dyn Any + Send + Sync>,
}

/// The set of meters of a process.
///
/// Writers are serialized by an index lock, while readers get an immutable
/// snapshot through [`MeterRegistry::meters`] without taking any lock.
pub struct MeterRegistry {
    index: Mutex<HashMap<MeterId, RegisteredMeter, FixedState>>,
    snapshot: ArcSwap<Vec<ArcMeter>>,
}

impl Default for MeterRegistry {
    fn default() -> Self {
        MeterRegistry::new()
    }
}

impl MeterRegistry {
    pub fn new() -> Self {
        MeterRegistry {
            index: Mutex::new(HashMap::with_hasher(FixedState::default())),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    fn lock_index(&self) -> MutexGuard<'_, HashMap<MeterId, RegisteredMeter, FixedState>> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn get_or_register<T, F>(
        &self,
        id: MeterId,
        meter_type: MeterType,
        build: F,
    ) -> Result<Arc<T>, RegistryError>
    where
        T: Meter + 'static,
        F: FnOnce(MeterId) -> Arc<T>,
    {
        let mut index = self.lock_index();
        if let Some(r) = index.get(&id) {
            let existed = r.meter.id().meter_type();
            if existed == meter_type
                && let Ok(meter) = r.typed.clone().downcast::<T>()
            {
                return Ok(meter);
            }
            return Err(RegistryError::TypeMismatch {
                id: id.to_string(),
                existed,
                requested: meter_type,
            });
        }

        let meter = build(id.clone());
        index.insert(
            id,
            RegisteredMeter {
                meter: meter.clone(),
                typed: meter.clone(),
            },
        );
        let mut meters = Vec::clone(&self.snapshot.load());
        meters.push(meter.clone());
        self.snapshot.store(Arc::new(meters));
        Ok(meter)
    }

    pub fn counter(&self, id: MeterId) -> Result<Arc<Counter>, RegistryError> {
        self.get_or_register(id, MeterType::Counter, |id| Arc::new(Counter::new(id)))
    }

    /// Get a gauge which holds a value set by the caller.
    pub fn gauge(&self, id: MeterId) -> Result<Arc<Gauge>, RegistryError> {
        self.get_or_register(id, MeterType::Gauge, |id| Arc::new(Gauge::new(id)))
    }

    pub fn gauge_fn<F>(&self, id: MeterId, f: F) -> Result<Arc<Gauge>, RegistryError>
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.get_or_register(id, MeterType::Gauge, |id| Arc::new(Gauge::with_fn(id, f)))
    }

    pub fn time_gauge<F>(&self, id: MeterId, f: F) -> Result<Arc<TimeGauge>, RegistryError>
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        self.get_or_register(id, MeterType::TimeGauge, |id| {
            Arc::new(TimeGauge::new(id, f))
        })
    }

    pub fn timer(&self, id: MeterId) -> Result<Arc<Timer>, RegistryError> {
        self.get_or_register(id, MeterType::Timer, |id| Arc::new(Timer::new(id)))
    }

    pub fn summary(&self, id: MeterId) -> Result<Arc<DistributionSummary>, RegistryError> {
        self.get_or_register(id, MeterType::DistributionSummary, |id| {
            Arc::new(DistributionSummary::new(id))
        })
    }

    pub fn long_task_timer(&self, id: MeterId) -> Result<Arc<LongTaskTimer>, RegistryError> {
        self.get_or_register(id, MeterType::LongTaskTimer, |id| {
            Arc::new(LongTaskTimer::new(id))
        })
    }

    pub fn function_counter<F>(
        &self,
        id: MeterId,
        f: F,
    ) -> Result<Arc<FunctionCounter>, RegistryError>
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.get_or_register(id, MeterType::FunctionCounter, |id| {
            Arc::new(FunctionCounter::new(id, f))
        })
    }

    pub fn function_timer<C, T>(
        &self,
        id: MeterId,
        count: C,
        total_ms: T,
    ) -> Result<Arc<FunctionTimer>, RegistryError>
    where
        C: Fn() -> f64 + Send + Sync + 'static,
        T: Fn() -> f64 + Send + Sync + 'static,
    {
        self.get_or_register(id, MeterType::FunctionTimer, |id| {
            Arc::new(FunctionTimer::new(id, count, total_ms))
        })
    }

    pub fn meter<F>(
        &self,
        id: MeterId,
        meter_type: MeterType,
        f: F,
    ) -> Result<Arc<GenericMeter>, RegistryError>
    where
        F: Fn() -> Vec<Measurement> + Send + Sync + 'static,
    {
        self.get_or_register(id, meter_type, |id| {
            Arc::new(GenericMeter::new(id, meter_type, f))
        })
    }

    /// Register a meter built by the caller.
    ///
    /// The existed one is returned if a meter of the same type and id has
    /// already been registered.
    pub fn register<T: Meter + 'static>(&self, meter: Arc<T>) -> Result<Arc<T>, RegistryError> {
        let id = meter.id().clone();
        let meter_type = id.meter_type();
        self.get_or_register(id, meter_type, move |_| meter)
    }

    pub fn remove(&self, id: &MeterId) -> Option<ArcMeter> {
        let mut index = self.lock_index();
        let r = index.remove(id)?;
        let meters: Vec<ArcMeter> = self
            .snapshot
            .load()
            .iter()
            .filter(|m| m.id() != id)
            .cloned()
            .collect();
        self.snapshot.store(Arc::new(meters));
        Some(r.meter)
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Get the current meters in registration order.
    pub fn meters(&self) -> Arc<Vec<ArcMeter>> {
        self.snapshot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeterTags;

    fn id(name: &str) -> MeterId {
        MeterId::new(name, MeterType::Other).with_tags(MeterTags::new().with("env", "dev"))
    }

    #[test]
    fn get_existed() {
        let registry = MeterRegistry::new();
        let c1 = registry.counter(id("counter_example")).unwrap();
        c1.increment();
        let c2 = registry.counter(id("counter_example")).unwrap();
        c2.increment_by(2.0);
        assert!(Arc::ptr_eq(&c1, &c2));
        assert_eq!(c1.count(), 3.0);
        assert_eq!(registry.len(), 1);

        let other = registry.counter(id("counter_example").with_tag("zone", "a")).unwrap();
        assert!(!Arc::ptr_eq(&c1, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn type_mismatch() {
        let registry = MeterRegistry::new();
        registry.counter(id("m")).unwrap();
        let e = registry.timer(id("m")).err().unwrap();
        let RegistryError::TypeMismatch {
            existed, requested, ..
        } = e;
        assert_eq!(existed, MeterType::Counter);
        assert_eq!(requested, MeterType::Timer);

        assert!(registry.meter(id("m"), MeterType::Counter, Vec::new).is_err());
        assert!(registry.gauge_fn(id("g"), || 1.0).is_ok());
        assert!(registry.gauge(id("g")).is_ok());
        assert!(registry.time_gauge(id("g"), Duration::default).is_err());
    }

    #[test]
    fn snapshot_isolation() {
        let registry = MeterRegistry::new();
        registry.counter(id("a")).unwrap();
        let before = registry.meters();
        registry.gauge(id("b")).unwrap();
        registry.register(Arc::new(Timer::new(id("c")))).unwrap();
        assert_eq!(before.len(), 1);

        let names: Vec<_> = registry.meters().iter().map(|m| m.id().name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let removed = registry.remove(&id("b")).unwrap();
        assert_eq!(removed.id().meter_type(), MeterType::Gauge);
        assert!(registry.remove(&id("b")).is_none());
        assert_eq!(registry.len(), 2);
        assert_eq!(before.len(), 1);
    }
}
