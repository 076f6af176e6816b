/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use thiserror::Error;

use g3_meter::{Meter, MeterRegistry};

use crate::{MeterDispatcher, MetricEncoder, MetricSink, NamingConvention};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub meters: usize,
    pub calls: usize,
    pub failed_meters: usize,
    pub failed_calls: usize,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(
        "publish pass incomplete: {} of {} meters failed, {} wire calls failed",
        .stats.failed_meters, .stats.meters, .stats.failed_calls
    )]
    Incomplete { stats: PublishStats },
}

pub trait Publish: Send + Sync {
    fn publish(&self) -> Result<PublishStats, PublishError>;
}

type BoxMetricSink = Box<dyn MetricSink + Send>;

/// Send all meters of a registry to a [`MetricSink`].
pub struct DogStatsdPublisher {
    registry: Arc<MeterRegistry>,
    dispatcher: MeterDispatcher,
    encoder: MetricEncoder,
    sink: Mutex<BoxMetricSink>,
}

impl DogStatsdPublisher {
    pub fn new(registry: Arc<MeterRegistry>, sink: BoxMetricSink) -> Self {
        DogStatsdPublisher {
            registry,
            dispatcher: MeterDispatcher::default(),
            encoder: MetricEncoder::default(),
            sink: Mutex::new(sink),
        }
    }

    pub fn with_naming(mut self, naming: Arc<dyn NamingConvention>) -> Self {
        self.encoder = MetricEncoder::new(naming);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: MeterDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    fn lock_sink(&self) -> MutexGuard<'_, BoxMetricSink> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn close_sink(&self) -> io::Result<()> {
        self.lock_sink().close()
    }

    fn publish_meter(
        &self,
        meter: &dyn Meter,
        sink: &mut dyn MetricSink,
        stats: &mut PublishStats,
    ) {
        for emission in self.dispatcher.dispatch(meter) {
            let call = self.encoder.encode(meter.id(), &emission);
            match call.dispatch(sink) {
                Ok(_) => stats.calls += 1,
                Err(e) => {
                    if stats.failed_calls == 0 {
                        warn!("failed to send metric {}: {e}", call.name);
                    }
                    stats.failed_calls += 1;
                }
            }
        }
    }
}

impl Publish for DogStatsdPublisher {
    fn publish(&self) -> Result<PublishStats, PublishError> {
        let meters = self.registry.meters();
        let mut sink = self.lock_sink();
        let mut stats = PublishStats::default();

        for meter in meters.iter() {
            stats.meters += 1;
            let r = panic::catch_unwind(AssertUnwindSafe(|| {
                self.publish_meter(&**meter, &mut **sink, &mut stats)
            }));
            if r.is_err() {
                warn!("meter {} panicked while being published", meter.id());
                stats.failed_meters += 1;
            }
        }

        if let Err(e) = sink.flush() {
            warn!("failed to flush metric sink: {e}");
            stats.failed_calls += 1;
        }
        debug!(
            "published {} meters with {} wire calls",
            stats.meters, stats.calls
        );

        if stats.failed_meters > 0 || stats.failed_calls > 0 {
            Err(PublishError::Incomplete { stats })
        } else {
            Ok(stats)
        }
    }
}
