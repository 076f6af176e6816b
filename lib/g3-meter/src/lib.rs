/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

mod id;
pub use id::{MeterId, MeterTags, MeterType};

mod measurement;
pub use measurement::{Measurement, Statistic};

mod instrument;
pub use instrument::{
    Counter, DistributionSummary, FunctionCounter, FunctionTimer, Gauge, GenericMeter,
    LongTaskSample, LongTaskTimer, TimeGauge, Timer,
};

mod registry;
pub use registry::{MeterRegistry, RegistryError};

/// A named and tagged instrument which can report its statistics on demand.
pub trait Meter: Send + Sync {
    fn id(&self) -> &MeterId;

    /// Compute the current measurements, nothing is cached between calls.
    fn measure(&self) -> Vec<Measurement>;
}

pub type ArcMeter = Arc<dyn Meter>;
