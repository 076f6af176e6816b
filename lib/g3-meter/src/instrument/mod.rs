/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

mod counter;
pub use counter::{Counter, FunctionCounter};

mod gauge;
pub use gauge::{Gauge, TimeGauge};

mod sample;
pub use sample::{DistributionSummary, Timer};

mod long_task;
pub use long_task::{LongTaskSample, LongTaskTimer};

mod function;
pub use function::FunctionTimer;

mod generic;
pub use generic::GenericMeter;

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
