/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::{Measurement, Meter, MeterId, MeterType};

type MeasureFn = Box<dyn Fn() -> Vec<Measurement> + Send + Sync>;

/// A meter of any type defined by its measurement function.
pub struct GenericMeter {
    id: MeterId,
    f: MeasureFn,
}

impl GenericMeter {
    pub fn new<F>(id: MeterId, meter_type: MeterType, f: F) -> Self
    where
        F: Fn() -> Vec<Measurement> + Send + Sync + 'static,
    {
        GenericMeter {
            id: id.with_type(meter_type),
            f: Box::new(f),
        }
    }
}

impl Meter for GenericMeter {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        (self.f)()
    }
}
