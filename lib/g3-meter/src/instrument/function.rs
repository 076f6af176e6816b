/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::{Measurement, Meter, MeterId, MeterType, Statistic};

type ValueFn = Box<dyn Fn() -> f64 + Send + Sync>;

/// A timer whose count and total time (in milliseconds) come from functions.
pub struct FunctionTimer {
    id: MeterId,
    count: ValueFn,
    total_ms: ValueFn,
}

impl FunctionTimer {
    pub fn new<C, T>(id: MeterId, count: C, total_ms: T) -> Self
    where
        C: Fn() -> f64 + Send + Sync + 'static,
        T: Fn() -> f64 + Send + Sync + 'static,
    {
        FunctionTimer {
            id: id.with_type(MeterType::FunctionTimer),
            count: Box::new(count),
            total_ms: Box::new(total_ms),
        }
    }
}

impl Meter for FunctionTimer {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        let count = (self.count)();
        let total = (self.total_ms)();
        let mean = if count > 0.0 { total / count } else { 0.0 };
        vec![
            Measurement::new(Statistic::Count, count),
            Measurement::new(Statistic::Total, total),
            Measurement::new(Statistic::Value, mean),
        ]
    }
}
