/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statistic {
    Count,
    Total,
    Max,
    Value,
    Duration,
    ActiveTasks,
    Unknown,
}

impl Statistic {
    pub fn tag_value(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Total => "total",
            Statistic::Max => "max",
            Statistic::Value => "value",
            Statistic::Duration => "duration",
            Statistic::ActiveTasks => "active_tasks",
            Statistic::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_value())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub statistic: Statistic,
    pub value: f64,
}

impl Measurement {
    pub fn new(statistic: Statistic, value: f64) -> Self {
        Measurement { statistic, value }
    }
}
