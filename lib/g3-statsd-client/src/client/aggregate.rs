/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::time::{Duration, Instant};

use foldhash::fast::RandomState;

use super::formatter::MetricType;

#[derive(Debug, Hash, PartialEq, Eq)]
pub(super) struct ContextKey {
    pub(super) metric_type: MetricType,
    pub(super) head: Vec<u8>,
    pub(super) tags: Vec<u8>,
}

/// Client side aggregation of count and gauge lines.
///
/// Counts of the same context are summed, gauges keep the last value.
pub(super) struct StatsdAggregator {
    hash_state: RandomState,
    shards: Vec<HashMap<ContextKey, f64, RandomState>>,
    flush_interval: Duration,
    last_flush: Instant,
}

impl StatsdAggregator {
    pub(super) fn new(shards: usize, flush_interval: Duration) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| HashMap::with_hasher(RandomState::default()))
            .collect();
        StatsdAggregator {
            hash_state: RandomState::default(),
            shards,
            flush_interval,
            last_flush: Instant::now(),
        }
    }

    pub(super) fn add(&mut self, key: ContextKey, value: f64) {
        let index = (self.hash_state.hash_one(&key) as usize) % self.shards.len();
        let shard = &mut self.shards[index];
        match key.metric_type {
            MetricType::Count => *shard.entry(key).or_insert(0.0) += value,
            MetricType::Gauge | MetricType::Distribution => {
                shard.insert(key, value);
            }
        }
    }

    pub(super) fn is_due(&self) -> bool {
        self.last_flush.elapsed() >= self.flush_interval
    }

    pub(super) fn context_count(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    pub(super) fn take_all(&mut self) -> Vec<(ContextKey, f64)> {
        let mut contexts = Vec::with_capacity(self.context_count());
        for shard in self.shards.iter_mut() {
            contexts.extend(shard.drain());
        }
        self.last_flush = Instant::now();
        contexts
    }
}
