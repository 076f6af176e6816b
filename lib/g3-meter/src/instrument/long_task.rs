/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use foldhash::fast::FixedState;

use crate::{Measurement, Meter, MeterId, MeterType, Statistic};

type TaskMap = HashMap<u64, Instant, FixedState>;

/// Tracks tasks which are still running.
pub struct LongTaskTimer {
    id: MeterId,
    next_task: AtomicU64,
    tasks: Arc<Mutex<TaskMap>>,
}

/// A running task, which stops when dropped.
pub struct LongTaskSample {
    task: u64,
    tasks: Arc<Mutex<TaskMap>>,
    done: bool,
}

impl LongTaskSample {
    /// Stop the task and get the time it has run.
    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        self.done = true;
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks
            .remove(&self.task)
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }
}

impl Drop for LongTaskSample {
    fn drop(&mut self) {
        if !self.done {
            self.finish();
        }
    }
}

impl LongTaskTimer {
    pub fn new(id: MeterId) -> Self {
        LongTaskTimer {
            id: id.with_type(MeterType::LongTaskTimer),
            next_task: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(TaskMap::default())),
        }
    }

    pub fn start(&self) -> LongTaskSample {
        let task = self.next_task.fetch_add(1, Ordering::Relaxed);
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.insert(task, Instant::now());
        LongTaskSample {
            task,
            tasks: self.tasks.clone(),
            done: false,
        }
    }

    pub fn active_tasks(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.len()
    }
}

impl Meter for LongTaskTimer {
    fn id(&self) -> &MeterId {
        &self.id
    }

    fn measure(&self) -> Vec<Measurement> {
        let now = Instant::now();
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let mut total = 0.0;
        let mut max = 0.0_f64;
        for start in tasks.values() {
            let ms = super::duration_ms(now.saturating_duration_since(*start));
            total += ms;
            max = max.max(ms);
        }
        vec![
            Measurement::new(Statistic::ActiveTasks, tasks.len() as f64),
            Measurement::new(Statistic::Duration, total),
            Measurement::new(Statistic::Max, max),
        ]
    }
}
