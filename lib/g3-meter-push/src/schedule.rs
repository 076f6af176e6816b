/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::Publish;

const DEFAULT_THREAD_NAME: &str = "meter-push";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("the publish scheduler has already been started")]
    AlreadyStarted,
    #[error("invalid publish interval {0:?}")]
    InvalidInterval(Duration),
    #[error("failed to spawn thread: {0}")]
    SpawnFailed(io::Error),
}

struct RunningTask {
    quit_sender: Sender<()>,
    handle: JoinHandle<()>,
}

/// Run publish passes in a dedicated thread.
///
/// A new pass starts `interval` after the end of the previous one, so an
/// overrunning pass delays the next one and passes never overlap.
pub struct PublishScheduler {
    publisher: Arc<dyn Publish>,
    thread_name: String,
    align_to_step: bool,
    running: Mutex<Option<RunningTask>>,
}

impl PublishScheduler {
    pub fn new(publisher: Arc<dyn Publish>) -> Self {
        PublishScheduler {
            publisher,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            align_to_step: false,
            running: Mutex::new(None),
        }
    }

    pub fn with_thread_name<T: Into<String>>(mut self, name: T) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Delay the first pass to the next wall clock multiple of the interval.
    pub fn with_align_to_step(mut self, align: bool) -> Self {
        self.align_to_step = align;
        self
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval));
        }
        let mut running = self.lock_running();
        if running.is_some() {
            return Err(SchedulerError::AlreadyStarted);
        }

        let first_delay = if self.align_to_step {
            delay_to_next_step(interval)
        } else {
            interval
        };
        let (quit_sender, quit_receiver) = flume::bounded(1);
        let publisher = self.publisher.clone();
        let handle = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_loop(publisher, interval, first_delay, quit_receiver))
            .map_err(SchedulerError::SpawnFailed)?;
        info!(
            "started publishing metrics every {interval:?} in thread {}",
            self.thread_name
        );

        *running = Some(RunningTask {
            quit_sender,
            handle,
        });
        Ok(())
    }

    /// Stop the scheduler, the in-flight pass will be completed before return.
    pub fn stop(&self) {
        let Some(task) = self.lock_running().take() else {
            return;
        };
        let _ = task.quit_sender.send(());
        if task.handle.thread().id() == std::thread::current().id() {
            // called within the pass, the loop will exit after it
            return;
        }
        if task.handle.join().is_err() {
            warn!("thread {} exited abnormally", self.thread_name);
        }
        info!("stopped publishing metrics");
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }
}

impl Drop for PublishScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    publisher: Arc<dyn Publish>,
    interval: Duration,
    first_delay: Duration,
    quit_receiver: Receiver<()>,
) {
    let mut delay = first_delay;
    loop {
        match quit_receiver.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
        }

        publish_once(publisher.as_ref());
        delay = interval;
    }
}

fn publish_once(publisher: &dyn Publish) {
    match panic::catch_unwind(AssertUnwindSafe(|| publisher.publish())) {
        Ok(Ok(stats)) => debug!("publish pass done: {stats:?}"),
        Ok(Err(e)) => warn!("{e}"),
        Err(_) => error!("publish pass panicked"),
    }
}

fn delay_to_next_step(interval: Duration) -> Duration {
    let Ok(step_ms) = i64::try_from(interval.as_millis()) else {
        return interval;
    };
    if step_ms <= 0 {
        return interval;
    }
    let now_ms = chrono::Utc::now().timestamp_millis();
    let offset = step_ms - now_ms.rem_euclid(step_ms);
    // one more millisecond to land after the boundary
    Duration::from_millis(offset as u64 + 1)
}
