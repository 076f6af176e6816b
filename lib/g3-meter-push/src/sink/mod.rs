/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

mod statsd;

/// The transport which accepts metric submissions.
///
/// Tags are rendered already, in `key:value` form.
pub trait MetricSink {
    fn count(&mut self, name: &str, value: f64, sample_rate: f64, tags: &[String])
    -> io::Result<()>;

    fn gauge(&mut self, name: &str, value: f64, sample_rate: f64, tags: &[String])
    -> io::Result<()>;

    fn distribution(
        &mut self,
        name: &str,
        value: f64,
        sample_rate: f64,
        tags: &[String],
    ) -> io::Result<()>;

    /// Called once at the end of each publish pass.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Called when the registry is closed, after the final publish pass.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}
