/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::sink::SinkStats;

const TELEMETRY_PREFIX: &str = "datadog.dogstatsd.client.";

/// Self metrics of the client, sent along with each flush.
pub(super) struct ClientTelemetry {
    tags: Vec<u8>,
    metrics: u64,
    aggregated_contexts: u64,
}

impl ClientTelemetry {
    pub(super) fn new(transport: &str) -> Self {
        let mut tags = b"|#client:g3,client_transport:".to_vec();
        tags.extend_from_slice(transport.as_bytes());
        ClientTelemetry {
            tags,
            metrics: 0,
            aggregated_contexts: 0,
        }
    }

    #[inline]
    pub(super) fn tags(&self) -> &[u8] {
        &self.tags
    }

    pub(super) fn add_metric(&mut self) {
        self.metrics += 1;
    }

    pub(super) fn add_aggregated_contexts(&mut self, count: usize) {
        self.aggregated_contexts += count as u64;
    }

    /// Get all counts since last call, and reset them.
    pub(super) fn take_counts(&mut self, sink: SinkStats) -> [(String, u64); 5] {
        let counts = [
            ("metrics", std::mem::take(&mut self.metrics)),
            ("packets_sent", sink.packets_sent),
            ("bytes_sent", sink.bytes_sent),
            ("packets_dropped", sink.packets_dropped),
            (
                "aggregated_context",
                std::mem::take(&mut self.aggregated_contexts),
            ),
        ];
        counts.map(|(name, v)| (format!("{TELEMETRY_PREFIX}{name}"), v))
    }
}
