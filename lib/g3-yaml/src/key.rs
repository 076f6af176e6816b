/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Config keys are case insensitive, and '-' is the same as '_'.
pub fn normalize(raw: &str) -> String {
    raw.to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key() {
        assert_eq!(normalize("Step"), "step");
        assert_eq!(normalize("max-packet-size"), "max_packet_size");
        assert_eq!(normalize("Enable-Aggregation_x"), "enable_aggregation_x");
    }
}
