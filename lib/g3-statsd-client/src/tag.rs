/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Comma separated DogStatsD tags, stored in wire form.
#[derive(Clone, Debug, Default)]
pub struct StatsdTagGroup {
    buf: Vec<u8>,
}

impl StatsdTagGroup {
    pub fn add_tag<T: AsRef<str>>(&mut self, key: &str, value: T) {
        self.push_separator();
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.push(b':');
        self.buf.extend_from_slice(value.as_ref().as_bytes());
    }

    /// Add a tag which is already rendered, like `env:dev`.
    pub fn add_tag_value<T: AsRef<str>>(&mut self, value: T) {
        self.push_separator();
        self.buf.extend_from_slice(value.as_ref().as_bytes());
    }

    pub fn add_tag_values<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for v in values {
            self.add_tag_value(v);
        }
    }

    fn push_separator(&mut self) {
        if !self.buf.is_empty() {
            self.buf.push(b',');
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_tags() {
        let mut tags = StatsdTagGroup::default();
        assert!(tags.is_empty());
        tags.add_tag("env", "dev");
        tags.add_tag_value("statistic:count");
        tags.add_tag_values(["a:1", "b:2"]);
        assert_eq!(tags.as_bytes(), b"env:dev,statistic:count,a:1,b:2");
    }
}
