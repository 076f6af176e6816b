/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeterType {
    Counter,
    Gauge,
    Timer,
    DistributionSummary,
    LongTaskTimer,
    TimeGauge,
    FunctionCounter,
    FunctionTimer,
    Other,
}

impl MeterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterType::Counter => "counter",
            MeterType::Gauge => "gauge",
            MeterType::Timer => "timer",
            MeterType::DistributionSummary => "distribution_summary",
            MeterType::LongTaskTimer => "long_task_timer",
            MeterType::TimeGauge => "time_gauge",
            MeterType::FunctionCounter => "function_counter",
            MeterType::FunctionTimer => "function_timer",
            MeterType::Other => "other",
        }
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags sorted by key, each key appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MeterTags(BTreeMap<String, String>);

impl MeterTags {
    pub fn new() -> Self {
        MeterTags::default()
    }

    /// Add a tag, the value of an existed key will be replaced.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MeterTags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = MeterTags::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

/// The identity of a meter.
///
/// Two ids are the same meter if both the name and the tags are equal.
#[derive(Clone, Debug)]
pub struct MeterId {
    name: String,
    tags: MeterTags,
    meter_type: MeterType,
    base_unit: Option<String>,
    description: Option<String>,
}

impl MeterId {
    pub fn new<N: Into<String>>(name: N, meter_type: MeterType) -> Self {
        MeterId {
            name: name.into(),
            tags: MeterTags::default(),
            meter_type,
            base_unit: None,
            description: None,
        }
    }

    pub fn with_tags(mut self, tags: MeterTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_base_unit<T: Into<String>>(mut self, unit: T) -> Self {
        self.base_unit = Some(unit.into());
        self
    }

    pub fn with_description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn with_type(mut self, meter_type: MeterType) -> Self {
        self.meter_type = meter_type;
        self
    }

    /// Get a copy with `"." + suffix` appended to the name.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut id = self.clone();
        id.name.reserve(suffix.len() + 1);
        id.name.push('.');
        id.name.push_str(suffix);
        id
    }

    /// Get a copy with one more tag.
    pub fn with_tag<K: Into<String>, V: Into<String>>(&self, key: K, value: V) -> Self {
        let mut id = self.clone();
        id.tags.insert(key, value);
        id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tags(&self) -> &MeterTags {
        &self.tags
    }

    #[inline]
    pub fn meter_type(&self) -> MeterType {
        self.meter_type
    }

    #[inline]
    pub fn base_unit(&self) -> Option<&str> {
        self.base_unit.as_deref()
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for MeterId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.tags == other.tags
    }
}

impl Eq for MeterId {}

impl Hash for MeterId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.tags.hash(state);
    }
}

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.tags.is_empty() {
            f.write_str("{")?;
            for (i, (k, v)) in self.tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}
