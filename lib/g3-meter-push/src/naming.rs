/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use g3_meter::MeterType;

/// Map meter names and tags to the strings used on the wire.
pub trait NamingConvention: Send + Sync {
    fn name<'a>(&self, name: &'a str, meter_type: MeterType, base_unit: Option<&str>)
    -> Cow<'a, str>;

    fn tag_key<'a>(&self, key: &'a str) -> Cow<'a, str>;

    fn tag_value<'a>(&self, value: &'a str) -> Cow<'a, str>;
}

/// Keep names and tags as they are, no case change and no separator change.
#[derive(Clone, Copy, Debug, Default)]
pub struct DogStatsdNamingConvention;

impl NamingConvention for DogStatsdNamingConvention {
    fn name<'a>(
        &self,
        name: &'a str,
        _meter_type: MeterType,
        _base_unit: Option<&str>,
    ) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    fn tag_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(key)
    }

    fn tag_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough() {
        let n = DogStatsdNamingConvention;
        assert_eq!(
            n.name("My.Counter_total", MeterType::Counter, Some("bytes")),
            "My.Counter_total"
        );
        assert_eq!(n.tag_key("Env-Name"), "Env-Name");
        assert_eq!(n.tag_value("a b.C"), "a b.C");
    }
}
