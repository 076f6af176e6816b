/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use humanize_rs::ParseError;
use humanize_rs::bytes::Bytes;
use yaml_rust::Yaml;

/// Parse a size value, like `1432`, `8KiB` or `1MB`.
pub fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => {
            let size = s
                .parse::<Bytes>()
                .map_err(|e| anyhow!("invalid humanize size string {s}: {e}"))?;
            Ok(size.size())
        }
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for humanize usize should be 'string' or 'integer'"
        )),
    }
}

/// Parse a duration value.
///
/// Plain numbers are seconds, strings may carry a unit like `500ms` or `1m`.
pub fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => secs_from_str(s),
            Err(e) => Err(anyhow!("invalid humanize duration string {s}: {e}")),
        },
        Yaml::Integer(i) => {
            let secs = u64::try_from(*i).map_err(|_| anyhow!("negative duration value {i}"))?;
            Ok(Duration::from_secs(secs))
        }
        Yaml::Real(s) => secs_from_str(s),
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string', 'integer' or 'real'"
        )),
    }
}

fn secs_from_str(s: &str) -> anyhow::Result<Duration> {
    if let Ok(u) = u64::from_str(s) {
        return Ok(Duration::from_secs(u));
    }
    let f = f64::from_str(s).map_err(|e| anyhow!("invalid duration value {s}: {e}"))?;
    Duration::try_from_secs_f64(f).map_err(|e| anyhow!("out of range duration value {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usize_values() {
        assert_eq!(as_usize(&Yaml::Integer(1432)).unwrap(), 1432);
        assert_eq!(as_usize(&Yaml::String("1432".to_string())).unwrap(), 1432);
        assert_eq!(as_usize(&Yaml::String("8KiB".to_string())).unwrap(), 8192);
        assert_eq!(as_usize(&Yaml::String("1K".to_string())).unwrap(), 1000);

        assert!(as_usize(&Yaml::Integer(-1)).is_err());
        assert!(as_usize(&Yaml::Real("1.5".to_string())).is_err());
        assert!(as_usize(&Yaml::Boolean(true)).is_err());
    }

    #[test]
    fn duration_values() {
        assert_eq!(as_duration(&Yaml::Integer(5)).unwrap(), Duration::from_secs(5));
        assert_eq!(
            as_duration(&Yaml::String("500ms".to_string())).unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            as_duration(&Yaml::String("1m".to_string())).unwrap(),
            Duration::from_secs(60)
        );
        assert_eq!(
            as_duration(&Yaml::String("10".to_string())).unwrap(),
            Duration::from_secs(10)
        );
        assert_eq!(
            as_duration(&Yaml::Real("1.5".to_string())).unwrap(),
            Duration::from_millis(1500)
        );

        assert!(as_duration(&Yaml::Integer(-5)).is_err());
        assert!(as_duration(&Yaml::String("abc".to_string())).is_err());
        assert!(as_duration(&Yaml::Array(Vec::new())).is_err());
    }
}
