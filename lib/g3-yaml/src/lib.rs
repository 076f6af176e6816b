/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

pub mod humanize;
pub mod key;
pub mod value;

#[doc(hidden)]
pub mod __private {
    pub use yaml_rust::YamlLoader;
}

/// Parse a yaml string and return the first document, for use in tests only.
#[macro_export]
macro_rules! yaml_doc {
    ($s:expr) => {
        $crate::__private::YamlLoader::load_from_str($s)
            .unwrap()
            .remove(0)
    };
}

pub fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        let Yaml::String(key) = k else {
            return Err(anyhow!("key in hash should be string, found {k:?}"));
        };
        f(key, v).context(format!("failed to parse value of key {key}"))?;
    }
    Ok(())
}

/// Load the first yaml document found in `path`.
///
/// An empty file gives `Yaml::Null`.
pub fn load_doc(path: &Path) -> anyhow::Result<Yaml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read file {}: {e}", path.display()))?;
    let mut docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    if docs.is_empty() {
        Ok(Yaml::Null)
    } else {
        Ok(docs.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn foreach_kv_ok() {
        let yaml = yaml_doc!("a: 1\nb: 2");
        let hash = yaml.as_hash().unwrap();
        let mut found = Vec::new();
        foreach_kv(hash, |k, v| {
            found.push((k.to_string(), v.as_i64().unwrap()));
            Ok(())
        })
        .unwrap();
        assert_eq!(found, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn foreach_kv_non_string_key() {
        let yaml = yaml_doc!("123: 1");
        let hash = yaml.as_hash().unwrap();
        assert!(foreach_kv(hash, |_, _| Ok(())).is_err());
    }

    #[test]
    fn foreach_kv_callback_error() {
        let yaml = yaml_doc!("a: 1");
        let hash = yaml.as_hash().unwrap();
        let e = foreach_kv(hash, |k, _| Err(anyhow!("bad {k}"))).unwrap_err();
        assert_eq!(e.to_string(), "failed to parse value of key a");
    }

    #[test]
    fn load_doc_file() {
        let path = std::env::temp_dir().join(format!("g3-yaml-load-{}.yaml", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"step: 5s\n").unwrap();
        drop(f);

        let doc = load_doc(&path).unwrap();
        assert_eq!(doc["step"].as_str(), Some("5s"));
        std::fs::remove_file(&path).unwrap();

        assert!(load_doc(&path).is_err());
    }
}
