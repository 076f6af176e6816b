/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use serde_json::Value;

fn need_escape(s: &str) -> bool {
    s.bytes().any(|b| b == b'"' || b == b'\\' || b < 0x20)
}

/// Escape as the content of a JSON string, without the quotes.
pub(crate) fn escape_json(s: &str) -> Cow<'_, str> {
    if !need_escape(s) {
        return Cow::Borrowed(s);
    }
    let quoted = Value::String(s.to_string()).to_string();
    let inner = quoted
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(&quoted);
    Cow::Owned(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescape(s: &str) -> String {
        serde_json::from_str::<String>(&format!("\"{s}\"")).unwrap()
    }

    #[test]
    fn plain() {
        assert!(matches!(escape_json("env"), Cow::Borrowed("env")));
        assert!(matches!(escape_json("中文-ü"), Cow::Borrowed(_)));
        assert_eq!(escape_json(""), "");
    }

    #[test]
    fn special() {
        assert_eq!(escape_json("a\"b"), "a\\\"b");
        assert_eq!(escape_json("a\\b"), "a\\\\b");
        assert_eq!(escape_json("a\nb\tc"), "a\\nb\\tc");
        assert_eq!(escape_json("\u{1}"), "\\u0001");
    }

    #[test]
    fn round_trip() {
        for s in [
            "plain",
            "quote\"inside",
            "back\\slash",
            "ctl\u{0}\u{1f}\r\n",
            "colon:and|pipe#",
            "unicode é 中 🚀",
        ] {
            assert_eq!(unescape(&escape_json(s)), s);
        }
    }
}
