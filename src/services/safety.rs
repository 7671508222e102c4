// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

pub const REDACTION_MARKER: &str = "[REDACTED]";

/// A credential shape. When `keep` names a capture group, that part of the
/// match (a header name, a `key=` prefix) survives and only the value is
/// masked.
struct SecretPattern {
    name: &'static str,
    regex: Regex,
    keep: Option<&'static str>,
}

static SECRET_PATTERNS: LazyLock<Vec<SecretPattern>> = LazyLock::new(|| {
    let pattern = |name, re: &str, keep| SecretPattern {
        name,
        regex: Regex::new(re).unwrap(),
        keep,
    };
    vec![
        pattern("Anthropic Key", r"sk-ant-[A-Za-z0-9_-]{8,}", None),
        pattern(
            "OpenAI Key",
            r"sk-(?:proj-|svcacct-)?[A-Za-z0-9_-]{16,}",
            None,
        ),
        pattern("Google API Key", r"AIza[0-9A-Za-z_-]{16,}", None),
        pattern("AWS Key", r"AKIA[0-9A-Z]{16}", None),
        pattern("GitHub Token", r"gh[pousr]_[A-Za-z0-9]{16,}", None),
        pattern(
            "JSON Web Token",
            r"eyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}",
            None,
        ),
        pattern(
            "Bearer Token",
            r"(?i)(?P<keep>\bbearer\s+)[A-Za-z0-9._~+/=-]{8,}",
            Some("keep"),
        ),
        pattern(
            "Auth Header",
            r#"(?i)(?P<keep>\b(?:x-api-key|x-goog-api-key|api-key|authorization)["']?\s*[:=]\s*["']?)[^\s"',;\[]{8,}"#,
            Some("keep"),
        ),
        pattern(
            "Query Credential",
            r"(?i)(?P<keep>[?&](?:key|api_key|apikey|access_token|token)=)[^&\s\x22'\[]+",
            Some("keep"),
        ),
        pattern(
            "Assigned Secret",
            r#"(?i)(?P<keep>\b(?:api[_-]?key|apikey|secret|token|password)["']?\s*[:=]\s*["']?)[A-Za-z0-9_\-./+=]{8,}"#,
            Some("keep"),
        ),
    ]
});

static ADJACENT_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[REDACTED\](?:[\s:=]*\[REDACTED\])+").unwrap());

/// Mask every credential-shaped substring with [`REDACTION_MARKER`].
/// Markers that end up next to each other collapse into one.
pub fn redact(text: &str) -> String {
    let mut out = Cow::Borrowed(text);

    for pattern in SECRET_PATTERNS.iter() {
        if !pattern.regex.is_match(&out) {
            continue;
        }
        let replaced = pattern
            .regex
            .replace_all(&out, |caps: &Captures| {
                let kept = pattern
                    .keep
                    .and_then(|group| caps.name(group))
                    .map_or("", |m| m.as_str());
                format!("{kept}{REDACTION_MARKER}")
            })
            .into_owned();
        out = Cow::Owned(replaced);
    }

    ADJACENT_MARKERS
        .replace_all(&out, REDACTION_MARKER)
        .into_owned()
}

/// Names of the credential shapes present in `text`.
pub fn detect(text: &str) -> Vec<&'static str> {
    SECRET_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| p.name)
        .collect()
}
