// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::ChangeType;
use crate::services::heuristic;

/// What a backend is asked to return for a classification request.
#[derive(Debug, Deserialize)]
struct StructuredClassification {
    #[serde(rename = "type", alias = "category")]
    change_type: String,
    #[serde(alias = "summary", alias = "subject")]
    description: String,
}

/// A backend answer that survived validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub change_type: ChangeType,
    pub description: String,
}

static CODE_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[a-z]*").unwrap());

const PREAMBLE_PATTERNS: &[&str] = &[
    "here's the description",
    "here is the description",
    "here's the rewritten description",
    "here is the rewritten description",
    "here's the summary",
    "here is the summary",
    "description:",
    "summary:",
];

/// Longest description kept from a backend.
const MAX_DESCRIPTION_CHARS: usize = 200;

pub struct ResponseParser;

impl ResponseParser {
    /// Parse a `{type, description}` answer. `None` when the output is not
    /// JSON, names a type outside the seven, or has an empty description;
    /// callers fall back to the local heuristic in that case.
    pub fn classification(raw: &str) -> Option<Classification> {
        let json = Self::extract_json(raw)?;
        let parsed: StructuredClassification = serde_json::from_str(json).ok()?;

        let change_type = heuristic::normalize_type(&parsed.change_type)?;
        let description = Self::finish_sentence(&Self::clean_text(&parsed.description))?;

        Some(Classification {
            change_type,
            description,
        })
    }

    /// Parse a free-text description. `None` when nothing usable is left.
    pub fn description(raw: &str) -> Option<String> {
        // Some models answer in JSON anyway.
        if let Some(c) = Self::classification(raw) {
            return Some(c.description);
        }
        let cleaned = Self::clean_text(raw);
        let first_line = cleaned.lines().find(|l| !l.trim().is_empty())?;
        Self::finish_sentence(first_line)
    }

    /// Parse a free-text summary; keeps line breaks between sentences.
    pub fn summary(raw: &str) -> Option<String> {
        let cleaned = Self::clean_text(raw);
        let joined = cleaned
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }

    fn extract_json(raw: &str) -> Option<&str> {
        let trimmed = raw.trim();

        if trimmed.starts_with('{') {
            return Some(trimmed);
        }

        // JSON in a code fence, or after a short preamble.
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        (end > start).then(|| &trimmed[start..=end])
    }

    fn clean_text(raw: &str) -> String {
        let mut cleaned = CODE_FENCE_REGEX.replace_all(raw, "").trim().to_string();

        let lower = cleaned.to_lowercase();
        for pattern in PREAMBLE_PATTERNS {
            if lower.starts_with(pattern)
                && let Some(rest) = cleaned.get(pattern.len()..)
            {
                cleaned = rest.trim_start_matches(':').trim().to_string();
                break;
            }
        }

        for quote in ['"', '\'', '`'] {
            if cleaned.len() >= 2 && cleaned.starts_with(quote) && cleaned.ends_with(quote) {
                cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
            }
        }

        cleaned
    }

    /// Strip a leftover type prefix, cap the length, end with a period.
    fn finish_sentence(text: &str) -> Option<String> {
        let text = text.trim();
        let text = match heuristic::conventional_prefix(text) {
            Some((_, end)) => text[end..].trim(),
            None => text,
        };
        if text.is_empty() {
            return None;
        }

        let mut sentence: String = if text.chars().count() > MAX_DESCRIPTION_CHARS {
            let cut: String = text.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
            format!("{}...", cut.trim_end())
        } else {
            text.to_string()
        };

        if let Some(first) = sentence.chars().next()
            && first.is_lowercase()
        {
            sentence = first.to_uppercase().chain(sentence.chars().skip(1)).collect();
        }
        if !sentence.ends_with(['.', '!', '?']) {
            sentence.push('.');
        }
        Some(sentence)
    }
}
