// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

//! Network-free classification and description cleanup.
//!
//! Everything here is a pure function of the commit message (and, for
//! [`classify_with_diff`], the diff). Hosted providers call into it whenever
//! a backend is unavailable or returns something unusable, and the offline
//! provider is built entirely on top of it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{ChangeType, ChangelogEntry};

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<type>[A-Za-z]+)(?:\([^)]*\))?!?:\s*").unwrap()
});

/// Checked in order; the first hit wins. `fix` goes first so "fix the add
/// button" is a fix, not a feature.
static KEYWORDS: LazyLock<Vec<(ChangeType, Regex)>> = LazyLock::new(|| {
    vec![
        (
            ChangeType::Fix,
            Regex::new(r"(?i)\b(fix(es|ed)?|bugs?|bugfix|hotfix|resolve[sd]?|patch(es|ed)?|crash(es)?)\b")
                .unwrap(),
        ),
        (
            ChangeType::Docs,
            Regex::new(r"(?i)\b(docs?|documentation|documented|readme|changelog)\b").unwrap(),
        ),
        (
            ChangeType::Test,
            Regex::new(r"(?i)\b(tests?|testing|specs?|coverage)\b").unwrap(),
        ),
        (
            ChangeType::Refactor,
            Regex::new(r"(?i)\b(refactor(s|ed|ing)?|restructure[sd]?|simplif(y|ies|ied)|cleanup|clean up)\b")
                .unwrap(),
        ),
        (
            ChangeType::Style,
            Regex::new(r"(?i)\b(style|format(s|ted|ting)?|lint(s|ed|ing)?|whitespace|indentation|rustfmt|prettier)\b")
                .unwrap(),
        ),
        (
            ChangeType::Feat,
            Regex::new(r"(?i)\b(add(s|ed)?|new|implement(s|ed)?|introduce[sd]?|support(s|ed)?|feature)\b")
                .unwrap(),
        ),
    ]
});

/// Lines changed below which the diff says nothing about intent.
const MIN_SHAPE_LINES: usize = 10;
/// `additions >= FEAT_RATIO * deletions` reads as new functionality.
const FEAT_RATIO: usize = 3;
/// Balanced rewrites at least this large read as refactors.
const REFACTOR_MIN_LINES: usize = 40;
const REFACTOR_BALANCE: f64 = 0.6;
/// Below this share of meaningful lines the change is formatting.
const STYLE_MEANINGFUL_SHARE: f64 = 0.3;

/// Map a type token, including common aliases, onto the seven categories.
pub fn normalize_type(raw: &str) -> Option<ChangeType> {
    match raw.trim().to_lowercase().as_str() {
        "feat" | "feature" | "features" => Some(ChangeType::Feat),
        "fix" | "fixes" | "bugfix" | "hotfix" => Some(ChangeType::Fix),
        "docs" | "doc" | "documentation" => Some(ChangeType::Docs),
        "refactor" | "perf" | "refactoring" => Some(ChangeType::Refactor),
        "style" | "format" | "formatting" => Some(ChangeType::Style),
        "test" | "tests" => Some(ChangeType::Test),
        "chore" | "build" | "ci" | "deps" | "revert" | "release" => Some(ChangeType::Chore),
        _ => None,
    }
}

/// Type named by a `type(scope)!: subject` prefix, with the byte length of
/// that prefix.
pub fn conventional_prefix(message: &str) -> Option<(ChangeType, usize)> {
    let caps = CONVENTIONAL_PREFIX.captures(message)?;
    let ty = normalize_type(caps.name("type")?.as_str())?;
    Some((ty, caps.get(0)?.end()))
}

pub fn keyword_type(message: &str) -> Option<ChangeType> {
    KEYWORDS
        .iter()
        .find(|(_, re)| re.is_match(message))
        .map(|(ty, _)| *ty)
}

/// Prefix, then keywords, then `chore`.
pub fn classify(message: &str) -> ChangeType {
    conventional_prefix(message)
        .map(|(ty, _)| ty)
        .or_else(|| keyword_type(message))
        .unwrap_or(ChangeType::Chore)
}

/// Like [`classify`], with the diff shape consulted before giving up.
pub fn classify_with_diff(message: &str, diff: &str) -> ChangeType {
    conventional_prefix(message)
        .map(|(ty, _)| ty)
        .or_else(|| keyword_type(message))
        .or_else(|| DiffShape::from_diff(diff).suggest())
        .unwrap_or(ChangeType::Chore)
}

/// Already good enough to publish: long, and carrying one of the seven
/// types as an exact conventional prefix.
pub fn is_well_formed(message: &str) -> bool {
    let message = message.trim();
    if message.chars().count() <= 30 {
        return false;
    }
    CONVENTIONAL_PREFIX
        .captures(message)
        .and_then(|caps| caps.name("type"))
        .is_some_and(|t| ChangeType::parse(&t.as_str().to_lowercase()).is_some())
}

/// Subject line without its conventional prefix, capitalized, ending in a
/// period. Never empty.
pub fn clean_description(message: &str) -> String {
    let subject = message.lines().next().unwrap_or("").trim();
    let body = match conventional_prefix(subject) {
        Some((_, end)) => subject[end..].trim(),
        None => subject,
    };
    let body = if body.is_empty() { subject } else { body };
    if body.is_empty() {
        return "Miscellaneous changes.".to_string();
    }

    let mut chars = body.chars();
    let mut cleaned: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    if !cleaned.ends_with(['.', '!', '?']) {
        cleaned.push('.');
    }
    cleaned
}

fn count_phrase(ty: ChangeType, n: usize) -> String {
    let (singular, plural) = match ty {
        ChangeType::Feat => ("new feature", "new features"),
        ChangeType::Fix => ("bug fix", "bug fixes"),
        ChangeType::Refactor => ("code improvement", "code improvements"),
        ChangeType::Docs => ("documentation update", "documentation updates"),
        ChangeType::Style => ("style change", "style changes"),
        ChangeType::Test => ("test update", "test updates"),
        ChangeType::Chore => ("maintenance task", "maintenance tasks"),
    };
    format!("{n} {}", if n == 1 { singular } else { plural })
}

/// Templated summary built from per-type counts, used when no backend can
/// write one.
pub fn summary_template(entries: &[ChangelogEntry]) -> String {
    let mut counts: HashMap<ChangeType, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.change_type).or_default() += 1;
    }

    let parts: Vec<String> = ChangeType::VARIANTS
        .iter()
        .filter_map(|ty| counts.get(ty).map(|n| count_phrase(*ty, *n)))
        .collect();

    match parts.as_slice() {
        [] => "This release contains no notable changes.".to_string(),
        [only] => format!("This release includes {only}."),
        [init @ .., last] => format!("This release includes {} and {last}.", init.join(", ")),
    }
}

/// Line-level shape of a unified diff.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffShape {
    pub additions: usize,
    pub deletions: usize,
    /// Changed lines whose whitespace-free content is neither blank nor
    /// mirrored on the other side of the diff.
    pub meaningful: usize,
}

impl DiffShape {
    pub fn from_diff(diff: &str) -> Self {
        let mut added: HashMap<String, usize> = HashMap::new();
        let mut removed: HashMap<String, usize> = HashMap::new();
        let mut shape = Self::default();

        for line in diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                continue;
            }
            let (bucket, content) = if let Some(rest) = line.strip_prefix('+') {
                shape.additions += 1;
                (&mut added, rest)
            } else if let Some(rest) = line.strip_prefix('-') {
                shape.deletions += 1;
                (&mut removed, rest)
            } else {
                continue;
            };
            let squashed: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            *bucket.entry(squashed).or_default() += 1;
        }

        let unmatched = |side: &HashMap<String, usize>, other: &HashMap<String, usize>| -> usize {
            side.iter()
                .filter(|(text, _)| !text.is_empty())
                .map(|(text, n)| n.saturating_sub(other.get(text).copied().unwrap_or(0)))
                .sum()
        };
        shape.meaningful = unmatched(&added, &removed) + unmatched(&removed, &added);
        shape
    }

    pub fn total(&self) -> usize {
        self.additions + self.deletions
    }

    /// Type the shape leans towards, if it leans at all.
    pub fn suggest(&self) -> Option<ChangeType> {
        let total = self.total();
        if total < MIN_SHAPE_LINES {
            return None;
        }

        if (self.meaningful as f64) < STYLE_MEANINGFUL_SHARE * total as f64 {
            return Some(ChangeType::Style);
        }

        if self.additions >= FEAT_RATIO * self.deletions.max(1) {
            return Some(ChangeType::Feat);
        }

        let (small, large) = if self.additions < self.deletions {
            (self.additions, self.deletions)
        } else {
            (self.deletions, self.additions)
        };
        if total >= REFACTOR_MIN_LINES && small as f64 >= REFACTOR_BALANCE * large as f64 {
            return Some(ChangeType::Refactor);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_with_scope_and_bang() {
        assert_eq!(
            conventional_prefix("feat(api)!: drop v1 routes").map(|(t, _)| t),
            Some(ChangeType::Feat)
        );
    }

    #[test]
    fn prefix_is_case_insensitive() {
        assert_eq!(classify("FIX: null deref"), ChangeType::Fix);
    }

    #[test]
    fn unknown_prefix_falls_through_to_keywords() {
        assert_eq!(classify("wip: add export button"), ChangeType::Feat);
    }

    #[test]
    fn nothing_matches_is_chore() {
        assert_eq!(classify("bump version"), ChangeType::Chore);
    }

    #[test]
    fn whitespace_only_diff_is_style() {
        let diff = (0..12)
            .map(|i| format!("-fn f{i}() {{}}\n+fn f{i}()  {{ }}\n"))
            .collect::<String>();
        let shape = DiffShape::from_diff(&diff);
        assert_eq!(shape.meaningful, 0);
        assert_eq!(shape.suggest(), Some(ChangeType::Style));
    }

    #[test]
    fn clean_description_strips_prefix() {
        assert_eq!(clean_description("fix(auth): resolve login issue"), "Resolve login issue.");
    }
}
