// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use crate::domain::{ChangeType, ChangelogEntry, CommitRecord, WritingStyle};
use crate::services::safety;

/// Characters of diff sent to a hosted backend per commit.
pub const DIFF_CHAR_BUDGET: usize = 1_000;

/// Entries listed in a summary prompt; the rest are only counted.
const SUMMARY_ENTRY_LIMIT: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn role(style: WritingStyle) -> &'static str {
    match style {
        WritingStyle::Formal => {
            "You write release notes for an enterprise audience. Use a formal, neutral tone, \
             complete sentences and precise wording. Avoid slang and exclamation marks."
        }
        WritingStyle::DevFriendly => {
            "You write release notes for software developers. Be technical and precise: name \
             the APIs, modules and behaviours that changed. Keep it short."
        }
        WritingStyle::PmStyle => {
            "You write release notes for product managers and end users. Describe what users \
             can now do or what problem went away. Avoid jargon and implementation details."
        }
    }
}

pub fn system_prompt(style: WritingStyle) -> String {
    format!(
        "{role}\n\nRULES:\n\
         1. Describe the ACTUAL change shown in the commit, not the commit process\n\
         2. One sentence, at most 100 characters, ending with a period\n\
         3. Never mention commit hashes, authors or file paths\n\
         4. Follow the requested output format exactly",
        role = role(style)
    )
}

/// Cut `diff` to at most `budget` characters on a char boundary, marking
/// the cut.
pub fn truncate_diff(diff: &str, budget: usize) -> String {
    if diff.chars().count() <= budget {
        return diff.to_string();
    }
    let cut: String = diff.chars().take(budget).collect();
    format!("{cut}\n... (diff truncated)")
}

/// Per-commit block shared by every request. The diff is truncated and
/// scrubbed of credentials before it leaves the machine.
pub fn commit_context(commit: &CommitRecord) -> String {
    let diff = safety::redact(&truncate_diff(&commit.diff, DIFF_CHAR_BUDGET));
    format!(
        "COMMIT MESSAGE:\n{message}\n\nAUTHOR: {author}\nDATE: {date}\n\nDIFF:\n{diff}",
        message = commit.message.trim(),
        author = commit.author,
        date = commit.timestamp,
        diff = if diff.trim().is_empty() { "(no diff)" } else { diff.as_str() },
    )
}

/// Ask for a category and a rewritten description in one JSON object.
pub fn classify_prompt(commit: &CommitRecord, style: WritingStyle) -> Prompt {
    Prompt {
        system: system_prompt(style),
        user: format!(
            "{context}\n\nClassify this commit as exactly one of: {types}.\n\
             Then rewrite its description for the release notes.\n\n\
             Output ONLY this JSON:\n\
             {{\"type\": \"<one of the types>\", \"description\": \"<rewritten description>\"}}",
            context = commit_context(commit),
            types = ChangeType::ALL.join(", "),
        ),
    }
}

/// Ask for a rewritten description only, as plain text.
pub fn enhance_prompt(commit: &CommitRecord, style: WritingStyle) -> Prompt {
    Prompt {
        system: system_prompt(style),
        user: format!(
            "{context}\n\nRewrite this commit's description for the release notes.\n\
             Output ONLY the sentence, without quotes or a type prefix.",
            context = commit_context(commit),
        ),
    }
}

pub fn summary_prompt(entries: &[ChangelogEntry], style: WritingStyle) -> Prompt {
    let mut listing = String::new();
    for entry in entries.iter().take(SUMMARY_ENTRY_LIMIT) {
        listing.push_str(&format!("- [{}] {}\n", entry.change_type, entry.description));
    }
    if entries.len() > SUMMARY_ENTRY_LIMIT {
        listing.push_str(&format!(
            "- ... and {} more changes\n",
            entries.len() - SUMMARY_ENTRY_LIMIT
        ));
    }

    Prompt {
        system: role(style).to_string(),
        user: format!(
            "CHANGES IN THIS RELEASE:\n{listing}\n\
             Write a 2-3 sentence summary of this release that highlights the most \
             significant changes. Output ONLY the summary text."
        ),
    }
}
