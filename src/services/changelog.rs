// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt::Write;

use chrono::NaiveDate;

use crate::config::Config;
use crate::domain::{ChangeType, ChangelogEntry};

/// Which entries make it into the document and how they are grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub included_types: Vec<ChangeType>,
    /// Drop `style` entries regardless of `included_types`.
    pub skip_formatting: bool,
    pub group_by_author: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            included_types: ChangeType::VARIANTS.to_vec(),
            skip_formatting: false,
            group_by_author: false,
        }
    }
}

impl AssemblyOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            included_types: config.included_types.clone(),
            skip_formatting: config.skip_formatting_commits,
            group_by_author: config.group_by_author,
        }
    }

    pub fn keeps(&self, ty: ChangeType) -> bool {
        if self.skip_formatting && ty == ChangeType::Style {
            return false;
        }
        self.included_types.contains(&ty)
    }
}

/// Everything that goes into one rendered document besides the entries.
#[derive(Debug, Clone)]
pub struct ReleaseHeader<'a> {
    pub date: NaiveDate,
    pub range: &'a str,
    pub summary: &'a str,
}

pub struct ChangelogAssembler {
    options: AssemblyOptions,
}

impl ChangelogAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// Entries whose type passes the filters, order preserved.
    pub fn filter(&self, entries: Vec<ChangelogEntry>) -> Vec<ChangelogEntry> {
        entries
            .into_iter()
            .filter(|e| self.options.keeps(e.change_type))
            .collect()
    }

    /// Markdown release notes. `entries` should already be filtered.
    pub fn render(&self, header: &ReleaseHeader<'_>, entries: &[ChangelogEntry]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Release Notes\n");
        let _ = writeln!(out, "Generated on {} for {}.\n", header.date, header.range);

        if !header.summary.trim().is_empty() {
            let _ = writeln!(out, "## Summary\n\n{}\n", header.summary.trim());
        }

        if entries.is_empty() {
            let _ = writeln!(out, "No changes in this range.");
            return out;
        }

        if self.options.group_by_author {
            Self::render_by_author(&mut out, entries);
        } else {
            Self::render_by_type(&mut out, entries);
        }

        // Exactly one trailing newline.
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }

    fn render_by_type(out: &mut String, entries: &[ChangelogEntry]) {
        for ty in ChangeType::VARIANTS {
            let section: Vec<_> = entries.iter().filter(|e| e.change_type == ty).collect();
            if section.is_empty() {
                continue;
            }
            let _ = writeln!(out, "## {}\n", ty.title());
            for entry in section {
                let _ = writeln!(out, "{}", Self::bullet(entry, false));
            }
            out.push('\n');
        }
    }

    fn render_by_author(out: &mut String, entries: &[ChangelogEntry]) {
        // Authors in order of first appearance.
        let mut authors: Vec<&str> = Vec::new();
        for entry in entries {
            let author = entry.commit.author.as_str();
            if !authors.contains(&author) {
                authors.push(author);
            }
        }

        for author in authors {
            let name = if author.trim().is_empty() { "Unknown" } else { author };
            let _ = writeln!(out, "## {name}\n");
            for ty in ChangeType::VARIANTS {
                for entry in entries
                    .iter()
                    .filter(|e| e.commit.author == author && e.change_type == ty)
                {
                    let _ = writeln!(out, "{}", Self::bullet(entry, true));
                }
            }
            out.push('\n');
        }
    }

    fn bullet(entry: &ChangelogEntry, tagged: bool) -> String {
        let description = entry.description.lines().next().unwrap_or("").trim();
        if tagged {
            format!(
                "- **{}**: {} ({})",
                entry.change_type,
                description,
                entry.commit.short_id()
            )
        } else {
            format!("- {} ({})", description, entry.commit.short_id())
        }
    }
}
