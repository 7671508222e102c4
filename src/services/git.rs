// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::domain::{BranchComparison, CommitRecord, ComparisonStrategy, RangeSpec};
use crate::error::{Error, Result};

/// `hash, parents, author, author date, raw body`, unit-separated, one
/// record-separated entry per commit.
const LOG_FORMAT: &str = "--format=%H%x1f%P%x1f%an%x1f%aI%x1f%B%x1e";
const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Diff lines kept per commit.
    pub max_diff_lines: usize,
    /// Applies to every mode except branch comparison, which carries its own.
    pub include_merge_commits: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_diff_lines: 500,
            include_merge_commits: false,
        }
    }
}

impl ResolveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_diff_lines: config.max_diff_lines,
            include_merge_commits: config.include_merge_commits,
        }
    }
}

/// Turns a [`RangeSpec`] into commit records, newest first.
pub struct GitService {
    work_dir: PathBuf,
    options: ResolveOptions,
}

impl GitService {
    /// Open the repository containing `path`.
    pub fn open(path: &Path, options: ResolveOptions) -> Result<Self> {
        let repo = gix::discover(path).map_err(|e| Error::Repository {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let work_dir = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| repo.git_dir().to_path_buf());

        debug!(work_dir = %work_dir.display(), "repository opened");
        Ok(Self { work_dir, options })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub async fn resolve(&self, spec: &RangeSpec) -> Result<Vec<CommitRecord>> {
        let mut include_merges = self.options.include_merge_commits;

        let commits = match spec {
            RangeSpec::Count(n) => {
                if !self.has_commits().await? {
                    return Ok(Vec::new());
                }
                let count = format!("--max-count={n}");
                let mut args = vec![LOG_FORMAT, count.as_str()];
                if !include_merges {
                    args.push("--no-merges");
                }
                args.push("HEAD");
                self.log(&args).await?
            }
            RangeSpec::Dates { from, to } => {
                let since = parse_date(from, false)?;
                let until = to.as_deref().map(|t| parse_date(t, true)).transpose()?;
                if let Some(until) = until
                    && since > until
                {
                    return Err(Error::range(
                        format!("{from}..{}", to.as_deref().unwrap_or_default()),
                        "start date is after end date",
                    ));
                }
                if !self.has_commits().await? {
                    return Ok(Vec::new());
                }

                // `--since/--until` would filter on the committer date; records
                // carry the author date, so the bounds are applied to that.
                let until = until.unwrap_or_else(Utc::now);
                self.log(&[LOG_FORMAT, "HEAD"])
                    .await?
                    .into_iter()
                    .filter(|c| authored_within(c, since, until))
                    .collect()
            }
            RangeSpec::Tags { from, to } => {
                let from = self.tag_ref(from).await?;
                let to = match to {
                    Some(to) => self.tag_ref(to).await?,
                    None => "HEAD".to_string(),
                };
                self.log(&[LOG_FORMAT, format!("{from}..{to}").as_str()]).await?
            }
            RangeSpec::Shas { from, to } => {
                let from = self.commit_ref(from).await?;
                let to = match to {
                    Some(to) => self.commit_ref(to).await?,
                    None => "HEAD".to_string(),
                };
                self.log(&[LOG_FORMAT, format!("{from}..{to}").as_str()]).await?
            }
            RangeSpec::Branches(comparison) => {
                include_merges = comparison.include_merge_commits;
                self.compare_branches(comparison).await?
            }
        };

        let total = commits.len();
        let mut seen = HashSet::new();
        let mut commits: Vec<CommitRecord> = commits
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .filter(|c| include_merges || !c.is_merge())
            .collect();

        debug!(
            range = %spec,
            selected = total,
            kept = commits.len(),
            "range resolved"
        );

        for commit in &mut commits {
            commit.diff = self.diff(&commit.id).await?;
        }
        Ok(commits)
    }

    async fn compare_branches(&self, comparison: &BranchComparison) -> Result<Vec<CommitRecord>> {
        // Both names are checked before any range query runs.
        let from = self.branch_ref(&comparison.from).await?;
        let to = self.branch_ref(&comparison.to).await?;

        match comparison.strategy {
            ComparisonStrategy::OneWay => {
                self.log(&[LOG_FORMAT, format!("{from}..{to}").as_str()])
                    .await
            }
            ComparisonStrategy::Symmetric => {
                let range = format!("{from}...{to}");
                let mut args = vec![LOG_FORMAT, range.as_str()];
                if !comparison.include_unmerged {
                    args.push("--right-only");
                }
                self.log(&args).await
            }
            ComparisonStrategy::MergeBase => {
                let base = self
                    .git(&["merge-base", &from, &to])
                    .await
                    .map_err(|_| {
                        Error::range(
                            format!("{}...{}", comparison.from, comparison.to),
                            "branches have no common ancestor",
                        )
                    })?;
                let base = base.trim();
                debug!(base, "merge base resolved");
                self.log(&[LOG_FORMAT, format!("{base}..{to}").as_str()]).await
            }
        }
    }

    /// First of `refs/heads/<name>`, `refs/remotes/<name>`,
    /// `refs/remotes/origin/<name>` that exists.
    async fn branch_ref(&self, name: &str) -> Result<String> {
        reject_option_like(name)?;
        for candidate in [
            format!("refs/heads/{name}"),
            format!("refs/remotes/{name}"),
            format!("refs/remotes/origin/{name}"),
        ] {
            if self.ref_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(Error::range(name, "branch not found locally or on a remote"))
    }

    async fn tag_ref(&self, name: &str) -> Result<String> {
        reject_option_like(name)?;
        let candidate = format!("refs/tags/{name}");
        if self.ref_exists(&candidate).await? {
            Ok(candidate)
        } else {
            Err(Error::range(name, "tag not found"))
        }
    }

    async fn commit_ref(&self, sha: &str) -> Result<String> {
        reject_option_like(sha)?;
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", &format!("{sha}^{{commit}}")])
            .await
            .map_err(|_| Error::range(sha, "commit not found"))?;
        Ok(output.trim().to_string())
    }

    async fn ref_exists(&self, reference: &str) -> Result<bool> {
        let status = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("{reference}^{{commit}}"))
            .current_dir(&self.work_dir)
            .output()
            .await?;
        Ok(status.status.success())
    }

    async fn has_commits(&self) -> Result<bool> {
        self.ref_exists("HEAD").await
    }

    async fn log<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<CommitRecord>> {
        let mut full = vec!["log"];
        full.extend(args.iter().map(AsRef::as_ref));
        let output = self.git(&full).await?;
        Ok(parse_log(&output))
    }

    async fn diff(&self, id: &str) -> Result<String> {
        // --no-ext-diff: don't use external diff tools
        let output = self
            .git(&["show", "--format=", "--no-ext-diff", "--unified=3", id])
            .await?;
        let lines: Vec<&str> = output.lines().take(self.options.max_diff_lines).collect();
        Ok(lines.join("\n"))
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn reject_option_like(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.starts_with('-') {
        return Err(Error::range(name, "not a valid reference name"));
    }
    Ok(())
}

/// `YYYY-MM-DD` or RFC 3339. A bare end date covers that whole day.
fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::range(raw, "expected YYYY-MM-DD or an RFC 3339 timestamp"))?;
    let time = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| Error::range(raw, "date out of range"))
}

/// Author date of `commit` inside `[since, until]`. Unparsable dates never match.
fn authored_within(commit: &CommitRecord, since: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    DateTime::parse_from_rfc3339(commit.timestamp.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .is_ok_and(|ts| since <= ts && ts <= until)
}

fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches(['\n', '\r']);
            if record.is_empty() {
                return None;
            }
            let mut fields = record.splitn(5, FIELD_SEP);
            let id = fields.next()?.trim().to_string();
            if id.is_empty() {
                return None;
            }
            let parents = fields
                .next()?
                .split_whitespace()
                .map(str::to_string)
                .collect();
            let author = fields.next()?.to_string();
            let timestamp = fields.next()?.to_string();
            let message = fields.next().unwrap_or("").trim_end().to_string();

            Some(CommitRecord {
                id,
                message,
                author,
                timestamp,
                diff: String::new(),
                parents,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_records() {
        let raw = "aaa\x1fppp qqq\x1fAda\x1f2026-01-02T03:04:05+00:00\x1fMerge branch 'x'\n\nbody\n\x1e\n\
                   bbb\x1fppp\x1fBob\x1f2026-01-01T00:00:00+00:00\x1ffix: thing\n\x1e\n";
        let commits = parse_log(raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].id, "aaa");
        assert_eq!(commits[0].parents, vec!["ppp", "qqq"]);
        assert_eq!(commits[0].message, "Merge branch 'x'\n\nbody");
        assert!(commits[0].is_merge());
        assert_eq!(commits[1].author, "Bob");
        assert_eq!(commits[1].message, "fix: thing");
        assert!(!commits[1].is_merge());
    }

    #[test]
    fn root_commit_has_no_parents() {
        let commits = parse_log("ccc\x1f\x1fAda\x1f2026-01-01T00:00:00+00:00\x1finit\x1e");
        assert_eq!(commits.len(), 1);
        assert!(commits[0].parents.is_empty());
    }

    #[test]
    fn date_only_end_covers_whole_day() {
        let start = parse_date("2026-03-01", false).unwrap();
        let end = parse_date("2026-03-01", true).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-01T23:59:59+00:00");
    }

    #[test]
    fn rfc3339_dates_are_normalized_to_utc() {
        let ts = parse_date("2026-03-01T12:00:00+02:00", false).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[test]
    fn garbage_dates_are_range_errors() {
        assert!(matches!(
            parse_date("last tuesday", false),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn author_date_bounds_are_inclusive() {
        let record = |timestamp: &str| CommitRecord {
            id: "aaa".into(),
            message: "feat: thing".into(),
            author: "Ada".into(),
            timestamp: timestamp.into(),
            diff: String::new(),
            parents: vec!["ppp".into()],
        };
        let since = parse_date("2026-01-02", false).unwrap();
        let until = parse_date("2026-01-03", true).unwrap();

        assert!(authored_within(&record("2026-01-02T00:00:00+00:00"), since, until));
        assert!(authored_within(&record("2026-01-03T23:59:59+00:00"), since, until));
        assert!(authored_within(&record("2026-01-04T01:00:00+02:00"), since, until));
        assert!(!authored_within(&record("2026-01-04T00:00:00+00:00"), since, until));
        assert!(!authored_within(&record("not a date"), since, until));
    }

    #[test]
    fn option_like_names_are_rejected() {
        assert!(reject_option_like("--output=/tmp/x").is_err());
        assert!(reject_option_like("").is_err());
        assert!(reject_option_like("feature/login").is_ok());
    }
}
