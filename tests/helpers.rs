// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use std::cell::Cell;
use std::path::Path;
use std::process::Command;

use changewise::domain::{ChangeType, ChangelogEntry, CommitRecord};
use tempfile::TempDir;

/// Create a single-parent CommitRecord for testing
#[allow(dead_code)]
pub fn make_commit(id: &str, message: &str) -> CommitRecord {
    CommitRecord {
        id: id.to_string(),
        message: message.to_string(),
        author: "Ada Lovelace".to_string(),
        timestamp: "2026-03-01T10:00:00+00:00".to_string(),
        diff: String::new(),
        parents: vec!["0000000000000000000000000000000000000000".to_string()],
    }
}

#[allow(dead_code)]
pub fn make_entry(change_type: ChangeType, description: &str, id: &str) -> ChangelogEntry {
    ChangelogEntry::new(change_type, description, make_commit(id, description))
}

/// Throwaway repository driven through the git binary. Every commit gets
/// its own timestamp, one day apart starting 2026-01-01, so ordering and
/// date ranges are deterministic.
#[allow(dead_code)]
pub struct TestRepo {
    pub dir: TempDir,
    day: Cell<u32>,
}

#[allow(dead_code)]
impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Self {
            dir,
            day: Cell::new(0),
        };
        repo.git(&["init", "-q", "-b", "master"]);
        repo.git(&["config", "user.name", "Ada Lovelace"]);
        repo.git(&["config", "user.email", "ada@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["config", "tag.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn next_date(&self) -> String {
        let day = self.day.get() + 1;
        self.day.set(day);
        format!("2026-01-{day:02}T12:00:00+00:00")
    }

    /// Run git in the repository, panicking on failure. Returns stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let date = self.next_date_for(args);
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(self.path());
        if let Some(date) = date {
            cmd.env("GIT_AUTHOR_DATE", &date)
                .env("GIT_COMMITTER_DATE", &date);
        }
        let output = cmd.output().expect("git binary available");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn next_date_for(&self, args: &[&str]) -> Option<String> {
        matches!(args.first(), Some(&"commit") | Some(&"merge")).then(|| self.next_date())
    }

    /// Write `file`, stage it, commit with `message`. Returns the new hash.
    pub fn commit_file(&self, file: &str, content: &str, message: &str) -> String {
        let path = self.path().join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(&path, content).expect("write file");
        self.git(&["add", file]);
        self.git(&["commit", "-q", "-m", message]);
        self.head()
    }

    /// Commit touching a file named after the message.
    pub fn commit(&self, message: &str) -> String {
        let n = self.day.get() + 1;
        self.commit_file(&format!("file_{n}.txt"), &format!("{message}\n"), message)
    }

    /// Commit with explicit author and committer dates, as a rebase or
    /// cherry-pick leaves them. Returns the new hash.
    pub fn commit_dated(&self, message: &str, author_date: &str, committer_date: &str) -> String {
        let n = self.day.get() + 1;
        self.day.set(n);
        let file = format!("dated_{n}.txt");
        std::fs::write(self.path().join(&file), format!("{message}\n")).expect("write file");
        self.git(&["add", &file]);

        let output = Command::new("git")
            .args(["commit", "-q", "-m", message])
            .current_dir(self.path())
            .env("GIT_AUTHOR_DATE", author_date)
            .env("GIT_COMMITTER_DATE", committer_date)
            .output()
            .expect("git binary available");
        assert!(
            output.status.success(),
            "git commit failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        self.head()
    }

    /// `git merge --no-ff` with an explicit message. Returns the merge hash.
    pub fn merge(&self, branch: &str, message: &str) -> String {
        self.git(&["merge", "--no-ff", "-q", "--no-edit", "-m", message, branch]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn checkout(&self, branch: &str) {
        self.git(&["checkout", "-q", branch]);
    }

    pub fn checkout_new(&self, branch: &str) {
        self.git(&["checkout", "-q", "-b", branch]);
    }

    pub fn tag(&self, name: &str) {
        self.git(&["tag", name]);
    }

    /// Hashes `git rev-list` reports for `range`, newest first.
    pub fn rev_list(&self, range: &str) -> Vec<String> {
        self.git(&["rev-list", range])
            .lines()
            .map(str::to_string)
            .collect()
    }
}
