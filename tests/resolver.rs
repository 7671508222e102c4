// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

//! Commit resolution against real repositories built with the git binary.

mod helpers;

use std::sync::Arc;

use changewise::config::Config;
use changewise::domain::{
    BranchComparison, ChangeType, ComparisonStrategy, RangeSpec, WritingStyle,
};
use changewise::error::Error;
use changewise::services::git::{GitService, ResolveOptions};
use changewise::services::orchestrator::Orchestrator;
use changewise::services::secrets::MemorySecretStore;
use helpers::TestRepo;

fn service(repo: &TestRepo) -> GitService {
    GitService::open(repo.path(), ResolveOptions::default()).unwrap()
}

fn ids(commits: &[changewise::domain::CommitRecord]) -> Vec<String> {
    commits.iter().map(|c| c.id.clone()).collect()
}

fn branches(from: &str, to: &str, strategy: ComparisonStrategy) -> BranchComparison {
    BranchComparison {
        from: from.into(),
        to: to.into(),
        strategy,
        include_merge_commits: false,
        include_unmerged: true,
    }
}

/// master: A - B
/// feature (from B): C - D - merge of x (x has E)
fn repo_with_feature_merge(merge_message: &str) -> TestRepo {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");
    repo.commit("feat: add parser");
    repo.checkout_new("feature");
    repo.commit("feat: add login form");
    repo.commit("fix: validate email field");
    repo.checkout_new("x");
    repo.commit("docs: describe login flow");
    repo.checkout("feature");
    repo.merge("x", merge_message);
    repo.checkout("master");
    repo
}

// ─── Count mode ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn count_mode_classifies_fix_commit_offline() {
    let repo = TestRepo::new();
    repo.commit("chore: set up project");
    repo.commit("feat: add dashboard");
    repo.commit("fix: resolve login issue");
    repo.commit("docs: add usage section");
    repo.commit("refactor: split config module");

    let commits = service(&repo).resolve(&RangeSpec::Count(5)).await.unwrap();
    assert_eq!(commits.len(), 5);
    assert_eq!(commits[0].message, "refactor: split config module");
    assert_eq!(commits[2].message, "fix: resolve login issue");

    let orchestrator =
        Orchestrator::from_config(&Config::default(), Arc::new(MemorySecretStore::new()))
            .await
            .unwrap();
    let entries = orchestrator.process(&commits, WritingStyle::Formal).await;
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[2].change_type, ChangeType::Fix);
    assert_eq!(entries[2].commit.id, commits[2].id);
}

#[tokio::test]
async fn count_mode_limits_and_orders_newest_first() {
    let repo = TestRepo::new();
    let mut hashes = Vec::new();
    for i in 0..6 {
        hashes.push(repo.commit(&format!("feat: step {i}")));
    }

    let commits = service(&repo).resolve(&RangeSpec::Count(3)).await.unwrap();
    hashes.reverse();
    assert_eq!(ids(&commits), hashes[..3].to_vec());
}

#[tokio::test]
async fn count_mode_on_empty_repository_is_empty() {
    let repo = TestRepo::new();
    let commits = service(&repo).resolve(&RangeSpec::Count(10)).await.unwrap();
    assert!(commits.is_empty());
}

#[tokio::test]
async fn diffs_are_attached_and_capped() {
    let repo = TestRepo::new();
    let body: String = (0..100).map(|i| format!("line {i}\n")).collect();
    repo.commit_file("big.txt", &body, "feat: add big file");

    let options = ResolveOptions {
        max_diff_lines: 12,
        ..ResolveOptions::default()
    };
    let git = GitService::open(repo.path(), options).unwrap();
    let commits = git.resolve(&RangeSpec::Count(1)).await.unwrap();

    assert_eq!(commits.len(), 1);
    assert!(commits[0].diff.contains("+line 0"));
    assert!(commits[0].diff.lines().count() <= 12);
}

// ─── Tag and SHA ranges ──────────────────────────────────────────────────────

#[tokio::test]
async fn tag_range_matches_ancestry_exclusion() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");
    repo.tag("v1.0.0");
    repo.commit("feat: add export");
    repo.commit("fix: handle empty export");
    repo.tag("v1.1.0");
    repo.commit("feat: unreleased work");

    let spec = RangeSpec::Tags {
        from: "v1.0.0".into(),
        to: Some("v1.1.0".into()),
    };
    let git = service(&repo);
    let first = git.resolve(&spec).await.unwrap();
    let second = git.resolve(&spec).await.unwrap();

    assert_eq!(ids(&first), repo.rev_list("v1.0.0..v1.1.0"));
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn tag_range_without_end_runs_to_head() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");
    repo.tag("v1.0.0");
    repo.commit("feat: add export");
    repo.commit("feat: unreleased work");

    let commits = service(&repo)
        .resolve(&RangeSpec::Tags {
            from: "v1.0.0".into(),
            to: None,
        })
        .await
        .unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "feat: unreleased work");
}

#[tokio::test]
async fn missing_tag_is_range_error() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");

    let err = service(&repo)
        .resolve(&RangeSpec::Tags {
            from: "v9.9.9".into(),
            to: None,
        })
        .await
        .unwrap_err();
    match err {
        Error::Range { reference, .. } => assert_eq!(reference, "v9.9.9"),
        other => panic!("expected Range, got: {other:?}"),
    }
}

#[tokio::test]
async fn sha_range_excludes_start() {
    let repo = TestRepo::new();
    let start = repo.commit("chore: initial import");
    let middle = repo.commit("feat: add export");
    let end = repo.commit("fix: handle empty export");

    let commits = service(&repo)
        .resolve(&RangeSpec::Shas {
            from: start[..10].to_string(),
            to: Some(end.clone()),
        })
        .await
        .unwrap();
    assert_eq!(ids(&commits), vec![end, middle]);
}

#[tokio::test]
async fn unknown_sha_is_range_error() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");

    let result = service(&repo)
        .resolve(&RangeSpec::Shas {
            from: "deadbeefdeadbeef".into(),
            to: None,
        })
        .await;
    assert!(matches!(result, Err(Error::Range { .. })));
}

// ─── Date ranges ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn date_range_is_inclusive_of_whole_end_day() {
    let repo = TestRepo::new();
    repo.commit("chore: day one"); // 2026-01-01
    repo.commit("feat: day two"); // 2026-01-02
    repo.commit("fix: day three"); // 2026-01-03
    repo.commit("docs: day four"); // 2026-01-04

    let commits = service(&repo)
        .resolve(&RangeSpec::Dates {
            from: "2026-01-02".into(),
            to: Some("2026-01-03".into()),
        })
        .await
        .unwrap();
    let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["fix: day three", "feat: day two"]);
}

#[tokio::test]
async fn reversed_dates_are_range_error() {
    let repo = TestRepo::new();
    repo.commit("chore: day one");

    let result = service(&repo)
        .resolve(&RangeSpec::Dates {
            from: "2026-02-01".into(),
            to: Some("2026-01-01".into()),
        })
        .await;
    assert!(matches!(result, Err(Error::Range { .. })));
}

#[tokio::test]
async fn date_range_uses_author_date() {
    let repo = TestRepo::new();
    repo.commit("chore: day one"); // 2026-01-01
    repo.commit_dated(
        "feat: authored in january",
        "2026-01-03T12:00:00+00:00",
        "2026-03-01T12:00:00+00:00",
    );
    let git = service(&repo);

    let january = git
        .resolve(&RangeSpec::Dates {
            from: "2026-01-02".into(),
            to: Some("2026-01-05".into()),
        })
        .await
        .unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].message, "feat: authored in january");
    assert_eq!(january[0].timestamp, "2026-01-03T12:00:00+00:00");

    let march = git
        .resolve(&RangeSpec::Dates {
            from: "2026-02-15".into(),
            to: Some("2026-03-05".into()),
        })
        .await
        .unwrap();
    assert!(march.is_empty(), "got: {march:?}");
}

#[tokio::test]
async fn open_ended_date_range_runs_to_now() {
    let repo = TestRepo::new();
    repo.commit("chore: day one"); // 2026-01-01
    repo.commit("feat: day two"); // 2026-01-02

    let commits = service(&repo)
        .resolve(&RangeSpec::Dates {
            from: "2026-01-02".into(),
            to: None,
        })
        .await
        .unwrap();
    let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["feat: day two"]);
}

// ─── Branch comparison ───────────────────────────────────────────────────────

#[tokio::test]
async fn one_way_excludes_standard_merge_commit() {
    let repo = repo_with_feature_merge("Merge branch 'x'");
    let git = service(&repo);

    let mut with_merges = branches("master", "feature", ComparisonStrategy::OneWay);
    with_merges.include_merge_commits = true;
    let all = git.resolve(&RangeSpec::Branches(with_merges)).await.unwrap();

    let filtered = git
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "feature",
            ComparisonStrategy::OneWay,
        )))
        .await
        .unwrap();

    assert_eq!(all.len(), 4);
    assert_eq!(filtered.len(), all.len() - 1);
    assert!(filtered.iter().all(|c| !c.message.starts_with("Merge")));
}

#[tokio::test]
async fn non_standard_merge_message_is_excluded_by_parent_count() {
    let repo = repo_with_feature_merge("Combine login docs into feature");
    let commits = service(&repo)
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "feature",
            ComparisonStrategy::OneWay,
        )))
        .await
        .unwrap();

    assert_eq!(commits.len(), 3);
    for commit in &commits {
        assert_eq!(commit.parents.len(), 1, "{} slipped through", commit.message);
        assert!(!commit.message.starts_with("Merge"));
    }
}

#[tokio::test]
async fn single_parent_merge_prefix_is_excluded() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");
    repo.checkout_new("feature");
    repo.commit("feat: add login form");
    repo.commit("Merge upstream wording into readme");

    let commits = service(&repo)
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "feature",
            ComparisonStrategy::OneWay,
        )))
        .await
        .unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].message, "feat: add login form");
}

#[tokio::test]
async fn missing_branch_is_range_error_naming_it() {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");

    let err = service(&repo)
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "does-not-exist",
            ComparisonStrategy::OneWay,
        )))
        .await
        .unwrap_err();
    match err {
        Error::Range { reference, .. } => assert_eq!(reference, "does-not-exist"),
        other => panic!("expected Range, got: {other:?}"),
    }
}

/// master: A - B - M1
/// feature (from B): F1 - F2
fn diverged_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit("chore: initial import");
    repo.commit("feat: add parser");
    repo.checkout_new("feature");
    repo.commit("feat: feature one");
    repo.commit("feat: feature two");
    repo.checkout("master");
    repo.commit("fix: hotfix on master");
    repo
}

#[tokio::test]
async fn symmetric_includes_both_sides() {
    let repo = diverged_repo();
    let commits = service(&repo)
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "feature",
            ComparisonStrategy::Symmetric,
        )))
        .await
        .unwrap();

    let mut messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    messages.sort();
    assert_eq!(
        messages,
        vec!["feat: feature one", "feat: feature two", "fix: hotfix on master"]
    );
}

#[tokio::test]
async fn symmetric_without_unmerged_keeps_target_side_only() {
    let repo = diverged_repo();
    let mut comparison = branches("master", "feature", ComparisonStrategy::Symmetric);
    comparison.include_unmerged = false;

    let commits = service(&repo)
        .resolve(&RangeSpec::Branches(comparison))
        .await
        .unwrap();
    let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["feat: feature two", "feat: feature one"]);
}

#[tokio::test]
async fn merge_base_strategy_starts_at_common_ancestor() {
    let repo = diverged_repo();
    let commits = service(&repo)
        .resolve(&RangeSpec::Branches(branches(
            "master",
            "feature",
            ComparisonStrategy::MergeBase,
        )))
        .await
        .unwrap();

    assert_eq!(ids(&commits), repo.rev_list("master..feature"));
    assert_eq!(commits.len(), 2);
}

// ─── Repository errors ───────────────────────────────────────────────────────

#[test]
fn non_repository_is_repository_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    let result = GitService::open(&missing, ResolveOptions::default());
    assert!(matches!(result, Err(Error::Repository { .. })));
}
