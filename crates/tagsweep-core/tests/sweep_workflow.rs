//! End-to-end sweep behaviour against the in-memory registry.

use tagsweep_core::fakes::{DeleteCall, MemoryRegistry};
use tagsweep_core::{
    run_sweep, Artifact, ProjectStatus, SweepConfig, SweepError, Sweeper, TagFilter,
};

fn filter(keywords: &[&str]) -> TagFilter {
    TagFilter::with_default_exclude(keywords.iter().map(|k| k.to_string()).collect())
}

fn projects(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn deleted_tags(calls: &[DeleteCall]) -> Vec<(&str, &str)> {
    calls
        .iter()
        .map(|c| (c.digest.as_str(), c.tag.as_str()))
        .collect()
}

#[tokio::test]
async fn test_sweep_deletes_matching_tags_across_repositories() {
    let registry = MemoryRegistry::new()
        .with_repository(
            "web",
            "frontend",
            vec![
                Artifact::new("sha256:a", ["latest", "v1-debug"]),
                Artifact::new("sha256:b", ["v2-debug", "v3-debug"]),
                Artifact::new("sha256:c", ["v4"]),
            ],
        )
        .with_repository("web", "backend", vec![Artifact::new("sha256:d", ["pr-7-debug"])]);

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    assert_eq!(report.deleted(), 4);
    assert_eq!(report.failed_deletions(), 0);
    assert!(!report.has_errors());

    let calls = sweeper.registry().delete_calls();
    assert_eq!(
        deleted_tags(&calls),
        vec![
            ("sha256:a", "v1-debug"),
            ("sha256:b", "v2-debug"),
            ("sha256:b", "v3-debug"),
            ("sha256:d", "pr-7-debug"),
        ]
    );
    assert!(calls[..3].iter().all(|c| c.repository == "frontend"));
    assert_eq!(calls[3].repository, "backend");
    assert_eq!(
        sweeper.registry().tags_of("web", "frontend", "sha256:a"),
        vec!["latest"]
    );
}

#[tokio::test]
async fn test_failed_delete_does_not_stop_later_deletes() {
    let registry = MemoryRegistry::new()
        .with_repository(
            "web",
            "frontend",
            vec![
                Artifact::new("sha256:a", ["v1-debug"]),
                Artifact::new("sha256:b", ["v2-debug"]),
            ],
        )
        .with_failing_delete("sha256:a", "v1-debug");

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    assert_eq!(sweeper.registry().delete_calls().len(), 2);
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.failed_deletions(), 1);
    // deletion failures are not fatal-severity
    assert!(!report.has_errors());

    let repo = &report.projects[0].repositories[0];
    assert_eq!(repo.failed[0].digest, "sha256:a");
    assert_eq!(repo.failed[0].tag, "v1-debug");
    assert!(repo.failed[0].reason.contains("500"));
}

#[tokio::test]
async fn test_no_keyword_match_issues_no_deletes() {
    let registry = MemoryRegistry::new().with_repository(
        "web",
        "frontend",
        vec![Artifact::new("sha256:a", ["v1", "v2", "latest"])],
    );

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    assert!(sweeper.registry().delete_calls().is_empty());
    assert_eq!(report.projects[0].repositories[0].planned, 0);
}

#[tokio::test]
async fn test_tag_matching_two_keywords_deleted_once() {
    let registry = MemoryRegistry::new().with_repository(
        "web",
        "frontend",
        vec![Artifact::new("sha256:a", ["snapshot-debug"])],
    );

    let sweeper = Sweeper::new(registry, filter(&["snapshot", "debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    assert_eq!(sweeper.registry().delete_calls().len(), 1);
    assert_eq!(report.failed_deletions(), 0);
}

#[tokio::test]
async fn test_missing_and_unreachable_projects_do_not_stop_sweep() {
    let registry = MemoryRegistry::new()
        .with_unreachable_project("flaky")
        .with_repository("web", "frontend", vec![Artifact::new("sha256:a", ["x-debug"])]);

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper
        .run(&projects(&["ghost", "flaky", "web"]))
        .await
        .unwrap();

    let statuses: Vec<_> = report.projects.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            ProjectStatus::Missing,
            ProjectStatus::Failed,
            ProjectStatus::Swept
        ]
    );
    assert!(report.projects[1].error.is_some());
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.error_count(), 1);
}

#[tokio::test]
async fn test_artifact_listing_failure_skips_only_that_repository() {
    let registry = MemoryRegistry::new()
        .with_repository("web", "broken", vec![Artifact::new("sha256:a", ["a-debug"])])
        .with_repository("web", "fine", vec![Artifact::new("sha256:b", ["b-debug"])])
        .with_failing_artifact_listing("web", "broken");

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    let repos = &report.projects[0].repositories;
    assert_eq!(repos.len(), 2);
    assert!(repos[0].error.is_some());
    assert_eq!(repos[1].deleted, 1);
    assert!(report.has_errors());
    assert_eq!(
        deleted_tags(&sweeper.registry().delete_calls()),
        vec![("sha256:b", "b-debug")]
    );
}

#[tokio::test]
async fn test_fail_fast_stops_on_first_listing_error() {
    let registry = MemoryRegistry::new()
        .with_repository("web", "broken", vec![])
        .with_repository("web", "fine", vec![Artifact::new("sha256:b", ["b-debug"])])
        .with_repository("api", "server", vec![Artifact::new("sha256:c", ["c-debug"])])
        .with_failing_artifact_listing("web", "broken");

    let sweeper = Sweeper::new(registry, filter(&["debug"])).with_fail_fast(true);
    let err = sweeper.run(&projects(&["web", "api"])).await.unwrap_err();

    assert!(matches!(err, SweepError::UnexpectedStatus { status: 500, .. }));
    assert!(sweeper.registry().delete_calls().is_empty());
}

#[tokio::test]
async fn test_repository_listing_failure_marks_project_failed() {
    let registry = MemoryRegistry::new()
        .with_repository("web", "frontend", vec![])
        .with_failing_repository_listing("web");

    let sweeper = Sweeper::new(registry, filter(&["debug"]));
    let report = sweeper.run(&projects(&["web"])).await.unwrap();

    assert_eq!(report.projects[0].status, ProjectStatus::Failed);
    assert!(report.has_errors());
}

#[tokio::test]
async fn test_run_sweep_uses_configured_projects_and_exclusions() {
    let vars = [
        ("HARBOR_REGISTRY", "https://harbor.example.com"),
        ("HARBOR_USERNAME", "robot"),
        ("HARBOR_PASSWORD", "secret"),
        ("HARBOR_PROJECTS", "web"),
        ("HARBOR_TAGS", "debug"),
        ("HARBOR_EXCLUDE_TAGS", "keep"),
    ];
    let config = SweepConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();

    let registry = MemoryRegistry::new().with_repository(
        "web",
        "frontend",
        vec![Artifact::new("sha256:a", ["latest-debug", "keep-debug"])],
    );
    let report = run_sweep(registry, &config).await.unwrap();

    // "latest" is no longer protected once the exclusion list is overridden
    assert_eq!(report.deleted(), 1);
    assert_eq!(report.projects[0].repositories[0].planned, 1);
}
