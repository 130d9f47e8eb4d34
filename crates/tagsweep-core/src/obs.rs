//! Structured observability hooks for sweep lifecycle events.
//!
//! This module provides:
//! - Sweep- and project-scoped tracing spans
//! - Emission functions for each step of a sweep: project check, repository
//!   scan, tag decisions, plan summary, deletions
//!
//! Events carry an `event` field so they can be filtered in JSON output.

use tracing::{info, warn};

use crate::plan::DeletionPlan;

/// Span covering one sweep run.
///
/// The sweep driver attaches it to the run future with
/// `tracing::Instrument`; an entered guard would not survive the awaits.
pub fn sweep_span(sweep_id: &str) -> tracing::Span {
    tracing::info_span!("tagsweep.sweep", sweep_id = %sweep_id)
}

/// Span covering the work on one project.
pub fn project_span(project: &str) -> tracing::Span {
    tracing::info_span!("tagsweep.project", project = %project)
}

/// Emit event: sweep started with the project count and the tag rules in force.
pub fn emit_sweep_started(
    sweep_id: &str,
    projects: usize,
    keywords: &[String],
    exclude: &[String],
) {
    info!(
        event = "sweep.started",
        sweep_id = %sweep_id,
        projects = projects,
        keywords = ?keywords,
        exclude = ?exclude,
    );
}

/// Emit event: sweep finished with duration, deletion totals and listing errors.
pub fn emit_sweep_finished(
    sweep_id: &str,
    duration_ms: u64,
    deleted: usize,
    failed: usize,
    errors: usize,
) {
    info!(
        event = "sweep.finished",
        sweep_id = %sweep_id,
        duration_ms = duration_ms,
        deleted = deleted,
        failed_deletions = failed,
        errors = errors,
    );
}

/// Emit event: the registry answered 200 for the project.
pub fn emit_project_found(project: &str) {
    info!(
        event = "project.found",
        project = %project,
        "Project '{}' exists. Begin cleaning tags...",
        project
    );
}

/// Emit event: the project is skipped because the existence check did not return 200.
pub fn emit_project_missing(project: &str) {
    info!(
        event = "project.missing",
        project = %project,
        "Project '{}' does not exist or failed to retrieve. Skipping...",
        project
    );
}

/// Emit event: a repository scan is starting.
pub fn emit_repository_cleaning(project: &str, repository: &str) {
    info!(
        event = "repository.cleaning",
        project = %project,
        repository = %repository,
        "Cleaning repository '{}'...",
        repository
    );
}

/// Emit event: tag skipped because it contains an exclusion substring.
pub fn emit_tag_excluded(digest: &str, tag: &str, pattern: &str) {
    info!(event = "tag.excluded", digest = %digest, tag = %tag, pattern = %pattern);
}

/// Emit event: tag added to the deletion plan because of `keyword`.
pub fn emit_tag_matched(digest: &str, tag: &str, keyword: &str) {
    info!(event = "tag.matched", digest = %digest, tag = %tag, keyword = %keyword);
}

/// Emit event: every tag on the artifact was excluded.
pub fn emit_artifact_all_excluded(digest: &str) {
    info!(
        event = "artifact.all_excluded",
        digest = %digest,
        "Skipping artifact: all tags excluded"
    );
}

/// Emit the plan: one summary line, then one line per digest. Silent for an
/// empty plan.
pub fn emit_plan_summary(repository: &str, plan: &DeletionPlan) {
    if plan.is_empty() {
        return;
    }
    info!(
        event = "plan.summary",
        repository = %repository,
        tags = plan.len(),
        "Artifacts to delete"
    );
    for entry in plan.digests() {
        info!(
            event = "plan.entry",
            repository = %repository,
            digest = %entry.digest,
            tags = ?entry.tags,
        );
    }
}

/// Emit event: the registry confirmed a tag deletion.
pub fn emit_tag_deleted(digest: &str, tag: &str) {
    info!(event = "tag.deleted", digest = %digest, tag = %tag);
}

/// Emit event: a tag deletion failed (warning level; the sweep goes on).
pub fn emit_tag_delete_failed(digest: &str, tag: &str, error: &dyn std::fmt::Display) {
    warn!(event = "tag.delete_failed", digest = %digest, tag = %tag, error = %error);
}

/// Emit event: a listing or existence check failed; the driver decides
/// whether to go on.
pub fn emit_listing_failed(scope: &str, error: &dyn std::fmt::Display) {
    warn!(event = "listing.failed", scope = %scope, error = %error);
}
