//! Sweep driver: projects × repositories, one request at a time.
//!
//! Severity split:
//! - existence checks and listings return `Err`; the driver records the
//!   error and moves on to the next project (or repository), unless
//!   `fail_fast` is set, in which case the error ends the sweep.
//! - deletions never return `Err`; failures are logged and recorded in the
//!   repository outcome.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::obs;
use crate::plan::{build_plan, TagFilter};
use crate::registry::RegistryApi;

/// How a project ended up after the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Existence confirmed and repositories listed
    Swept,
    /// Registry did not answer 200 for the project
    Missing,
    /// Existence check or repository listing failed
    Failed,
}

/// A planned deletion the registry refused or never answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub digest: String,
    pub tag: String,
    pub reason: String,
}

/// Result of cleaning one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryOutcome {
    pub repository: String,
    pub artifacts_scanned: usize,
    pub planned: usize,
    pub deleted: usize,
    pub failed: Vec<FailedDeletion>,
    /// Artifact listing error, if the repository could not be scanned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepositoryOutcome {
    fn failed(repository: &str, error: String) -> Self {
        RepositoryOutcome {
            repository: repository.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Result of sweeping one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOutcome {
    pub project: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub repositories: Vec<RepositoryOutcome>,
}

impl ProjectOutcome {
    fn new(project: &str, status: ProjectStatus) -> Self {
        ProjectOutcome {
            project: project.to_string(),
            status,
            error: None,
            repositories: Vec::new(),
        }
    }
}

/// Summary of one sweep run.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub sweep_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub projects: Vec<ProjectOutcome>,
}

impl SweepReport {
    fn repositories(&self) -> impl Iterator<Item = &RepositoryOutcome> {
        self.projects.iter().flat_map(|p| p.repositories.iter())
    }

    /// Tags successfully deleted across all projects.
    pub fn deleted(&self) -> usize {
        self.repositories().map(|r| r.deleted).sum()
    }

    /// Planned deletions that failed.
    pub fn failed_deletions(&self) -> usize {
        self.repositories().map(|r| r.failed.len()).sum()
    }

    /// Existence-check and listing errors (deletion failures excluded).
    pub fn error_count(&self) -> usize {
        let projects = self
            .projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Failed)
            .count();
        let repositories = self.repositories().filter(|r| r.error.is_some()).count();
        projects + repositories
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Runs the cleanup over a registry.
pub struct Sweeper<R> {
    registry: R,
    filter: TagFilter,
    fail_fast: bool,
}

impl<R> Sweeper<R>
where
    R: RegistryApi,
{
    pub fn new(registry: R, filter: TagFilter) -> Self {
        Sweeper {
            registry,
            filter,
            fail_fast: false,
        }
    }

    /// Stop the sweep on the first existence/listing error.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Sweep `projects` in order.
    ///
    /// Returns `Err` only when `fail_fast` is set and a fatal-severity
    /// error occurred.
    pub async fn run(&self, projects: &[String]) -> Result<SweepReport> {
        let sweep_id = Uuid::new_v4();
        let id = sweep_id.to_string();
        self.run_inner(sweep_id, projects)
            .instrument(obs::sweep_span(&id))
            .await
    }

    async fn run_inner(&self, sweep_id: Uuid, projects: &[String]) -> Result<SweepReport> {
        let id = sweep_id.to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        obs::emit_sweep_started(
            &id,
            projects.len(),
            self.filter.include(),
            self.filter.exclude(),
        );

        let mut outcomes = Vec::with_capacity(projects.len());
        for project in projects {
            let outcome = self
                .sweep_project(project)
                .instrument(obs::project_span(project))
                .await;
            match outcome {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    if self.fail_fast {
                        return Err(err);
                    }
                    let mut failed = ProjectOutcome::new(project, ProjectStatus::Failed);
                    failed.error = Some(err.to_string());
                    outcomes.push(failed);
                }
            }
        }

        let report = SweepReport {
            sweep_id,
            started_at,
            finished_at: Utc::now(),
            projects: outcomes,
        };
        obs::emit_sweep_finished(
            &id,
            clock.elapsed().as_millis() as u64,
            report.deleted(),
            report.failed_deletions(),
            report.error_count(),
        );
        Ok(report)
    }

    /// Check that `project` exists, then clean each of its repositories.
    ///
    /// Existence-check and repository-listing failures are logged here and
    /// returned as `Err`. An artifact-listing failure is logged and recorded
    /// on the repository, and the next repository is cleaned, unless
    /// `fail_fast` is set.
    pub async fn sweep_project(&self, project: &str) -> Result<ProjectOutcome> {
        let exists = match self.registry.project_exists(project).await {
            Ok(exists) => exists,
            Err(err) => {
                obs::emit_listing_failed(project, &err);
                return Err(err);
            }
        };
        if !exists {
            obs::emit_project_missing(project);
            return Ok(ProjectOutcome::new(project, ProjectStatus::Missing));
        }
        obs::emit_project_found(project);

        let repositories = match self.registry.list_repositories(project).await {
            Ok(repositories) => repositories,
            Err(err) => {
                obs::emit_listing_failed(project, &err);
                return Err(err);
            }
        };
        let mut outcome = ProjectOutcome::new(project, ProjectStatus::Swept);

        for repository in &repositories {
            obs::emit_repository_cleaning(project, repository);
            match self.clean_repository(project, repository).await {
                Ok(repo) => outcome.repositories.push(repo),
                Err(err) => {
                    obs::emit_listing_failed(&format!("{}/{}", project, repository), &err);
                    if self.fail_fast {
                        return Err(err);
                    }
                    outcome
                        .repositories
                        .push(RepositoryOutcome::failed(repository, err.to_string()));
                }
            }
        }

        Ok(outcome)
    }

    /// List artifacts, plan, then delete each planned tag.
    ///
    /// Only the artifact listing can fail; each deletion failure is logged,
    /// recorded, and the remaining deletions still run.
    pub async fn clean_repository(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<RepositoryOutcome> {
        let artifacts = self.registry.list_artifacts(project, repository).await?;
        let plan = build_plan(&artifacts, &self.filter);
        obs::emit_plan_summary(repository, &plan);

        let mut outcome = RepositoryOutcome {
            repository: repository.to_string(),
            artifacts_scanned: artifacts.len(),
            planned: plan.len(),
            ..Default::default()
        };

        for (digest, tag) in plan.iter() {
            match self
                .registry
                .delete_tag(project, repository, digest, tag)
                .await
            {
                Ok(()) => {
                    obs::emit_tag_deleted(digest, tag);
                    outcome.deleted += 1;
                }
                Err(err) => {
                    obs::emit_tag_delete_failed(digest, tag, &err);
                    outcome.failed.push(FailedDeletion {
                        digest: digest.to_string(),
                        tag: tag.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

/// Build a sweeper from configuration and run it over every configured project.
pub async fn run_sweep<R>(registry: R, config: &SweepConfig) -> Result<SweepReport>
where
    R: RegistryApi,
{
    Sweeper::new(registry, config.filter.clone())
        .with_fail_fast(config.fail_fast)
        .run(&config.projects)
        .await
}
