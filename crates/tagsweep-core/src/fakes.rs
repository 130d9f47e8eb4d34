//! In-memory registry fake (testing only)
//!
//! `MemoryRegistry` satisfies the [`RegistryApi`] contract without any
//! network access. Deleting a tag removes it from the stored artifact, so a
//! repeated delete fails the way the real registry does (404). Failures can
//! be injected per project, per repository and per tag.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, SweepError};
use crate::model::{short_name, Artifact};
use crate::registry::RegistryApi;

/// A delete call observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub project: String,
    pub repository: String,
    pub digest: String,
    pub tag: String,
}

#[derive(Debug, Default)]
struct State {
    /// project -> full repository names (`project/repo`), in order
    projects: Vec<(String, Vec<String>)>,
    artifacts: HashMap<(String, String), Vec<Artifact>>,
    unreachable_projects: HashSet<String>,
    failing_repository_listings: HashSet<String>,
    failing_artifact_listings: HashSet<(String, String)>,
    failing_deletes: HashSet<(String, String)>,
    deletes: Vec<DeleteCall>,
}

/// In-memory registry backed by ordered project/repository lists.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an (initially empty) project.
    pub fn with_project(self, project: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if !state.projects.iter().any(|(p, _)| p == project) {
                state.projects.push((project.to_string(), Vec::new()));
            }
        }
        self
    }

    /// Register a repository (bare name) under `project` with its artifacts.
    pub fn with_repository(
        self,
        project: &str,
        repository: &str,
        artifacts: Vec<Artifact>,
    ) -> Self {
        let this = self.with_project(project);
        {
            let mut state = this.state.lock().unwrap();
            let full_name = format!("{}/{}", project, repository);
            if let Some((_, repos)) = state.projects.iter_mut().find(|(p, _)| p == project) {
                repos.push(full_name);
            }
            state
                .artifacts
                .insert((project.to_string(), repository.to_string()), artifacts);
        }
        this
    }

    /// Existence checks for `project` fail with a transport-like error.
    pub fn with_unreachable_project(self, project: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unreachable_projects
            .insert(project.to_string());
        self
    }

    /// Repository listing for `project` fails.
    pub fn with_failing_repository_listing(self, project: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_repository_listings
            .insert(project.to_string());
        self
    }

    /// Artifact listing for `project/repository` fails.
    pub fn with_failing_artifact_listing(self, project: &str, repository: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_artifact_listings
            .insert((project.to_string(), repository.to_string()));
        self
    }

    /// Deleting `tag` from `digest` fails with a 500.
    pub fn with_failing_delete(self, digest: &str, tag: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert((digest.to_string(), tag.to_string()));
        self
    }

    /// Every delete call received, in order, including failed ones.
    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        self.state.lock().unwrap().deletes.clone()
    }

    /// Tags currently stored on `digest` in `project/repository`.
    pub fn tags_of(&self, project: &str, repository: &str, digest: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .artifacts
            .get(&(project.to_string(), repository.to_string()))
            .and_then(|artifacts| artifacts.iter().find(|a| a.digest == digest))
            .map(|a| a.tags.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }
}

fn injected(context: String, status: u16) -> SweepError {
    SweepError::UnexpectedStatus { context, status }
}

#[async_trait]
impl RegistryApi for MemoryRegistry {
    async fn project_exists(&self, project: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.unreachable_projects.contains(project) {
            return Err(injected(format!("checking project '{}'", project), 503));
        }
        Ok(state.projects.iter().any(|(p, _)| p == project))
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let context = format!("listing repositories of project '{}'", project);
        if state.failing_repository_listings.contains(project) {
            return Err(injected(context, 500));
        }
        state
            .projects
            .iter()
            .find(|(p, _)| p == project)
            .map(|(_, repos)| repos.iter().map(|r| short_name(r).to_string()).collect())
            .ok_or_else(|| injected(context, 404))
    }

    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>> {
        let state = self.state.lock().unwrap();
        let key = (project.to_string(), repository.to_string());
        let context = format!("listing artifacts of '{}/{}'", project, repository);
        if state.failing_artifact_listings.contains(&key) {
            return Err(injected(context, 500));
        }
        state
            .artifacts
            .get(&key)
            .cloned()
            .ok_or_else(|| injected(context, 404))
    }

    async fn delete_tag(
        &self,
        project: &str,
        repository: &str,
        digest: &str,
        tag: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(DeleteCall {
            project: project.to_string(),
            repository: repository.to_string(),
            digest: digest.to_string(),
            tag: tag.to_string(),
        });

        let context = format!("deleting tag {} (digest: {})", tag, digest);
        if state
            .failing_deletes
            .contains(&(digest.to_string(), tag.to_string()))
        {
            return Err(injected(context, 500));
        }

        let artifact = state
            .artifacts
            .get_mut(&(project.to_string(), repository.to_string()))
            .and_then(|artifacts| artifacts.iter_mut().find(|a| a.digest == digest));
        match artifact {
            Some(artifact) => match artifact.tags.iter().position(|t| t.name == tag) {
                Some(index) => {
                    artifact.tags.remove(index);
                    Ok(())
                }
                None => Err(injected(context, 404)),
            },
            None => Err(injected(context, 404)),
        }
    }
}
