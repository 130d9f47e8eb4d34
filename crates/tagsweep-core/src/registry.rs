//! Registry API seam.
//!
//! The sweep driver only talks to the registry through [`RegistryApi`].
//! `HarborClient` implements it over HTTP; `fakes::MemoryRegistry`
//! implements it in memory for tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Artifact;

/// Operations the sweep needs from a Harbor-style registry.
///
/// Listing operations return `Err` on any transport or decoding failure.
/// `delete_tag` also returns `Err` on failure; the caller decides that
/// such errors are not fatal.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// `true` iff the registry answers 200 for the project.
    async fn project_exists(&self, project: &str) -> Result<bool>;

    /// Bare repository names of `project`, in registry order.
    async fn list_repositories(&self, project: &str) -> Result<Vec<String>>;

    /// All artifacts of `project/repository`, with their tags.
    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>>;

    /// Remove `tag` from the artifact at `digest`.
    async fn delete_tag(
        &self,
        project: &str,
        repository: &str,
        digest: &str,
        tag: &str,
    ) -> Result<()>;
}
