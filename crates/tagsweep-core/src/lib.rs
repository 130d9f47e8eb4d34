//! tagsweep core library
//!
//! Removes container image tags from a Harbor-style registry. For each
//! configured project the sweep lists repositories, lists artifacts with
//! their tags, selects tags containing an inclusion keyword (and no
//! exclusion substring), and deletes them one request at a time.
//!
//! ## Layout
//!
//! - [`config`]: `HARBOR_*` settings
//! - [`registry`]: the [`RegistryApi`] seam; [`http`] and [`fakes`] implement it
//! - [`plan`]: tag selection and [`DeletionPlan`]
//! - [`sweep`]: the driver and its [`SweepReport`]
//! - [`obs`] / [`telemetry`]: structured events and subscriber setup

pub mod config;
pub mod error;
pub mod fakes;
pub mod http;
pub mod model;
pub mod obs;
pub mod plan;
pub mod registry;
pub mod sweep;
pub mod telemetry;

pub use config::{Credentials, RegistryConfig, SweepConfig};
pub use error::{Result, SweepError};
pub use http::HarborClient;
pub use model::{Artifact, Repository, Tag};
pub use plan::{build_plan, DeletionPlan, PlannedDigest, TagDecision, TagFilter, DEFAULT_EXCLUDE};
pub use registry::RegistryApi;
pub use sweep::{
    run_sweep, FailedDeletion, ProjectOutcome, ProjectStatus, RepositoryOutcome, SweepReport,
    Sweeper,
};
pub use telemetry::{init_tracing, LogFormat};

/// Build an HTTP client from `config` and sweep every configured project.
pub async fn sweep_registry(config: &SweepConfig) -> Result<SweepReport> {
    let client = HarborClient::new(config.registry.clone())?;
    run_sweep(client, config).await
}
