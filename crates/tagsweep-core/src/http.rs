//! Harbor v2.0 REST client
//!
//! One `reqwest::Client` carries basic auth, the request timeout and the
//! optional TLS skip-verify setting for every call of a sweep.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SweepError};
use crate::model::{Artifact, Repository};
use crate::registry::RegistryApi;

/// Query string that asks the registry for every result in one page.
const ALL_PAGES: &[(&str, &str)] = &[("page", "-1"), ("page_size", "-1")];

/// HTTP client for a Harbor-style registry
pub struct HarborClient {
    config: RegistryConfig,
    http_client: reqwest::Client,
}

impl HarborClient {
    /// Create a new client
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("tagsweep/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| SweepError::http("building HTTP client", e))?;

        if config.insecure {
            tracing::warn!(
                registry = %config.base_url,
                "TLS certificate verification is disabled"
            );
        }

        Ok(HarborClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let creds = &self.config.credentials;
        self.http_client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .basic_auth(&creds.username, Some(&creds.password))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| SweepError::http(context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SweepError::UnexpectedStatus {
                context: context.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SweepError::http(context, e))?;
        serde_json::from_slice(&body).map_err(|e| SweepError::decode(context, e))
    }
}

#[async_trait]
impl RegistryApi for HarborClient {
    async fn project_exists(&self, project: &str) -> Result<bool> {
        let url = project_url(&self.config.base_url, project);
        debug!(%url, "GET");

        let response = self
            .request(Method::GET, url)
            .header("X-Is-Resource-Name", "false")
            .send()
            .await
            .map_err(|e| SweepError::http(format!("checking project '{}'", project), e))?;

        Ok(response.status() == StatusCode::OK)
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<String>> {
        let url = repositories_url(&self.config.base_url, project);
        let context = format!("listing repositories of project '{}'", project);
        let repositories: Vec<Repository> = self.get_json(url, &context).await?;

        Ok(repositories
            .iter()
            .map(|r| r.short_name().to_string())
            .collect())
    }

    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>> {
        let url = artifacts_url(&self.config.base_url, project, repository);
        let context = format!("listing artifacts of '{}/{}'", project, repository);
        self.get_json(url, &context).await
    }

    async fn delete_tag(
        &self,
        project: &str,
        repository: &str,
        digest: &str,
        tag: &str,
    ) -> Result<()> {
        let url = delete_tag_url(&self.config.base_url, project, repository, digest, tag);
        let context = format!("deleting tag {} (digest: {})", tag, digest);
        debug!(%url, "DELETE");

        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(|e| SweepError::http(&context, e))?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => Err(SweepError::UnexpectedStatus {
                context,
                status: status.as_u16(),
            }),
        }
    }
}

/// `{base}/api/v2.0/{segments...}` with each segment percent-encoded.
fn api_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(["api", "v2.0"]).extend(segments);
    }
    url
}

fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
    url.query_pairs_mut().extend_pairs(pairs);
    url
}

pub(crate) fn project_url(base: &Url, project: &str) -> Url {
    api_url(base, &["projects", project])
}

pub(crate) fn repositories_url(base: &Url, project: &str) -> Url {
    with_query(api_url(base, &["projects", project, "repositories"]), ALL_PAGES)
}

pub(crate) fn artifacts_url(base: &Url, project: &str, repository: &str) -> Url {
    let url = api_url(
        base,
        &["projects", project, "repositories", repository, "artifacts"],
    );
    with_query(with_query(url, ALL_PAGES), &[("with_tag", "true")])
}

pub(crate) fn delete_tag_url(
    base: &Url,
    project: &str,
    repository: &str,
    digest: &str,
    tag: &str,
) -> Url {
    api_url(
        base,
        &[
            "projects",
            project,
            "repositories",
            repository,
            "artifacts",
            digest,
            "tags",
            tag,
        ],
    )
}
