//! Wire types returned by the registry's v2.0 API.

use serde::{Deserialize, Deserializer, Serialize};

/// Repository entry as listed under a project.
///
/// The registry reports `name` as `{project}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
}

impl Repository {
    /// Bare repository name: the last `/` segment of `name`.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

/// Last `/`-separated segment of a repository path.
pub fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Tag attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag { name: name.into() }
    }
}

/// Content-addressed artifact with its tags, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub digest: String,
    /// Untagged artifacts come back with `"tags": null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
}

impl Artifact {
    pub fn new<I, S>(digest: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Artifact {
            digest: digest.into(),
            tags: tags.into_iter().map(Tag::new).collect(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Tag>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_strips_project_prefix() {
        let repo = Repository {
            name: "myproj/myrepo".to_string(),
        };
        assert_eq!(repo.short_name(), "myrepo");
    }

    #[test]
    fn test_short_name_nested_path_keeps_last_segment() {
        assert_eq!(short_name("proj/team/service"), "service");
        assert_eq!(short_name("bare"), "bare");
    }

    #[test]
    fn test_artifact_deserializes_harbor_shape() {
        let body = r#"[
            {"id": 7, "digest": "sha256:aaa", "tags": [{"id": 1, "name": "v1-debug"}, {"name": "latest"}]},
            {"digest": "sha256:bbb", "tags": null},
            {"digest": "sha256:ccc"}
        ]"#;
        let artifacts: Vec<Artifact> = serde_json::from_str(body).unwrap();

        assert_eq!(artifacts.len(), 3);
        assert_eq!(artifacts[0], Artifact::new("sha256:aaa", ["v1-debug", "latest"]));
        assert!(artifacts[1].tags.is_empty());
        assert!(artifacts[2].tags.is_empty());
    }
}
