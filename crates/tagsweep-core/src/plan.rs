//! Tag selection and the per-repository deletion plan.
//!
//! A tag is selected when it contains none of the exclusion substrings and
//! at least one inclusion keyword. Exclusion is checked first. Matching is
//! plain case-sensitive substring search.

use serde::Serialize;

use crate::model::Artifact;
use crate::obs;

/// Exclusion substrings applied when none are configured.
pub const DEFAULT_EXCLUDE: &[&str] = &["latest", "arch"];

/// Outcome of matching one tag name against a [`TagFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDecision<'a> {
    /// Contains an exclusion substring (the first one found).
    Excluded(&'a str),
    /// Contains an inclusion keyword (the first one found).
    Matched(&'a str),
    /// Neither excluded nor matched.
    Kept,
}

/// Inclusion keywords plus exclusion substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TagFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        TagFilter { include, exclude }
    }

    /// Filter with the default exclusion substrings.
    pub fn with_default_exclude(include: Vec<String>) -> Self {
        Self::new(
            include,
            DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn decide(&self, tag: &str) -> TagDecision<'_> {
        if let Some(pattern) = self.exclude.iter().find(|p| tag.contains(p.as_str())) {
            return TagDecision::Excluded(pattern);
        }
        match self.include.iter().find(|k| tag.contains(k.as_str())) {
            Some(keyword) => TagDecision::Matched(keyword),
            None => TagDecision::Kept,
        }
    }
}

/// Tags selected for deletion on one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDigest {
    pub digest: String,
    pub tags: Vec<String>,
}

/// Digest → tags selected for deletion, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    entries: Vec<PlannedDigest>,
}

impl DeletionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` under `digest`. Returns `false` if it was already planned.
    pub fn insert(&mut self, digest: &str, tag: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.digest == digest) {
            Some(entry) => {
                if entry.tags.iter().any(|t| t == tag) {
                    return false;
                }
                entry.tags.push(tag.to_string());
            }
            None => self.entries.push(PlannedDigest {
                digest: digest.to_string(),
                tags: vec![tag.to_string()],
            }),
        }
        true
    }

    /// Number of tag deletions in the plan.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn digests(&self) -> &[PlannedDigest] {
        &self.entries
    }

    pub fn tags_for(&self, digest: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.digest == digest)
            .map(|e| e.tags.as_slice())
    }

    /// `(digest, tag)` pairs in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.tags.iter().map(move |t| (e.digest.as_str(), t.as_str())))
    }
}

/// Build the deletion plan for one repository's artifacts.
pub fn build_plan(artifacts: &[Artifact], filter: &TagFilter) -> DeletionPlan {
    let mut plan = DeletionPlan::new();

    for artifact in artifacts {
        let mut excluded = 0usize;

        for tag in &artifact.tags {
            match filter.decide(&tag.name) {
                TagDecision::Excluded(pattern) => {
                    excluded += 1;
                    obs::emit_tag_excluded(&artifact.digest, &tag.name, pattern);
                }
                TagDecision::Matched(keyword) => {
                    if plan.insert(&artifact.digest, &tag.name) {
                        obs::emit_tag_matched(&artifact.digest, &tag.name, keyword);
                    }
                }
                TagDecision::Kept => {}
            }
        }

        if !artifact.tags.is_empty() && excluded == artifact.tags.len() {
            obs::emit_artifact_all_excluded(&artifact.digest);
        }
    }

    plan
}
