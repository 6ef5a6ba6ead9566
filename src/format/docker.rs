//! Docker image tag resolution.
//!
//! The formatter asks a [`DockerResolver`] for the newest tag of an image.
//! A resolver never invents a tag: when the registry cannot answer, it
//! returns `None` and the image is left as it is.

use crate::config::DockerConfig;
use crate::content::integration::docker_image;
use crate::content::{Artifact, ContentType};
use crate::error::{PacklintError, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Looks up the latest tag of a docker image.
pub trait DockerResolver {
    /// Latest tag of `image` (`repo` or `repo:tag`), or `None` when unknown.
    fn resolve_latest(&self, image: &str) -> Option<String>;

    /// When the tag of `image` was last pushed, if the registry says.
    fn tag_updated(&self, _image: &str) -> Option<DateTime<Utc>> {
        None
    }
}

/// A resolver shared by a validate run.
#[derive(Clone)]
pub struct SharedResolver(pub Arc<dyn DockerResolver + Send + Sync>);

impl SharedResolver {
    pub fn new(resolver: impl DockerResolver + Send + Sync + 'static) -> Self {
        Self(Arc::new(resolver))
    }
}

impl fmt::Debug for SharedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedResolver")
    }
}

/// Split `namespace/repo:tag` into repository and tag.
pub fn split_image(image: &str) -> (&str, Option<&str>) {
    // A colon before the last slash belongs to a registry port.
    match image.rfind(':') {
        Some(colon) if !image[colon..].contains('/') => (&image[..colon], Some(&image[colon + 1..])),
        _ => (image, None),
    }
}

/// Replace the tag of `image` with `tag`.
pub fn with_tag(image: &str, tag: &str) -> String {
    format!("{}:{}", split_image(image).0, tag)
}

#[derive(Debug, Deserialize)]
struct TagPage {
    #[serde(default)]
    results: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
    last_updated: Option<DateTime<Utc>>,
}

/// Resolver backed by the Docker Hub HTTP API.
pub struct DockerHubResolver {
    client: Client,
    base_url: String,
}

impl DockerHubResolver {
    pub fn new(config: &DockerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("packlint/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PacklintError::Other(e.into()))?;
        Ok(Self {
            client,
            base_url: config.registry_url.trim_end_matches('/').to_string(),
        })
    }

    fn tags_url(&self, repository: &str) -> String {
        let repository = if repository.contains('/') {
            repository.to_string()
        } else {
            format!("library/{}", repository)
        };
        format!(
            "{}/v2/repositories/{}/tags?page_size=100&ordering=last_updated",
            self.base_url, repository
        )
    }

    /// Tags of `repository`, or `None` when the registry has no such image.
    fn fetch_tags(&self, repository: &str) -> Result<Option<Vec<TagEntry>>> {
        let url = self.tags_url(repository);
        debug!("Fetching docker tags from {}", url);
        let docker_err = |message: String| PacklintError::Docker {
            image: repository.to_string(),
            message,
        };

        let response = self.client.get(&url).send().map_err(|e| docker_err(e.to_string()))?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                warn!(
                    "Docker registry answered {} for '{}'; leaving the image unchanged",
                    response.status(),
                    repository
                );
                return Ok(None);
            }
            status if !status.is_success() => {
                return Err(docker_err(format!("HTTP {}", status)));
            }
            _ => {}
        }

        let page: TagPage = response.json().map_err(|e| docker_err(e.to_string()))?;
        Ok(Some(page.results))
    }
}

/// Newest tag by `last_updated`, ignoring `latest`.
fn newest(tags: Vec<TagEntry>) -> Option<String> {
    tags.into_iter()
        .filter(|t| t.name != "latest")
        .filter_map(|t| t.last_updated.map(|updated| (updated, t.name)))
        .max()
        .map(|(_, name)| name)
}

impl DockerResolver for DockerHubResolver {
    fn resolve_latest(&self, image: &str) -> Option<String> {
        let (repository, _) = split_image(image);
        match self.fetch_tags(repository) {
            Ok(tags) => tags.and_then(newest),
            Err(e) => {
                warn!("{}; leaving the image unchanged", e);
                None
            }
        }
    }

    fn tag_updated(&self, image: &str) -> Option<DateTime<Utc>> {
        let (repository, tag) = split_image(image);
        let tag = tag?;
        match self.fetch_tags(repository) {
            Ok(tags) => tags?
                .into_iter()
                .find(|entry| entry.name == tag)
                .and_then(|entry| entry.last_updated),
            Err(e) => {
                debug!("No push date for {}: {}", image, e);
                None
            }
        }
    }
}

/// Point the item's docker image at the latest tag `resolver` knows.
///
/// Returns the new image when it changed.
pub fn update_docker_image(item: &mut Artifact, resolver: &dyn DockerResolver) -> Option<String> {
    let current = docker_image(item)?.to_string();
    let latest = with_tag(&current, &resolver.resolve_latest(&current)?);
    if latest == current {
        return None;
    }
    let pointer = match item.content_type {
        ContentType::Integration => "/script/dockerimage",
        _ => "/dockerimage",
    };
    let slot = item.data.pointer_mut(pointer)?;
    *slot = serde_json::Value::String(latest.clone());
    Some(latest)
}
