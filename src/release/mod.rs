//! GitHub releases client: resolve release metadata and download tarballs.
//!
//! Resolving metadata is deliberately separate from downloading bytes:
//! staging validates a release (the tag exists, the payload carries an
//! archive URL) before committing to a potentially large transfer, and the
//! same metadata call serves both the check and stage operations.
//!
//! The client is stateless apart from its HTTP connection pool. The API
//! base is injectable so tests can point it at a local mock server.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::{Result, UpdateError};
use crate::version::strip_leading_v;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("clawdeck-update/", env!("CARGO_PKG_VERSION"));

/// One fetchable release artifact, as resolved from the hosting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRef {
    /// Tag exactly as published (prefix convention varies per repo).
    pub tag: String,
    /// Source tarball URL for the release.
    pub tarball_url: String,
    /// Publication timestamp as reported by the API, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Human-facing release page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// Repository this release came from.
    pub release_repo: String,
}

/// Parse a release payload into a [`ReleaseRef`].
///
/// The hosting API's payload is duck-typed: the tag may live in `tag_name`
/// or, for draft-ish releases, only in `name`. Both being absent, or a
/// missing `tarball_url`, is a named payload error, not a silent
/// coalescing to an unusable record.
pub fn parse_release_payload(repo: &str, payload: &serde_json::Value) -> Result<ReleaseRef> {
    let tag = payload["tag_name"]
        .as_str()
        .filter(|s| !s.is_empty())
        .or_else(|| payload["name"].as_str().filter(|s| !s.is_empty()))
        .ok_or_else(|| UpdateError::ReleasePayload {
            reason: "neither tag_name nor name is present".into(),
        })?;
    let tarball_url = payload["tarball_url"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| UpdateError::ReleasePayload {
            reason: format!("release {tag} has no tarball_url"),
        })?;

    Ok(ReleaseRef {
        tag: tag.to_string(),
        tarball_url: tarball_url.to_string(),
        published_at: payload["published_at"].as_str().map(str::to_string),
        html_url: payload["html_url"].as_str().map(str::to_string),
        release_repo: repo.to_string(),
    })
}

/// Client for the release-hosting API.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Build a client, optionally authenticated with a bearer token.
    pub fn new(token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token,
        })
    }

    /// Point the client at a different API base (tests, GHE deployments).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url).header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch_release(&self, repo: &str, path: &str) -> Result<ReleaseRef> {
        let url = format!("{}/repos/{repo}/{path}", self.api_base);
        debug!(target: "release", "Fetching release metadata: {url}");

        let response = self.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdateError::ReleaseApi {
                status: status.as_u16(),
                message: status_message(&body, &status),
            });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpdateError::ReleasePayload {
                reason: format!("response body is not JSON: {e}"),
            })?;
        parse_release_payload(repo, &payload)
    }

    /// Resolve the newest release of `repo`.
    pub async fn fetch_latest_release(&self, repo: &str) -> Result<ReleaseRef> {
        self.fetch_release(repo, "releases/latest").await
    }

    /// Resolve a release by tag, tolerating the `v`-prefix ambiguity.
    ///
    /// Tries the tag as given, then the opposite prefix variant. A 404 on
    /// one candidate falls through to the next; a 404 on the last candidate
    /// becomes [`UpdateError::ReleaseNotFound`]. Any non-404 failure is
    /// raised immediately without trying further candidates.
    pub async fn fetch_release_by_tag(&self, repo: &str, tag: &str) -> Result<ReleaseRef> {
        let stripped = strip_leading_v(tag);
        let variant = if tag == stripped {
            format!("v{stripped}")
        } else {
            stripped.to_string()
        };
        let candidates = [tag.to_string(), variant];

        for (i, candidate) in candidates.iter().enumerate() {
            match self.fetch_release(repo, &format!("releases/tags/{candidate}")).await {
                Ok(release) => return Ok(release),
                Err(UpdateError::ReleaseApi { status: 404, .. }) if i + 1 < candidates.len() => {
                    debug!(target: "release", "No release at tag {candidate}, trying variant");
                }
                Err(UpdateError::ReleaseApi { status: 404, .. }) => {
                    return Err(UpdateError::ReleaseNotFound {
                        repo: repo.to_string(),
                        tag: tag.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Err(UpdateError::ReleaseNotFound {
            repo: repo.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Download a release artifact to `dest` with owner-only permissions.
    pub async fn download_artifact(&self, url: &str, dest: &Path) -> Result<()> {
        info!(target: "release", "Downloading {url} -> {}", dest.display());

        let response = self.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdateError::ReleaseApi {
                status: status.as_u16(),
                message: status_message(&body, &status),
            });
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o600)).await?;
        }

        debug!(target: "release", "Wrote {} bytes", bytes.len());
        Ok(())
    }
}

fn status_message(body: &str, status: &reqwest::StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}
