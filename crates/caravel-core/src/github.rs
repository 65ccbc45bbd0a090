//! GitHub releases API collaborator.
//!
//! A single blocking POST to the releases endpoint. The client carries a
//! short timeout so the pipeline always observes the response (and logs
//! it) before the process exits. Failures here are the pipeline's one
//! tolerated failure: the tag is already pushed, so a missing release
//! note should not sink the release.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the release token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding the API base URL (the same variable
/// GitHub Actions exports for enterprise hosts).
pub const API_BASE_ENV: &str = "GITHUB_API_URL";

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Request timeout for the releases call.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the releases API.
#[derive(Error, Debug)]
pub enum GithubError {
    /// The token was rejected.
    #[error("github token was rejected (401 unauthorized)")]
    Unauthorized,

    /// The API returned a non-success status.
    #[error("github release failed with status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated to a sane length by the API itself).
        body: String,
    },

    /// The request never completed.
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The release object posted to the API.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePayload {
    /// The git tag the release points at.
    pub tag_name: String,
    /// Release title, `"<repo> <tag>"`.
    pub name: String,
    /// Release body: notes or the rendered changelog section.
    pub body: String,
    /// Always published, never a draft.
    pub draft: bool,
    /// Whether this is a pre-release (a `--preid` was given).
    pub prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    html_url: Option<String>,
}

/// Create a release and return its URL.
pub fn create_release(
    api_base: &str,
    owner: &str,
    repo: &str,
    token: &str,
    payload: &ReleasePayload,
) -> Result<String, GithubError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .user_agent(concat!("caravel/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let base = api_base.trim_end_matches('/');
    let url = format!("{base}/repos/{owner}/{repo}/releases");
    debug!(%url, tag = %payload.tag_name, "creating github release");

    let response = client
        .post(&url)
        .bearer_auth(token)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .json(payload)
        .send()?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GithubError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GithubError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ReleaseResponse = response.json()?;
    Ok(parsed.html_url.unwrap_or_else(|| {
        format!("https://github.com/{owner}/{repo}/releases/tag/{}", payload.tag_name)
    }))
}
