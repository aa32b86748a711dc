// src/github/fetch.rs
// =============================================================================
// This module fetches directory listings and file contents from GitHub.
//
// Strategy:
// - Use the contents API (https://api.github.com/repos/<owner>/<repo>/contents/...)
//   which returns one directory level per request as a JSON array
// - For Elastic rules, fetch the file's API URL: the body is a JSON envelope
//   carrying the content as base64
// - For Sigma rules, fetch the file's download_url: the body is the raw text
// - Send the token as an Authorization header on every request; a missing or
//   bad token is not checked up front, it just surfaces as non-success
//   status codes
// =============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::FetchMode;

// What a listing entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules - anything the walk has no use for
    #[serde(other)]
    Other,
}

// One item of a GitHub directory listing
//
// Only the fields the pipeline needs are kept; the API sends many more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// File or directory name
    pub name: String,
    /// Slash-separated path relative to the repository root
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// API URL: sub-listing for directories, content envelope for files
    pub url: String,
    /// Raw content URL; null for directories
    #[serde(default)]
    pub download_url: Option<String>,
}

// The JSON envelope the contents API wraps file bodies in
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: Option<String>,
}

// The remote repository collaborator
//
// The walker only sees this trait. Production uses GithubClient; tests use
// an in-memory mock with a hand-built tree.
#[async_trait]
pub trait RuleRepo: Send + Sync {
    /// Lists one directory level. A non-success response is an error; the
    /// caller decides it is non-fatal.
    async fn list_directory(&self, url: &str) -> Result<Vec<DirectoryEntry>>;

    /// Retrieves a file's raw text content
    async fn fetch_content(&self, entry: &DirectoryEntry, mode: FetchMode) -> Result<String>;
}

// GitHub API client carrying the bearer token
pub struct GithubClient {
    client: Client,
    token: Option<String>,
}

impl GithubClient {
    // Creates a client
    //
    // Parameters:
    //   token: GitHub API token; None means unauthenticated (rate-limited)
    pub fn new(token: Option<String>) -> Result<Self> {
        // GitHub rejects requests without a User-Agent header
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("rule-harvester/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, token })
    }

    // Starts a GET request with the auth header attached
    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }
        request
    }
}

#[async_trait]
impl RuleRepo for GithubClient {
    async fn list_directory(&self, url: &str) -> Result<Vec<DirectoryEntry>> {
        let response = self.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch data from {}. Status code: {}",
                url,
                response.status().as_u16()
            ));
        }

        let entries = response.json().await?;
        Ok(entries)
    }

    async fn fetch_content(&self, entry: &DirectoryEntry, mode: FetchMode) -> Result<String> {
        match mode {
            FetchMode::ApiEnvelope => {
                let response = self.get(&entry.url).send().await?;

                if !response.status().is_success() {
                    return Err(anyhow!(
                        "Failed to fetch content from {}. Status code: {}",
                        entry.url,
                        response.status().as_u16()
                    ));
                }

                let envelope: ContentEnvelope = response.json().await?;
                let encoded = envelope
                    .content
                    .ok_or_else(|| anyhow!("No content field in response for {}", entry.path))?;

                decode_envelope_content(&encoded)
            }
            FetchMode::RawDownload => {
                let url = entry
                    .download_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("Entry {} has no download URL", entry.path))?;

                let response = self.get(url).send().await?;

                if !response.status().is_success() {
                    return Err(anyhow!(
                        "Failed to fetch content from {}. Status code: {}",
                        url,
                        response.status().as_u16()
                    ));
                }

                let text = response.text().await?;
                Ok(text)
            }
        }
    }
}

// Decodes the base64 body of a content envelope to UTF-8 text
//
// The API wraps the base64 in newlines every 60 characters, which the strict
// decoder rejects, so all whitespace is stripped first.
fn decode_envelope_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    let text = String::from_utf8(bytes)?;
    Ok(text)
}

// Extracts (owner, repo) from a contents API URL
//
// Example:
//   "https://api.github.com/repos/elastic/detection-rules/contents/rules"
//   -> ("elastic", "detection-rules")
pub fn parse_repo_slug(url: &str) -> Result<(String, String)> {
    let path = url
        .strip_prefix("https://api.github.com/repos/")
        .ok_or_else(|| anyhow!("Not a GitHub contents API URL: {}", url))?;

    let mut parts = path.split('/');
    let owner = parts.next().filter(|s| !s.is_empty());
    let repo = parts.next().filter(|s| !s.is_empty());

    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok((owner.to_string(), repo.to_string())),
        _ => Err(anyhow!("Invalid GitHub contents API URL: {}", url)),
    }
}
