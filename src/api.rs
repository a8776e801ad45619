// API client module: a small blocking HTTP client for the buildrone
// service. `ApiClient` only knows the base URL; exchanging the API key
// for a token yields a `Session`, which carries the authorization header
// every upload and tag request needs.

use crate::config::ApiKey;
use crate::files::UploadSet;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Reasons the key-for-token exchange can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token could not be fetched: {0}")]
    Rejected(StatusCode),
    #[error("Token could not be fetched: response carried no token")]
    MissingToken,
    #[error("Token could not be fetched: {0}")]
    Request(#[from] reqwest::Error),
    #[error("credential can't be used as a header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Body of a successful `/token` response. The server also hands back a
/// fresh refresh key, which this tool does not store.
#[derive(Deserialize, Debug, Default)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Tag state posted for a commit. `date` is Unix seconds as a string,
/// which is how the service encodes timestamps on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub ready: bool,
    pub version: String,
    pub date: String,
}

impl TagRecord {
    /// Record stamped with the current time.
    pub fn now(ready: bool, version: String) -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::at(ready, version, secs)
    }

    pub fn at(ready: bool, version: String, unix_secs: u64) -> Self {
        TagRecord {
            ready,
            version,
            date: unix_secs.to_string(),
        }
    }
}

/// `Bearer <base64(secret)>`, the scheme used for both the API key and the
/// session token.
pub fn bearer(secret: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", STANDARD.encode(secret)))?;
    value.set_sensitive(true);
    Ok(value)
}

fn repo_url(base_url: &str, namespace: &str, repo: &str) -> String {
    format!("{base_url}/repo/{namespace}/{repo}")
}

/// Unauthenticated client bound to a buildrone instance.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`. Trailing slashes are dropped.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn token_url(&self, namespace: &str, repo: &str) -> String {
        format!("{}/token", repo_url(&self.base_url, namespace, repo))
    }

    /// Exchange the API key for a repository-scoped token. Anything other
    /// than a 200 carrying a non-empty `token` is an error; there is no
    /// retry.
    pub fn exchange_key(&self, namespace: &str, repo: &str, key: &ApiKey) -> Result<Session, AuthError> {
        let url = self.token_url(namespace, repo);
        tracing::debug!("requesting token from {url}");
        let res = self
            .client
            .get(&url)
            .header(AUTHORIZATION, bearer(key.expose())?)
            .send()?;
        let status = res.status();
        if status != StatusCode::OK {
            return Err(AuthError::Rejected(status));
        }
        let body: TokenResponse = res.json().unwrap_or_default();
        if body.refresh.is_some() {
            tracing::debug!("server issued a new refresh key; it is not stored");
        }
        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        Ok(Session {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            namespace: namespace.to_string(),
            repo: repo.to_string(),
            auth: bearer(&token)?,
        })
    }
}

/// Authenticated handle for one (namespace, repo) pair. Produced once by
/// `ApiClient::exchange_key` and never modified afterwards.
#[derive(Debug)]
pub struct Session {
    client: Client,
    base_url: String,
    namespace: String,
    repo: String,
    auth: HeaderValue,
}

impl Session {
    fn commit_url(&self, commit: &str) -> String {
        format!(
            "{}/commit/{commit}",
            repo_url(&self.base_url, &self.namespace, &self.repo)
        )
    }

    pub fn upload_url(&self, commit: &str) -> String {
        format!("{}/add", self.commit_url(commit))
    }

    pub fn tag_url(&self, commit: &str, tag: &str) -> String {
        format!("{}/tag/{tag}", self.commit_url(commit))
    }

    /// POST every file in `files` as one multipart request. The handles are
    /// moved into the form and closed when the request finishes, whichever
    /// way it ends. Non-success statuses are returned, not treated as errors.
    pub fn upload(&self, commit: &str, files: UploadSet) -> reqwest::Result<StatusCode> {
        let res = self
            .client
            .post(self.upload_url(commit))
            .header(AUTHORIZATION, self.auth.clone())
            .multipart(files.into_form())
            .send()?;
        Ok(res.status())
    }

    /// POST a tag record for `commit`.
    pub fn tag(&self, commit: &str, tag: &str, record: &TagRecord) -> reqwest::Result<StatusCode> {
        let res = self
            .client
            .post(self.tag_url(commit, tag))
            .header(AUTHORIZATION, self.auth.clone())
            .json(record)
            .send()?;
        Ok(res.status())
    }
}
