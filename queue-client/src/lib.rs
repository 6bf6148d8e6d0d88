//! GitLab HTTP Client
//!
//! A small, type-safe client for the parts of the GitLab REST API (v4) the
//! pipeline queue needs: listing a project's running jobs and fetching a
//! single job.
//!
//! # Example
//!
//! ```no_run
//! use queue_client::{GitLabClient, Token};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GitLabClient::new("https://gitlab.com", Token::private("glpat-..."));
//!
//!     let jobs = client.list_running_jobs(278964).await?;
//!     println!("{} job(s) running", jobs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

pub use error::{ClientError, Result};

use std::fmt;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Path of the REST API below the instance base URL
const API_PREFIX: &str = "api/v4";

/// Header a token is sent in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    /// Personal, project or group access token (`PRIVATE-TOKEN`)
    #[default]
    Private,
    /// CI job token (`JOB-TOKEN`)
    Job,
}

impl TokenKind {
    pub fn header_name(&self) -> &'static str {
        match self {
            TokenKind::Private => "PRIVATE-TOKEN",
            TokenKind::Job => "JOB-TOKEN",
        }
    }
}

/// API access token
///
/// An empty token is allowed and sends no authentication header, which is
/// enough for public projects.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn private(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Private)
    }

    pub fn job(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Job)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &if self.is_empty() { "" } else { "<redacted>" })
            .field("kind", &self.kind)
            .finish()
    }
}

/// HTTP client for the GitLab API
#[derive(Debug, Clone)]
pub struct GitLabClient {
    /// Base URL of the GitLab instance (e.g., "https://gitlab.com")
    base_url: String,
    /// Credentials sent with every request
    token: Token,
    /// HTTP client instance
    client: Client,
}

impl GitLabClient {
    /// Create a new GitLab client
    ///
    /// # Arguments
    /// * `base_url` - The instance URL, without the `/api/v4` suffix
    /// * `token` - The access token to authenticate with
    ///
    /// # Example
    /// ```
    /// use queue_client::{GitLabClient, Token};
    ///
    /// let client = GitLabClient::new("https://gitlab.com", Token::default());
    /// ```
    pub fn new(base_url: impl Into<String>, token: Token) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new GitLab client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use queue_client::{GitLabClient, Token};
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = GitLabClient::with_client("https://gitlab.com", Token::default(), http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, token: Token, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Get the base URL of the instance
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an API endpoint
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    /// Start an authenticated GET request
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        if self.token.is_empty() {
            request
        } else {
            request.header(self.token.kind.header_name(), &self.token.value)
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
