//! Registry client for submissions metadata and archive documents
//!
//! Every request goes through a [`RequestPacer`] and carries the configured
//! identification header. Failures of any kind (connection, timeout, non-2xx status,
//! undecodable body) come back as a single [`RegistryError`]. The client never retries.

mod pacer;

pub use pacer::RequestPacer;

use crate::config::RegistryConfig;
use crate::error::{Error, RegistryError, Result};
use crate::types::SubmissionMetadata;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::debug;
use url::Url;

/// Left-pad a registry key with zeros to the 10 digits the metadata endpoint expects
pub fn padded_key(registry_key: &str) -> String {
    format!("{:0>10}", registry_key)
}

/// Strip leading zeros from a registry key, as archive paths expect
///
/// An all-zero key normalizes to `"0"`.
pub fn archive_key(registry_key: &str) -> &str {
    let trimmed = registry_key.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Accession number with hyphens removed, as archive paths expect
pub fn accession_path(accession_id: &str) -> String {
    accession_id.replace('-', "")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    Metadata,
    Archive,
}

/// HTTP client for the filings registry and its document archive
pub struct RegistryClient {
    http: reqwest::Client,
    pacer: RequestPacer,
    submissions_base: Url,
    archive_base: Url,
    archive_referer: HeaderValue,
}

impl RegistryClient {
    /// Build a client from configuration with its own request pacer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the identification string is blank or not a valid
    /// header value, or if either base URL does not parse. A client that would send
    /// anonymous requests is never constructed.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let user_agent = config.user_agent.trim();
        if user_agent.is_empty() {
            return Err(Error::Config {
                message: "an identification User-Agent is required by the registry".into(),
                key: Some("registry.user_agent".into()),
            });
        }
        let user_agent = HeaderValue::from_str(user_agent).map_err(|e| Error::Config {
            message: format!("User-Agent is not a valid header value: {}", e),
            key: Some("registry.user_agent".into()),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        let submissions_base = parse_base(&config.submissions_base, "registry.submissions_base")?;
        let archive_base = parse_base(&config.archive_base, "registry.archive_base")?;
        let archive_referer =
            HeaderValue::from_str(&format!("{}/", archive_base.origin().ascii_serialization()))
                .map_err(|e| Error::Config {
                    message: format!("archive origin is not a valid Referer: {}", e),
                    key: Some("registry.archive_base".into()),
                })?;

        Ok(Self {
            http,
            pacer: RequestPacer::new(config.request_delay),
            submissions_base,
            archive_base,
            archive_referer,
        })
    }

    /// Replace this client's pacer with a shared one
    ///
    /// Clients holding clones of the same pacer are throttled together.
    #[must_use]
    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// The pacer gating this client's requests
    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// URL of the submissions metadata for a registry key
    pub fn metadata_url(&self, registry_key: &str) -> std::result::Result<Url, RegistryError> {
        let name = format!("CIK{}.json", padded_key(registry_key));
        join(&self.submissions_base, &name)
    }

    /// Directory URL of one filing in the archive, with a trailing slash
    ///
    /// Relative asset references inside the filing resolve against this URL.
    pub fn filing_base_url(
        &self,
        registry_key: &str,
        accession_id: &str,
    ) -> std::result::Result<Url, RegistryError> {
        let dir = format!(
            "{}/{}/",
            archive_key(registry_key),
            accession_path(accession_id)
        );
        join(&self.archive_base, &dir)
    }

    /// Fetch and decode the submissions metadata for a registry key
    pub async fn fetch_metadata(
        &self,
        registry_key: &str,
    ) -> std::result::Result<SubmissionMetadata, RegistryError> {
        let url = self.metadata_url(registry_key)?;
        let body = self.get(&url, Endpoint::Metadata).await?;

        serde_json::from_slice(&body).map_err(|e| RegistryError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch one document of a filing from the archive
    pub async fn fetch_document(
        &self,
        registry_key: &str,
        accession_id: &str,
        document_name: &str,
    ) -> std::result::Result<Vec<u8>, RegistryError> {
        let base = self.filing_base_url(registry_key, accession_id)?;
        let url = join(&base, document_name)?;
        self.get(&url, Endpoint::Archive).await
    }

    /// Fetch an already-resolved archive URL (used for referenced assets)
    pub async fn fetch_url(&self, url: &Url) -> std::result::Result<Vec<u8>, RegistryError> {
        self.get(url, Endpoint::Archive).await
    }

    async fn get(
        &self,
        url: &Url,
        endpoint: Endpoint,
    ) -> std::result::Result<Vec<u8>, RegistryError> {
        self.pacer.acquire().await;
        debug!(url = %url, ?endpoint, "registry request");

        let mut request = self.http.get(url.clone());
        if endpoint == Endpoint::Archive {
            request = request.header(REFERER, self.archive_referer.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }
}

fn parse_base(raw: &str, key: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::Config {
        message: format!("invalid URL {}: {}", raw, e),
        key: Some(key.into()),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join(base: &Url, relative: &str) -> std::result::Result<Url, RegistryError> {
    base.join(relative)
        .map_err(|e| RegistryError::MalformedResponse {
            url: base.to_string(),
            reason: format!("cannot resolve {:?}: {}", relative, e),
        })
}
