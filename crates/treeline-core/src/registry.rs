//! npm registry client.

use crate::config::AnalyzerOptions;
use crate::error::AnalyzeError;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

/// Maximum concurrent packument fetches.
const MAX_CONCURRENT_FETCHES: usize = 32;

/// Package-level metadata document served by the registry.
///
/// Unknown fields are ignored; a document missing `versions` or `dist-tags`
/// still parses with empty maps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packument {
    /// Tag name to concrete version (e.g., `latest` -> `4.17.21`).
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: IndexMap<String, String>,
    /// Concrete version to its per-version record, in publication order.
    #[serde(default)]
    pub versions: IndexMap<String, VersionMetadata>,
}

/// Per-version record inside a packument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: IndexMap<String, String>,
}

/// Registry client for fetching package metadata.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: Client,
    fetch_permits: Arc<Semaphore>,
}

impl RegistryClient {
    /// Create a client from analyzer options.
    ///
    /// # Errors
    /// Returns `InvalidArguments` if the registry URL or a header entry is
    /// malformed, or the HTTP client cannot be created.
    pub fn new(options: &AnalyzerOptions) -> Result<Self, AnalyzeError> {
        let mut base = options.registry.trim().to_string();
        // Url::join drops the last path segment without this
        if !base.ends_with('/') {
            base.push('/');
        }

        let base_url = Url::parse(&base).map_err(|e| {
            AnalyzeError::invalid_arguments(format!(
                "invalid registry URL '{}': {e}",
                options.registry
            ))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .default_headers(build_headers(options)?)
            .user_agent(concat!("treeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AnalyzeError::invalid_arguments(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            http,
            fetch_permits: Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES)),
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the packument for a package.
    ///
    /// `descriptor` is the version descriptor being resolved; it only feeds
    /// error reporting.
    ///
    /// # Errors
    /// Returns `PackageNotFound` on transport failure, timeout, non-2xx
    /// status, or an unparseable body, with the original cause attached.
    pub async fn fetch_packument(
        &self,
        name: &str,
        descriptor: &str,
    ) -> Result<Packument, AnalyzeError> {
        let url = self
            .base_url
            .join(&encode_name(name))
            .map_err(|e| AnalyzeError::not_found_caused(name, descriptor, "invalid package URL", e))?;

        let _permit = self
            .fetch_permits
            .acquire()
            .await
            .map_err(|e| AnalyzeError::not_found_caused(name, descriptor, "fetch pool closed", e))?;

        debug!(package = name, url = %url, "fetching packument");

        let response = self.http.get(url).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out"
            } else if e.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            AnalyzeError::not_found_caused(name, descriptor, reason, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzeError::not_found(
                name,
                descriptor,
                format!("registry returned status {status}"),
            ));
        }

        response.json::<Packument>().await.map_err(|e| {
            // The timeout can also fire mid-body
            let reason = if e.is_timeout() {
                "request timed out"
            } else {
                "failed to parse package metadata"
            };
            AnalyzeError::not_found_caused(name, descriptor, reason, e)
        })
    }
}

/// Default headers merged with caller-supplied entries; caller wins.
fn build_headers(options: &AnalyzerOptions) -> Result<HeaderMap, AnalyzeError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in &options.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            AnalyzeError::invalid_arguments(format!("invalid header name '{name}': {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            AnalyzeError::invalid_arguments(format!("invalid value for header '{name}': {e}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// URL-encode a package name for the registry path.
///
/// Scoped packages encode the slash: `@scope/pkg` -> `@scope%2Fpkg`.
fn encode_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2F")
    } else {
        name.to_string()
    }
}
