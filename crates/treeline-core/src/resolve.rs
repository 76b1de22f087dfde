//! Version resolution: descriptor to concrete published version.

use crate::cache::MetadataCache;
use crate::error::AnalyzeError;
use crate::registry::{Packument, RegistryClient};
use crate::version;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Immutable record of a single published package version.
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub name: String,
    /// Concrete semver, never a range or tag.
    pub version: String,
    pub dependencies: IndexMap<String, String>,
    /// Carried for completeness; never expanded.
    pub dev_dependencies: IndexMap<String, String>,
    pub peer_dependencies: IndexMap<String, String>,
}

/// Reduces `(name, descriptor)` pairs to concrete [`PackageInfo`] records,
/// memoizing through the shared metadata cache.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: RegistryClient,
    cache: Arc<MetadataCache>,
}

impl VersionResolver {
    #[must_use]
    pub fn new(client: RegistryClient, cache: Arc<MetadataCache>) -> Self {
        Self { client, cache }
    }

    /// The shared metadata cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Resolve a descriptor (exact version, dist-tag, or range) to a
    /// concrete package record.
    ///
    /// # Errors
    /// Returns `PackageNotFound` when the packument cannot be fetched or no
    /// published version matches the descriptor.
    pub async fn resolve(
        &self,
        name: &str,
        descriptor: &str,
    ) -> Result<Arc<PackageInfo>, AnalyzeError> {
        self.cache
            .get_or_resolve(name, descriptor, || self.resolve_uncached(name, descriptor))
            .await
    }

    async fn resolve_uncached(
        &self,
        name: &str,
        descriptor: &str,
    ) -> Result<PackageInfo, AnalyzeError> {
        let packument = self.client.fetch_packument(name, descriptor).await?;
        let selected = select_version(&packument, descriptor);

        let Some(version) = selected else {
            return Err(AnalyzeError::not_found(
                name,
                descriptor,
                "no matching version found",
            ));
        };

        let Some(meta) = packument.versions.get(&version) else {
            // A dist-tag can point at a version the registry never published
            return Err(AnalyzeError::not_found(
                name,
                descriptor,
                "no matching version found",
            ));
        };

        debug!(package = name, descriptor, version = %version, "resolved version");

        Ok(PackageInfo {
            name: name.to_string(),
            version,
            dependencies: meta.dependencies.clone(),
            dev_dependencies: meta.dev_dependencies.clone(),
            peer_dependencies: meta.peer_dependencies.clone(),
        })
    }
}

/// Pick the concrete version a descriptor names.
///
/// Selection order is observable and fixed: exact published version first,
/// then dist-tag, then highest range match. A dist-tag whose name parses as
/// a range still resolves as a tag.
fn select_version(packument: &Packument, descriptor: &str) -> Option<String> {
    if packument.versions.contains_key(descriptor) {
        return Some(descriptor.to_string());
    }

    if let Some(tagged) = packument.dist_tags.get(descriptor) {
        return Some(tagged.clone());
    }

    if version::valid_range(descriptor).is_some() {
        let keys = packument.versions.keys().map(String::as_str);
        return version::max_satisfying(keys, descriptor).map(String::from);
    }

    None
}
