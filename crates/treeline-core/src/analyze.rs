//! Top-level analysis façade.

use crate::cache::MetadataCache;
use crate::config::AnalyzerOptions;
use crate::error::AnalyzeError;
use crate::hoist::{plan_hoisted_tree, plan_virtual_root, HoistedTree};
use crate::registry::RegistryClient;
use crate::resolve::VersionResolver;
use crate::spec::PackageSpec;
use crate::tree::{DependencyNode, FlatDependencyMap, TreeBuilder};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Name of the synthetic root used for multi-package analysis. Never appears
/// in a hoisted root.
pub const VIRTUAL_ROOT_NAME: &str = "virtual-root";

/// Version of the synthetic root.
pub const VIRTUAL_ROOT_VERSION: &str = "0.0.0";

/// A single entry of a multi-package request.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    pub name: String,
    /// Version descriptor: exact version, dist-tag, or range.
    pub version: String,
}

impl PackageRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The `"{name}@{descriptor}"` key identifying this request.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Result of a single-package analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub dependency_tree: DependencyNode,
    pub hoisted_tree: HoistedTree,
    pub flat_dependencies: FlatDependencyMap,
}

/// Combined view of a multi-package analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombinedAnalysis {
    pub hoisted_tree: HoistedTree,
    pub flat_dependencies: FlatDependencyMap,
}

/// Result of a multi-package analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MultiAnalysisResult {
    /// Per-request results keyed by `"{name}@{descriptor}"`.
    pub individual: IndexMap<String, AnalysisResult>,
    pub combined: CombinedAnalysis,
}

/// Dependency analyzer: resolves a package's transitive closure against an
/// npm-compatible registry and plans its hoisted layout.
///
/// The metadata cache lives as long as the analyzer, so repeated calls skip
/// the registry for descriptors they have already resolved.
#[derive(Debug, Clone)]
pub struct Analyzer {
    builder: TreeBuilder,
}

impl Analyzer {
    /// Create an analyzer.
    ///
    /// # Errors
    /// Returns `InvalidArguments` when the options are unusable (malformed
    /// registry URL or headers).
    pub fn new(options: &AnalyzerOptions) -> Result<Self, AnalyzeError> {
        let client = RegistryClient::new(options)?;
        let resolver = VersionResolver::new(client, Arc::new(MetadataCache::new()));
        Ok(Self {
            builder: TreeBuilder::new(resolver),
        })
    }

    /// Create an analyzer against the default public registry.
    ///
    /// # Errors
    /// Returns `InvalidArguments` if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, AnalyzeError> {
        Self::new(&AnalyzerOptions::default())
    }

    /// The shared metadata cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        self.builder.resolver().cache()
    }

    /// Analyze a single package.
    ///
    /// `version` is a descriptor: an exact version, a dist-tag, or a range.
    ///
    /// # Errors
    /// Returns `InvalidArguments` when `name` or `version` is empty, and
    /// `PackageNotFound` when any reachable dependency fails to resolve.
    pub async fn analyze(
        &self,
        name: &str,
        version: &str,
    ) -> Result<AnalysisResult, AnalyzeError> {
        if name.trim().is_empty() || version.trim().is_empty() {
            return Err(AnalyzeError::invalid_arguments(
                "package name and version are required",
            ));
        }

        let flat = Mutex::new(FlatDependencyMap::new());
        let dependency_tree = self.builder.build(name, version, &flat, None).await?;
        let hoisted_tree = plan_hoisted_tree(&dependency_tree);

        Ok(AnalysisResult {
            dependency_tree,
            hoisted_tree,
            flat_dependencies: flat.into_inner(),
        })
    }

    /// Analyze a `name@descriptor` request string; a bare name resolves the
    /// `latest` dist-tag.
    ///
    /// # Errors
    /// Returns `InvalidArguments` for malformed specs, otherwise as
    /// [`Self::analyze`].
    pub async fn analyze_spec(&self, spec: &str) -> Result<AnalysisResult, AnalyzeError> {
        let spec = PackageSpec::parse(spec)?;
        let descriptor = spec.descriptor.as_deref().unwrap_or("latest");
        self.analyze(&spec.name, descriptor).await
    }

    /// Analyze several packages and plan one shared installation root.
    ///
    /// Each request runs through the single-package path; the per-package
    /// logical trees then hang off a synthetic `virtual-root@0.0.0` node
    /// which is hoisted as a whole. An empty input yields a well-formed
    /// empty result.
    ///
    /// # Errors
    /// Fails on the first request that fails; callers wanting best-effort
    /// should drive [`Self::analyze`] per package.
    pub async fn analyze_many(
        &self,
        packages: &[PackageRequest],
    ) -> Result<MultiAnalysisResult, AnalyzeError> {
        let mut individual: IndexMap<String, AnalysisResult> = IndexMap::new();

        for request in packages {
            let result = self.analyze(&request.name, &request.version).await?;
            individual.insert(request.key(), result);
        }

        let mut virtual_root = DependencyNode {
            name: VIRTUAL_ROOT_NAME.to_string(),
            version: VIRTUAL_ROOT_VERSION.to_string(),
            dependencies: IndexMap::new(),
            peer_dependencies: IndexMap::new(),
        };
        let mut flat_dependencies = FlatDependencyMap::new();

        for (key, result) in &individual {
            virtual_root
                .dependencies
                .insert(key.clone(), result.dependency_tree.clone());

            for (flat_key, dep) in &result.flat_dependencies {
                match flat_dependencies.get_mut(flat_key) {
                    Some(existing) => {
                        for parent in &dep.required_by {
                            existing.required_by.insert(parent.clone());
                        }
                    }
                    None => {
                        flat_dependencies.insert(flat_key.clone(), dep.clone());
                    }
                }
            }
        }

        let hoisted_tree = plan_virtual_root(&virtual_root);

        Ok(MultiAnalysisResult {
            individual,
            combined: CombinedAnalysis {
                hoisted_tree,
                flat_dependencies,
            },
        })
    }
}
