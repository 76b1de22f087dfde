//! Logical dependency tree construction.
//!
//! Builds the tree concurrently against the registry, recording every
//! `(name, version)` occurrence in a flat index keyed `"{name}@{version}"`.
//! The logical tree is a tree, not a DAG: repeated `(name, version)` pairs
//! appear as independent nodes so the flat index captures every distinct
//! parent chain.

use crate::error::AnalyzeError;
use crate::resolve::VersionResolver;
use futures::future::{try_join_all, BoxFuture};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::warn;

/// The `required_by` entry recorded for top-level packages.
pub const ROOT_PARENT: &str = "root";

/// A node in the logical dependency tree.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyNode {
    pub name: String,
    /// Concrete resolved version.
    pub version: String,
    /// Child nodes, one per declared dependency, in declaration order.
    pub dependencies: IndexMap<String, DependencyNode>,
    /// Literal declared peer descriptors; never expanded into children.
    pub peer_dependencies: IndexMap<String, String>,
}

impl DependencyNode {
    /// The `"{name}@{version}"` key for this node.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// One entry per unique `(name, version)` pair observed across a build.
#[derive(Debug, Clone, Serialize)]
pub struct FlatDependency {
    pub name: String,
    pub version: String,
    /// Every distinct parent path that demanded this pair; `"root"` for
    /// top-level occurrences, otherwise `"a@1 > b@2 > …"`.
    pub required_by: IndexSet<String>,
}

/// Flat index keyed by `"{name}@{version}"`.
pub type FlatDependencyMap = IndexMap<String, FlatDependency>;

/// Concurrent builder for the logical dependency tree.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    resolver: VersionResolver,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(resolver: VersionResolver) -> Self {
        Self { resolver }
    }

    /// The underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Build the tree rooted at `(name, descriptor)`, registering every
    /// occurrence in `flat`.
    ///
    /// Sibling children are resolved concurrently; the first failure wins
    /// and pending sibling work is dropped.
    ///
    /// # Errors
    /// Returns `PackageNotFound` when any reachable dependency edge fails to
    /// resolve.
    pub async fn build(
        &self,
        name: &str,
        descriptor: &str,
        flat: &Mutex<FlatDependencyMap>,
        parent_path: Option<String>,
    ) -> Result<DependencyNode, AnalyzeError> {
        self.build_node(
            name.to_string(),
            descriptor.to_string(),
            flat,
            parent_path,
            HashSet::new(),
        )
        .await
    }

    /// Recursive step. Boxed because the future type is self-referential.
    ///
    /// `active` holds the `"{name}@{version}"` keys on the path from the
    /// root to this node; revisiting one truncates the node (same name and
    /// version, no children) so cyclic metadata terminates.
    fn build_node<'a>(
        &'a self,
        name: String,
        descriptor: String,
        flat: &'a Mutex<FlatDependencyMap>,
        parent_path: Option<String>,
        active: HashSet<String>,
    ) -> BoxFuture<'a, Result<DependencyNode, AnalyzeError>> {
        Box::pin(async move {
            let info = self.resolver.resolve(&name, &descriptor).await?;
            let key = format!("{}@{}", info.name, info.version);

            {
                let mut flat = flat.lock().await;
                let entry = flat.entry(key.clone()).or_insert_with(|| FlatDependency {
                    name: info.name.clone(),
                    version: info.version.clone(),
                    required_by: IndexSet::new(),
                });
                entry
                    .required_by
                    .insert(parent_path.clone().unwrap_or_else(|| ROOT_PARENT.to_string()));
            }

            let mut node = DependencyNode {
                name: info.name.clone(),
                version: info.version.clone(),
                dependencies: IndexMap::new(),
                peer_dependencies: info.peer_dependencies.clone(),
            };

            if active.contains(&key) {
                warn!(package = %key, "dependency cycle detected, truncating");
                return Ok(node);
            }

            let current_path = match &parent_path {
                Some(parent) => format!("{parent} > {key}"),
                None => key.clone(),
            };

            let mut active = active;
            active.insert(key);

            let children = try_join_all(info.dependencies.iter().map(
                |(child_name, child_descriptor)| {
                    self.build_node(
                        child_name.clone(),
                        child_descriptor.clone(),
                        flat,
                        Some(current_path.clone()),
                        active.clone(),
                    )
                },
            ))
            .await?;

            for (child_name, child) in info.dependencies.keys().zip(children) {
                node.dependencies.insert(child_name.clone(), child);
            }

            Ok(node)
        })
    }
}
