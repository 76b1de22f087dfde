//! Hoisting planner.
//!
//! Converts a logical dependency tree into the flattened layout a client
//! installer would produce: one shared root level, with packages that cannot
//! share it (version conflicts, peer constraints) nested under their logical
//! parent's `"{name}@{version}"` path.

use crate::tree::DependencyNode;
use crate::version;
use indexmap::IndexMap;
use serde::Serialize;

/// A package placed somewhere in the hoisted tree.
#[derive(Debug, Clone, Serialize)]
pub struct HoistedDependency {
    pub name: String,
    pub version: String,
    /// Directly declared dependency names mapped to the concrete version
    /// each resolved to. Recursion happens by lookup through the tree, not
    /// by nesting records.
    pub dependencies: IndexMap<String, String>,
    /// Literal declared peer descriptors.
    pub peer_dependencies: IndexMap<String, String>,
    /// Parent path for nested placements; `None` at the root level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// The flattened installation plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HoistedTree {
    /// Root-level placements; names are unique here.
    pub root: IndexMap<String, HoistedDependency>,
    /// Nested placements keyed by parent path, then package name.
    pub nested: IndexMap<String, IndexMap<String, HoistedDependency>>,
}

impl HoistedTree {
    /// Total number of placements, root and nested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len() + self.nested.values().map(IndexMap::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.nested.is_empty()
    }
}

/// Plan the hoisted tree for a single-package analysis.
///
/// The logical root is placed at the root level unconditionally; every
/// other node is hoisted when the conflict and peer rules allow it.
#[must_use]
pub fn plan_hoisted_tree(root: &DependencyNode) -> HoistedTree {
    let mut tree = HoistedTree::default();
    tree.root
        .insert(root.name.clone(), hoisted_record(root, None));
    place_children(&mut tree, root);
    tree
}

/// Plan the hoisted tree for a synthetic virtual root.
///
/// The virtual root itself is never placed; its children are walked as if
/// they were top-level packages.
#[must_use]
pub fn plan_virtual_root(root: &DependencyNode) -> HoistedTree {
    let mut tree = HoistedTree::default();
    place_children(&mut tree, root);
    tree
}

/// Whether two version strings cannot share one root slot.
///
/// Conservative by design: two ranges, or anything unparseable, is a
/// conflict.
fn version_conflict(existing: &str, candidate: &str) -> bool {
    if existing == candidate {
        return false;
    }

    match (version::valid(existing), version::valid(candidate)) {
        (Some(existing), Some(candidate)) => existing != candidate,
        (Some(concrete), None) => match version::valid_range(candidate) {
            Some(range) => !range.matches(&concrete),
            None => true,
        },
        (None, Some(concrete)) => match version::valid_range(existing) {
            Some(range) => !range.matches(&concrete),
            None => true,
        },
        (None, None) => true,
    }
}

/// Whether `node` may be placed at the root level given the placements and
/// peer declarations already recorded there.
///
/// Peers with no root placement yet are deferred, not blocking.
fn can_hoist(tree: &HoistedTree, node: &DependencyNode) -> bool {
    // Peer declarations already at root constrain the candidate
    for placed in tree.root.values() {
        for (peer_name, peer_range) in &placed.peer_dependencies {
            if peer_name == &node.name && !version::satisfies(&node.version, peer_range) {
                return false;
            }
        }
    }

    // The candidate's own peers constrain against what is already at root
    for (peer_name, peer_range) in &node.peer_dependencies {
        if let Some(existing) = tree.root.get(peer_name) {
            if !version::satisfies(&existing.version, peer_range) {
                return false;
            }
        }
    }

    true
}

/// Build the placement record for a node.
fn hoisted_record(node: &DependencyNode, parent: Option<&str>) -> HoistedDependency {
    HoistedDependency {
        name: node.name.clone(),
        version: node.version.clone(),
        dependencies: node
            .dependencies
            .iter()
            .map(|(name, child)| (name.clone(), child.version.clone()))
            .collect(),
        peer_dependencies: node.peer_dependencies.clone(),
        parent: parent.map(str::to_string),
    }
}

/// Walk `node`'s children depth-first, using `node`'s own key as their
/// parent path.
fn place_children(tree: &mut HoistedTree, node: &DependencyNode) {
    let parent_path = node.key();
    for child in node.dependencies.values() {
        place(tree, child, &parent_path);
    }
}

/// Place one non-root node, then recurse into its children.
///
/// The first node to reach a name wins the root slot; placements are never
/// revisited.
fn place(tree: &mut HoistedTree, node: &DependencyNode, parent_path: &str) {
    match tree.root.get(&node.name) {
        None => {
            if can_hoist(tree, node) {
                tree.root
                    .insert(node.name.clone(), hoisted_record(node, None));
            } else {
                nest(tree, node, parent_path);
            }
        }
        Some(existing) => {
            let conflicts = version_conflict(&existing.version, &node.version);
            if conflicts || !can_hoist(tree, node) {
                nest(tree, node, parent_path);
            }
            // Otherwise the existing root placement is reused
        }
    }

    place_children(tree, node);
}

fn nest(tree: &mut HoistedTree, node: &DependencyNode, parent_path: &str) {
    tree.nested
        .entry(parent_path.to_string())
        .or_default()
        .insert(node.name.clone(), hoisted_record(node, Some(parent_path)));
}
