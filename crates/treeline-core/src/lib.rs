#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod analyze;
pub mod cache;
pub mod config;
pub mod error;
pub mod hoist;
pub mod registry;
pub mod resolve;
pub mod spec;
pub mod tree;
pub mod version;

pub use analyze::{
    AnalysisResult, Analyzer, CombinedAnalysis, MultiAnalysisResult, PackageRequest,
    VIRTUAL_ROOT_NAME, VIRTUAL_ROOT_VERSION,
};
pub use cache::MetadataCache;
pub use config::{AnalyzerOptions, DEFAULT_REGISTRY, DEFAULT_TIMEOUT_MS};
pub use error::AnalyzeError;
pub use hoist::{plan_hoisted_tree, plan_virtual_root, HoistedDependency, HoistedTree};
pub use registry::{Packument, RegistryClient, VersionMetadata};
pub use resolve::{PackageInfo, VersionResolver};
pub use spec::PackageSpec;
pub use tree::{DependencyNode, FlatDependency, FlatDependencyMap, TreeBuilder};
