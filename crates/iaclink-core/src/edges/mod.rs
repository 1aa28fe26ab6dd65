//! Typed dependency edges and the factory that validates and builds them.

mod factory;
mod types;

pub use factory::{
    DependsOnEdgeOptions, EdgeFactory, IncludesEdgeOptions, PassesInputEdgeOptions,
    SourcesEdgeOptions,
};
pub use types::{
    Edge, EdgeKind, EdgeMetadata, EdgeSourceType, EdgeType, EvidenceKind, EvidenceSummary,
    MergeStrategy,
};
