#[macro_use]
extern crate lazy_static;

pub extern crate iaclink_kit as kit;

pub mod confidence;
pub mod constants;
pub mod edge_service;
pub mod edges;
pub mod graph;
pub mod linker;
pub mod recovery;

pub use confidence::{aggregate, aggregate_scores};
pub use edge_service::{
    ConfigNode, DependencyHint, EdgeBatch, EdgeCreationContext, EdgeCreationResult, EdgeService,
    EdgeServiceConfig, EdgeStatistics, IncludeHint, InputHint, ReferenceType, UnresolvedReference,
};
pub use edges::{Edge, EdgeFactory, EdgeKind, EdgeSourceType, EdgeType, MergeStrategy};
pub use graph::{EdgeGraph, GraphError};
pub use linker::{
    parse_source, ResolutionContext, ResolutionResult, SourceExpression, SourceLinker,
    SourceResolver, SourceType, SyntheticIdStrategy, SyntheticModuleNode,
};
pub use recovery::{RecoveryManager, RecoveryOptions};
