//! Module source linker.
//!
//! Turns the raw `source` attribute of a configuration into a typed
//! [`SourceExpression`] and resolves it to a graph node: an already scanned
//! module when the path is known, or a [`SyntheticModuleNode`] placeholder
//! otherwise. Resolution is a pure data transformation, nothing here reads
//! the file system or the network.

mod resolve;
mod source;

pub use resolve::{
    ResolutionContext, ResolutionResult, SourceLinker, SourceResolver, SyntheticIdStrategy,
    SyntheticModuleNode,
};
pub use source::{classify, is_external, parse_source, SourceExpression, SourceType};
