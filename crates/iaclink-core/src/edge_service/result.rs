use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::edges::{Edge, EdgeSourceType, EdgeType};
use crate::linker::SyntheticModuleNode;

use super::hints::UnresolvedReference;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStatistics {
    pub total_edges: usize,
    pub edges_by_type: IndexMap<EdgeType, usize>,
    pub edges_by_source_type: IndexMap<EdgeSourceType, usize>,
    pub synthetic_node_count: usize,
    pub unresolved_count: usize,
    /// Mean confidence of the kept edges, 0 when there are none
    pub average_confidence: f64,
    /// Edges dropped by the minimum confidence threshold
    pub filtered_out_count: usize,
    pub duration_ms: u64,
}

impl EdgeStatistics {
    pub(crate) fn compute(
        edges: &[Edge],
        synthetic_nodes: &[SyntheticModuleNode],
        unresolved_references: &[UnresolvedReference],
        filtered_out_count: usize,
        duration_ms: u64,
    ) -> Self {
        let mut edges_by_type: IndexMap<EdgeType, usize> = EdgeType::iter().map(|t| (t, 0)).collect();
        let mut edges_by_source_type = IndexMap::new();
        for edge in edges {
            *edges_by_type.entry(edge.edge_type()).or_insert(0) += 1;
            if let Some(source_type) = edge.source_type() {
                *edges_by_source_type.entry(source_type).or_insert(0) += 1;
            }
        }

        let mut synthetic_ids: Vec<&str> = synthetic_nodes.iter().map(|n| n.id.as_str()).collect();
        synthetic_ids.sort_unstable();
        synthetic_ids.dedup();

        let average_confidence = if edges.is_empty() {
            0.0
        } else {
            edges.iter().map(|e| e.confidence() as f64).sum::<f64>() / edges.len() as f64
        };

        EdgeStatistics {
            total_edges: edges.len(),
            edges_by_type,
            edges_by_source_type,
            synthetic_node_count: synthetic_ids.len(),
            unresolved_count: unresolved_references.len(),
            average_confidence,
            filtered_out_count,
            duration_ms,
        }
    }

    pub fn count(&self, edge_type: EdgeType) -> usize {
        self.edges_by_type.get(&edge_type).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCreationResult {
    pub edges: Vec<Edge>,
    pub synthetic_nodes: Vec<SyntheticModuleNode>,
    pub unresolved_references: Vec<UnresolvedReference>,
    pub statistics: EdgeStatistics,
}

impl EdgeCreationResult {
    pub fn edges_of_type(&self, edge_type: EdgeType) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.edge_type() == edge_type)
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved_references.is_empty()
    }
}
