//! Graph view over a set of edges, used for cycle detection and ordering of
//! `depends_on` relationships.

use std::collections::HashMap;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::edges::{Edge, EdgeType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct EdgeGraph {
    graph: DiGraph<String, EdgeType>,
    /// Same node indices as `graph`, `depends_on` edges only
    dependencies: DiGraph<String, ()>,
    lookup: HashMap<String, NodeIndex>,
}

impl EdgeGraph {
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = DiGraph::new();
        let mut lookup = HashMap::new();
        for edge in edges {
            let source = index_node(&mut graph, &mut lookup, edge.source());
            let target = index_node(&mut graph, &mut lookup, edge.target());
            graph.add_edge(source, target, edge.edge_type());
        }
        let dependencies = graph.filter_map(
            |_, id| Some(id.clone()),
            |_, edge_type| (*edge_type == EdgeType::DependsOn).then_some(()),
        );
        EdgeGraph { graph, dependencies, lookup }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.lookup.contains_key(node_id)
    }

    /// Groups of nodes that depend on each other, each sorted by id.
    pub fn dependency_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.dependencies)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.dependencies.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut ids: Vec<String> = component.iter().map(|i| self.dependencies[*i].clone()).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Node ids ordered so that every node comes after the nodes it depends on.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        match toposort(&self.dependencies, None) {
            Ok(order) => Ok(order.into_iter().rev().map(|i| self.dependencies[i].clone()).collect()),
            Err(cycle) => {
                let offending = &self.dependencies[cycle.node_id()];
                let members = self
                    .dependency_cycles()
                    .into_iter()
                    .find(|ids| ids.contains(offending))
                    .unwrap_or_else(|| vec![offending.clone()]);
                Err(GraphError::DependencyCycle(members))
            }
        }
    }

    /// Nodes with a `depends_on` edge pointing at `node_id`
    pub fn dependents_of(&self, node_id: &str) -> Vec<String> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Targets of the `depends_on` edges leaving `node_id`
    pub fn dependencies_of(&self, node_id: &str) -> Vec<String> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<String> {
        let Some(index) = self.lookup.get(node_id) else {
            return vec![];
        };
        let mut ids: Vec<String> = self
            .dependencies
            .neighbors_directed(*index, direction)
            .map(|i| self.dependencies[i].clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

fn index_node(
    graph: &mut DiGraph<String, EdgeType>,
    lookup: &mut HashMap<String, NodeIndex>,
    node_id: &str,
) -> NodeIndex {
    if let Some(index) = lookup.get(node_id) {
        return *index;
    }
    let index = graph.add_node(node_id.to_string());
    lookup.insert(node_id.to_string(), index);
    index
}
