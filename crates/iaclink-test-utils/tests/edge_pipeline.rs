use std::sync::Arc;

use iaclink_core::kit::types::ErrorCode;
use iaclink_core::{EdgeGraph, EdgeServiceConfig, EdgeType, ReferenceType, SyntheticIdStrategy};
use iaclink_test_utils::fixtures::{terragrunt_stack, FailingResolver};
use iaclink_test_utils::{
    assert_edge, assert_edge_count, assert_error_code, assert_no_unresolved, assert_unresolved, BatchBuilder,
};

#[test]
fn test_stack_with_scanned_modules() {
    let result = terragrunt_stack(true).run().unwrap();

    assert_eq!(result.edges.len(), 5);
    assert_edge_count!(result, EdgeType::Includes, 2);
    assert_edge_count!(result, EdgeType::DependsOn, 1);
    assert_edge_count!(result, EdgeType::Sources, 2);
    assert_edge!(result, EdgeType::Sources, "vpc", "mod-vpc");
    assert_edge!(result, EdgeType::Sources, "app", "mod-app");
    assert!(result.synthetic_nodes.is_empty());
    assert_no_unresolved!(result);
    assert!(result.is_complete());
}

#[test]
fn test_stack_without_scanned_modules_synthesizes_nodes() {
    let result = terragrunt_stack(false).run().unwrap();

    assert_eq!(result.edges.len(), 5);
    assert_eq!(result.synthetic_nodes.len(), 2);
    assert_eq!(result.statistics.synthetic_node_count, 2);

    let paths: Vec<&str> = result.synthetic_nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, vec!["/repo/modules/vpc", "/repo/modules/app"]);
    for (node, config) in result.synthetic_nodes.iter().zip(["vpc", "app"]) {
        assert!(node.synthetic);
        assert!(!node.outside_repository);
        assert_eq!(node.name, config);
        assert_edge!(result, EdgeType::Sources, config, node.id.as_str());
    }
}

#[test]
fn test_every_edge_carries_its_scan_and_evidence() {
    let result = terragrunt_stack(true).sequential_ids().run().unwrap();

    let ids: Vec<&str> = result.edges.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["scan-demo-1", "scan-demo-2", "scan-demo-3", "scan-demo-4", "scan-demo-5"]);
    for edge in &result.edges {
        assert_eq!(edge.scan_id(), "scan-demo");
        assert!(!edge.evidence().is_empty());
        assert_eq!(edge.confidence(), 95);
        assert_ne!(edge.source(), edge.target());
    }
}

#[test]
fn test_failing_resolver_loses_exactly_one_edge() {
    let builder = BatchBuilder::new("scan-1", "/repo")
        .module("a", "live/a/terragrunt.hcl", "../../modules/a")
        .module("b", "live/b/terragrunt.hcl", "hashicorp/consul/aws")
        .module("c", "live/c/terragrunt.hcl", "git::https://example.com/c.git?ref=v1.0.0")
        .resolver(Arc::new(FailingResolver::new(["hashicorp/consul/aws"])));
    let result = builder.run().unwrap();

    assert_edge_count!(result, EdgeType::Sources, 2);
    assert_eq!(result.unresolved_references.len(), 1);
    assert_eq!(result.unresolved_references[0].reference_type, ReferenceType::Source);
    assert_eq!(result.unresolved_references[0].source_node_id, "b");
    assert_unresolved!(result, "registry unreachable");
    assert_unresolved!(result, "RESOLVER_FAILURE");
}

#[test]
fn test_unresolved_hints_become_placeholders_when_enabled() {
    let result = terragrunt_stack(true)
        .unresolved_include("app", "../missing/root.hcl")
        .unresolved_dependency("app", "db", "../db")
        .config(EdgeServiceConfig::default().with_unresolved_edges(true))
        .run()
        .unwrap();

    assert_eq!(result.unresolved_references.len(), 2);
    assert_edge!(result, EdgeType::Includes, "app", "unresolved:../missing/root.hcl");
    assert_edge!(result, EdgeType::DependsOn, "app", "unresolved:../db");
    let placeholder = result.edges.iter().find(|e| e.target() == "unresolved:../db").unwrap();
    assert_eq!(placeholder.confidence(), 48);
}

#[test]
fn test_threshold_applies_to_placeholders() {
    let result = terragrunt_stack(true)
        .unresolved_dependency("app", "db", "../db")
        .config(EdgeServiceConfig::default().with_unresolved_edges(true).with_min_confidence(50))
        .run()
        .unwrap();

    assert_eq!(result.edges.len(), 5);
    assert_eq!(result.statistics.filtered_out_count, 1);
    assert_eq!(result.unresolved_references.len(), 1);
}

#[test]
fn test_invalid_context_is_the_only_hard_failure() {
    let result = BatchBuilder::new("scan-1", "").node("a", "a.hcl").run();
    assert_error_code!(result, ErrorCode::InvalidContext);

    let result = BatchBuilder::new("scan-1", "/repo").existing_module("", "mod-x").run();
    assert_error_code!(result, ErrorCode::InvalidContext);
}

#[test]
fn test_deterministic_ids_are_stable_across_runs() {
    let builder = terragrunt_stack(false)
        .sequential_ids()
        .config(EdgeServiceConfig::default().with_synthetic_ids(SyntheticIdStrategy::Deterministic));

    let first = builder.run().unwrap();
    let second = builder.run().unwrap();

    assert_eq!(first.edges, second.edges);
    assert_eq!(first.synthetic_nodes, second.synthetic_nodes);
    assert!(first.synthetic_nodes.iter().all(|n| n.id.starts_with("synthetic:scan-demo:local:")));
}

#[test]
fn test_edges_feed_the_dependency_graph() {
    let result = terragrunt_stack(true).dependency("vpc", "root").run().unwrap();
    let graph = EdgeGraph::from_edges(&result.edges);

    assert!(graph.dependency_cycles().is_empty());
    let order = graph.topological_order().unwrap();
    let position = |id: &str| order.iter().position(|n| n == id).unwrap();
    assert!(position("root") < position("vpc"));
    assert!(position("vpc") < position("app"));
    assert_eq!(graph.dependents_of("vpc"), vec!["app".to_string()]);
}

#[test]
fn test_dependency_cycle_is_reported() {
    let result = BatchBuilder::new("scan-1", "/repo")
        .node("a", "a.hcl")
        .node("b", "b.hcl")
        .dependency("a", "b")
        .dependency("b", "a")
        .run()
        .unwrap();
    let graph = EdgeGraph::from_edges(&result.edges);

    assert_eq!(graph.dependency_cycles(), vec![vec!["a".to_string(), "b".to_string()]]);
    assert!(graph.topological_order().is_err());
}
