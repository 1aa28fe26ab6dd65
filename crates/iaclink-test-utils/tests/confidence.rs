use iaclink_core::kit::{Evidence, EvidenceType, SourceLocation};
use iaclink_core::{aggregate, aggregate_scores, DependencyHint, EdgeType};
use iaclink_test_utils::{evidence, BatchBuilder};
use test_case::test_case;

#[test_case(&[90, 60], 80)]
#[test_case(&[95, 75, 60], 83)]
#[test_case(&[75, 60, 95], 83)]
#[test_case(&[50, 50, 50, 50], 50)]
#[test_case(&[100, 0], 67)]
fn test_aggregate_vectors(scores: &[u8], expected: u8) {
    assert_eq!(aggregate_scores(scores), expected);
}

#[test]
fn test_aggregate_stays_between_min_and_max() {
    let vectors: [&[u8]; 4] = [&[10, 90], &[33, 66, 99], &[1, 2, 3, 4, 5], &[100, 100, 0, 0]];
    for scores in vectors {
        let score = aggregate_scores(scores);
        let (min, max) = (*scores.iter().min().unwrap(), *scores.iter().max().unwrap());
        assert!(score >= min && score <= max, "{} outside [{}, {}] for {:?}", score, min, max, scores);
    }
}

#[test]
fn test_corroboration_never_lowers_below_weakest() {
    for extra in 0..=100u8 {
        let score = aggregate_scores(&[80, extra]);
        assert!(score >= extra.min(80));
        assert!(score <= 80.max(extra));
    }
}

#[test]
fn test_builder_clamps_where_constructor_rejects() {
    let location = SourceLocation::line("live/app/terragrunt.hcl", 3);

    assert!(Evidence::new(location.clone(), "", 150, EvidenceType::Explicit, "x").is_err());
    assert!(Evidence::new(location.clone(), "", -1, EvidenceType::Explicit, "x").is_err());

    let clamped = Evidence::builder(location).confidence(150).description("x").build();
    assert_eq!(clamped.confidence(), 100);
    assert!(clamped.validate().is_ok());
}

#[test]
fn test_edge_confidence_aggregates_hint_evidence() {
    let items = vec![
        evidence("app.hcl", 95, EvidenceType::Explicit),
        evidence("app.hcl", 75, EvidenceType::Inferred),
        evidence("app.hcl", 60, EvidenceType::Heuristic),
    ];
    let hint = DependencyHint {
        source_id: "app".to_string(),
        target_id: Some("vpc".to_string()),
        target_path: "../vpc".to_string(),
        resolved: true,
        dependency_name: "vpc".to_string(),
        evidence: items.clone(),
        ..Default::default()
    };
    let result = BatchBuilder::new("scan-1", "/repo").dependency_hint(hint).run().unwrap();

    let edge = result.edges_of_type(EdgeType::DependsOn).next().unwrap();
    assert_eq!(edge.confidence(), aggregate(&items));
    assert_eq!(edge.confidence(), 83);
    assert_eq!(edge.metadata().evidence.len(), 3);
    assert!(!edge.metadata().implicit);
}
