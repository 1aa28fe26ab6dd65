//! Common assertion macros for iaclink tests

/// Assert that a result failed with a specific error code
#[macro_export]
macro_rules! assert_error_code {
    ($result:expr, $code:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error {}, but got success", $code),
            Err(e) => assert_eq!(e.code(), $code, "Expected error {}, but got: {}", $code, e),
        }
    };
}

/// Assert the number of edges of one type in an `EdgeCreationResult`
#[macro_export]
macro_rules! assert_edge_count {
    ($result:expr, $edge_type:expr, $count:expr) => {
        let found = $result.edges.iter().filter(|e| e.edge_type() == $edge_type).count();
        assert_eq!(
            found,
            $count,
            "Expected {} {} edges, found {}: {:?}",
            $count,
            $edge_type,
            found,
            $result.edges.iter().map(|e| e.label()).collect::<Vec<_>>()
        );
    };
}

/// Assert that an edge of the given type links `source` to `target`
#[macro_export]
macro_rules! assert_edge {
    ($result:expr, $edge_type:expr, $source:expr, $target:expr) => {
        let found = $result
            .edges
            .iter()
            .any(|e| e.edge_type() == $edge_type && e.source() == $source && e.target() == $target);
        assert!(
            found,
            "Expected {} edge {} -> {}, edges were:\n{}",
            $edge_type,
            $source,
            $target,
            $result
                .edges
                .iter()
                .map(|e| format!("  {} {} -> {}", e.edge_type(), e.source(), e.target()))
                .collect::<Vec<_>>()
                .join("\n")
        );
    };
}

/// Assert that every reference was resolved
#[macro_export]
macro_rules! assert_no_unresolved {
    ($result:expr) => {
        if !$result.unresolved_references.is_empty() {
            let reasons = $result
                .unresolved_references
                .iter()
                .map(|r| format!("  - {} {}: {}", r.reference_type, r.target_path, r.reason))
                .collect::<Vec<_>>()
                .join("\n");
            panic!("Expected no unresolved references, but got:\n{}", reasons);
        }
    };
}

/// Assert that an unresolved reference mentions `pattern`
#[macro_export]
macro_rules! assert_unresolved {
    ($result:expr, $pattern:expr) => {
        let pattern = $pattern;
        let found = $result
            .unresolved_references
            .iter()
            .any(|r| r.reason.contains(pattern) || r.target_path.contains(pattern));
        assert!(
            found,
            "Expected an unresolved reference matching '{}', got {:?}",
            pattern,
            $result.unresolved_references
        );
    };
}
