//! Canned scans shared by the integration tests.

use std::collections::HashSet;
use std::sync::Arc;

use iaclink_core::kit::{IacError, SequentialIdGenerator};
use iaclink_core::{
    IncludeHint, ResolutionContext, ResolutionResult, SourceExpression, SourceLinker, SourceResolver,
};

use crate::builders::BatchBuilder;

/// A three-node stack under `/repo`: `vpc` and `app` include `root`, `app`
/// depends on `vpc`, and both declare local module sources. With
/// `scanned_modules` the two module directories are known to the scan,
/// otherwise the linker has to synthesize them.
pub fn terragrunt_stack(scanned_modules: bool) -> BatchBuilder {
    let builder = BatchBuilder::new("scan-demo", "/repo")
        .tenant("tenant-demo")
        .node("root", "root.hcl")
        .module("vpc", "vpc.hcl", "./modules/vpc")
        .module("app", "app.hcl", "./modules/app")
        .include("vpc", "root")
        .include_hint(IncludeHint {
            source_id: "app".to_string(),
            target_id: Some("root".to_string()),
            target_path: "root.hcl".to_string(),
            resolved: true,
            include_name: "root".to_string(),
            merge_strategy: Some("deep".to_string()),
            expose: true,
            ..Default::default()
        })
        .dependency("app", "vpc");

    if scanned_modules {
        builder.existing_module("modules/vpc", "mod-vpc").existing_module("/repo/modules/app", "mod-app")
    } else {
        builder
    }
}

/// Resolver that fails on chosen raw sources and otherwise behaves like
/// the default linker.
#[derive(Debug)]
pub struct FailingResolver {
    linker: SourceLinker,
    failing: HashSet<String>,
}

impl FailingResolver {
    pub fn new<I, S>(failing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FailingResolver {
            linker: SourceLinker::new(Arc::new(SequentialIdGenerator::new("synthetic"))),
            failing: failing.into_iter().map(Into::into).collect(),
        }
    }
}

impl SourceResolver for FailingResolver {
    fn resolve_source(
        &self,
        expression: &SourceExpression,
        context: &ResolutionContext<'_>,
    ) -> Result<ResolutionResult, IacError> {
        if self.failing.contains(&expression.raw) {
            return Err(IacError::resolver_failure(expression.raw.clone(), "registry unreachable"));
        }
        self.linker.resolve_source(expression, context)
    }
}
