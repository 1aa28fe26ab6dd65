//! Batch orchestration of the linker and the edge factory.
//!
//! [`EdgeService::create_edges`] turns the nodes and hints of one scan into
//! an [`EdgeCreationResult`]. The only hard failure is an invalid
//! [`EdgeCreationContext`]; a hint that cannot become an edge, for whatever
//! reason, is recorded as an [`UnresolvedReference`] and the batch continues.

mod context;
mod hints;
mod result;

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use context::EdgeCreationContext;
pub use hints::{ConfigNode, DependencyHint, IncludeHint, InputHint, ReferenceType, UnresolvedReference};
pub use result::{EdgeCreationResult, EdgeStatistics};

use hints::Hint;

use crate::constants::{
    DEFAULT_UNRESOLVED_CONFIDENCE_FACTOR, EXPLICIT_DEPENDENCY_CONFIDENCE, EXPLICIT_INCLUDE_CONFIDENCE,
    EXPLICIT_SOURCE_CONFIDENCE, INFERRED_INPUT_CONFIDENCE, UNRESOLVED_TARGET_PREFIX,
};
use crate::edges::{
    DependsOnEdgeOptions, Edge, EdgeFactory, EdgeSourceType, IncludesEdgeOptions, PassesInputEdgeOptions,
    SourcesEdgeOptions,
};
use crate::kit::{Evidence, EvidenceType, IacError, SourceLocation};
use crate::linker::{ResolutionContext, SourceLinker, SourceResolver, SyntheticIdStrategy, SyntheticModuleNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeServiceConfig {
    /// Edges below this confidence are dropped after all categories ran
    pub min_confidence_threshold: u8,
    /// Build edges to `unresolved:{path}` placeholders for unresolved hints
    pub create_edges_for_unresolved: bool,
    /// Multiplier applied to the evidence of placeholder edges
    pub unresolved_confidence_factor: f64,
    pub synthetic_ids: SyntheticIdStrategy,
}

impl Default for EdgeServiceConfig {
    fn default() -> Self {
        EdgeServiceConfig {
            min_confidence_threshold: 0,
            create_edges_for_unresolved: false,
            unresolved_confidence_factor: DEFAULT_UNRESOLVED_CONFIDENCE_FACTOR,
            synthetic_ids: SyntheticIdStrategy::Generated,
        }
    }
}

impl EdgeServiceConfig {
    pub fn with_min_confidence(mut self, threshold: u8) -> Self {
        self.min_confidence_threshold = threshold.min(100);
        self
    }

    pub fn with_unresolved_edges(mut self, enabled: bool) -> Self {
        self.create_edges_for_unresolved = enabled;
        self
    }

    pub fn with_unresolved_confidence_factor(mut self, factor: f64) -> Self {
        self.unresolved_confidence_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_synthetic_ids(mut self, strategy: SyntheticIdStrategy) -> Self {
        self.synthetic_ids = strategy;
        self
    }
}

/// Nodes and hints of one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeBatch {
    pub nodes: Vec<ConfigNode>,
    pub include_hints: Vec<IncludeHint>,
    pub dependency_hints: Vec<DependencyHint>,
    pub input_hints: Vec<InputHint>,
}

#[derive(Clone, Default)]
pub struct EdgeService {
    config: EdgeServiceConfig,
    resolver: Option<Arc<dyn SourceResolver>>,
}

impl std::fmt::Debug for EdgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeService")
            .field("config", &self.config)
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Mutable state of one `create_edges` call
struct Pass<'a> {
    context: &'a EdgeCreationContext,
    factory: EdgeFactory,
    config_paths: IndexMap<&'a str, &'a str>,
    edges: Vec<Edge>,
    synthetic_nodes: Vec<SyntheticModuleNode>,
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> Pass<'a> {
    fn record_unresolved(&mut self, reference_type: ReferenceType, source_id: &str, target_path: &str, reason: String) {
        log::debug!("{} reference from '{}' to '{}' left unresolved: {}", reference_type, source_id, target_path, reason);
        self.unresolved.push(UnresolvedReference::new(reference_type, source_id, target_path, reason));
    }

    /// Folds a factory failure into the reference recorded since `mark`, or
    /// records a new one when the hint had resolved.
    fn record_failure(
        &mut self,
        mark: usize,
        reference_type: ReferenceType,
        source_id: &str,
        target_path: &str,
        error: IacError,
    ) {
        match self.unresolved.get_mut(mark) {
            Some(existing) => {
                log::debug!("placeholder {} edge from '{}' rejected: {}", reference_type, source_id, error);
                existing.reason = error.to_string();
            }
            None => self.record_unresolved(reference_type, source_id, target_path, error.to_string()),
        }
    }

    /// Location used when a hint carries neither evidence nor a location
    fn fallback_location(&self, node_id: &str) -> SourceLocation {
        let file = self
            .config_paths
            .get(node_id)
            .copied()
            .filter(|path| !path.trim().is_empty())
            .unwrap_or(node_id);
        SourceLocation::line(file, 1)
    }

    fn evidence_for<H: Hint>(
        &self,
        hint: &H,
        confidence: i64,
        evidence_type: EvidenceType,
        description: String,
    ) -> Vec<Evidence> {
        if !hint.evidence().is_empty() {
            return hint.evidence().to_vec();
        }
        let location = hint
            .location()
            .cloned()
            .unwrap_or_else(|| self.fallback_location(hint.source_id()));
        vec![Evidence::builder(location)
            .confidence(confidence)
            .evidence_type(evidence_type)
            .description(description)
            .build()]
    }
}

impl EdgeService {
    pub fn new(config: EdgeServiceConfig) -> Self {
        EdgeService { config, resolver: None }
    }

    /// Replaces the built-in [`SourceLinker`]
    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &EdgeServiceConfig {
        &self.config
    }

    pub fn create_edges(
        &self,
        batch: &EdgeBatch,
        context: &EdgeCreationContext,
    ) -> Result<EdgeCreationResult, IacError> {
        context.validate()?;
        let started = Instant::now();

        let mut pass = Pass {
            context,
            factory: EdgeFactory::new(context.id_generator.clone()),
            config_paths: batch.nodes.iter().map(|n| (n.id.as_str(), n.config_path.as_str())).collect(),
            edges: Vec::new(),
            synthetic_nodes: Vec::new(),
            unresolved: Vec::new(),
        };

        self.create_include_edges(&mut pass, &batch.include_hints);
        self.create_dependency_edges(&mut pass, &batch.dependency_hints);
        self.create_input_edges(&mut pass, &batch.input_hints);
        self.create_source_edges(&mut pass, &batch.nodes);

        let Pass { mut edges, mut synthetic_nodes, unresolved, .. } = pass;

        let before = edges.len();
        let threshold = self.config.min_confidence_threshold;
        edges.retain(|edge| edge.confidence() >= threshold);
        let filtered_out = before - edges.len();
        if filtered_out > 0 {
            log::debug!("{} edges fell below the confidence threshold of {}", filtered_out, threshold);
            // A synthetic node only exists as the target of its `sources` edges
            synthetic_nodes.retain(|node| edges.iter().any(|edge| edge.target() == node.id));
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let statistics = EdgeStatistics::compute(&edges, &synthetic_nodes, &unresolved, filtered_out, duration_ms);
        log::debug!(
            "scan '{}': {} edges, {} synthetic nodes, {} unresolved references",
            context.scan_id,
            statistics.total_edges,
            statistics.synthetic_node_count,
            statistics.unresolved_count
        );

        Ok(EdgeCreationResult { edges, synthetic_nodes, unresolved_references: unresolved, statistics })
    }

    /// Target for an unresolved hint, or `None` when the hint is skipped.
    /// Records the unresolved reference either way.
    fn unresolved_target<H: Hint>(&self, pass: &mut Pass<'_>, hint: &H, reference_type: ReferenceType) -> Option<String> {
        let target_path = if hint.target_path().trim().is_empty() {
            hint.target_id().unwrap_or_default()
        } else {
            hint.target_path()
        };
        let reason = if hint.resolved() {
            format!("{} hint is marked resolved but has no target node", reference_type)
        } else {
            format!("{} target '{}' could not be resolved", reference_type, target_path)
        };
        pass.record_unresolved(reference_type, hint.source_id(), target_path, reason);

        if !self.config.create_edges_for_unresolved {
            return None;
        }
        Some(format!("{}{}", UNRESOLVED_TARGET_PREFIX, target_path))
    }

    fn scale(&self, evidence: Vec<Evidence>) -> Vec<Evidence> {
        evidence.iter().map(|e| e.scaled(self.config.unresolved_confidence_factor)).collect()
    }

    fn create_include_edges(&self, pass: &mut Pass<'_>, hints: &[IncludeHint]) {
        for hint in hints {
            let mark = pass.unresolved.len();
            let evidence = pass.evidence_for(
                hint,
                EXPLICIT_INCLUDE_CONFIDENCE,
                EvidenceType::Explicit,
                format!("include block '{}'", hint.include_name),
            );
            let (target, evidence) = match hint.resolved_target() {
                Some(target) => (target.to_string(), evidence),
                None => match self.unresolved_target(pass, hint, ReferenceType::Include) {
                    Some(target) => (target, self.scale(evidence)),
                    None => continue,
                },
            };

            let options = IncludesEdgeOptions {
                source_node_id: hint.source_id.clone(),
                target_node_id: target,
                scan_id: pass.context.scan_id.clone(),
                include_name: hint.include_name.clone(),
                merge_strategy: hint.merge_strategy.clone(),
                expose: hint.expose,
                include_path: Some(hint.target_path.clone()).filter(|p| !p.is_empty()),
            };
            match pass.factory.create_includes_edge(options, evidence) {
                Ok(edge) => pass.edges.push(edge),
                Err(e) => pass.record_failure(mark, ReferenceType::Include, &hint.source_id, &hint.target_path, e),
            }
        }
    }

    fn create_dependency_edges(&self, pass: &mut Pass<'_>, hints: &[DependencyHint]) {
        for hint in hints {
            let mark = pass.unresolved.len();
            let evidence = pass.evidence_for(
                hint,
                EXPLICIT_DEPENDENCY_CONFIDENCE,
                EvidenceType::Explicit,
                format!("dependency block '{}'", hint.dependency_name),
            );
            let (target, evidence) = match hint.resolved_target() {
                Some(target) => (target.to_string(), evidence),
                None => match self.unresolved_target(pass, hint, ReferenceType::Dependency) {
                    Some(target) => (target, self.scale(evidence)),
                    None => continue,
                },
            };

            let options = DependsOnEdgeOptions {
                source_node_id: hint.source_id.clone(),
                target_node_id: target,
                scan_id: pass.context.scan_id.clone(),
                dependency_name: hint.dependency_name.clone(),
                config_path: Some(hint.target_path.clone()).filter(|p| !p.is_empty()),
                skip_outputs: hint.skip_outputs,
                has_mock_outputs: hint.has_mock_outputs,
                outputs_consumed: hint.outputs_consumed.clone(),
            };
            match pass.factory.create_depends_on_edge(options, evidence) {
                Ok(edge) => pass.edges.push(edge),
                Err(e) => pass.record_failure(mark, ReferenceType::Dependency, &hint.source_id, &hint.target_path, e),
            }
        }
    }

    fn create_input_edges(&self, pass: &mut Pass<'_>, hints: &[InputHint]) {
        for hint in hints {
            let mark = pass.unresolved.len();
            let evidence = pass.evidence_for(
                hint,
                INFERRED_INPUT_CONFIDENCE,
                EvidenceType::Inferred,
                format!("input '{}' reads '{}'", hint.input_name, hint.expression),
            );
            let (target, evidence) = match hint.resolved_target() {
                Some(target) => (target.to_string(), evidence),
                None => match self.unresolved_target(pass, hint, ReferenceType::Input) {
                    Some(target) => (target, self.scale(evidence)),
                    None => continue,
                },
            };

            let options = PassesInputEdgeOptions {
                source_node_id: hint.source_id.clone(),
                target_node_id: target,
                scan_id: pass.context.scan_id.clone(),
                input_name: hint.input_name.clone(),
                expression: hint.expression.clone(),
                dependency_name: hint.dependency_name.clone(),
                output_name: hint.output_name.clone(),
            };
            match pass.factory.create_passes_input_edge(options, evidence) {
                Ok(edge) => pass.edges.push(edge),
                Err(e) => pass.record_failure(mark, ReferenceType::Input, &hint.source_id, &hint.target_path, e),
            }
        }
    }

    fn create_source_edges(&self, pass: &mut Pass<'_>, nodes: &[ConfigNode]) {
        let context = pass.context;
        let linker;
        let resolver: &dyn SourceResolver = match &self.resolver {
            Some(resolver) => resolver.as_ref(),
            None => {
                linker = SourceLinker::new(context.id_generator.clone())
                    .with_synthetic_ids(self.config.synthetic_ids);
                &linker
            }
        };

        for node in nodes {
            let Some(raw) = node.source.as_deref() else {
                continue;
            };
            if raw.trim().is_empty() {
                pass.record_unresolved(ReferenceType::Source, &node.id, raw, "module source is empty".to_string());
                continue;
            }

            let expression = resolver.parse(raw);
            let resolution_context = ResolutionContext {
                scan_id: &context.scan_id,
                tenant_id: &context.tenant_id,
                config_path: &node.config_path,
                repository_root: &context.repository_root,
                existing_modules: &context.existing_modules,
            };
            let resolution = match resolver.resolve_source(&expression, &resolution_context) {
                Ok(resolution) if resolution.success => resolution,
                Ok(resolution) => {
                    let reason = resolution.error.unwrap_or_else(|| "source could not be resolved".to_string());
                    pass.record_unresolved(ReferenceType::Source, &node.id, raw, reason);
                    continue;
                }
                Err(e) => {
                    log::warn!("source resolver failed for '{}' in node '{}': {}", raw, node.id, e);
                    pass.record_unresolved(ReferenceType::Source, &node.id, raw, e.to_string());
                    continue;
                }
            };

            let evidence = if node.source_evidence.is_empty() {
                let location = node.source_location.clone().unwrap_or_else(|| pass.fallback_location(&node.id));
                vec![Evidence::builder(location)
                    .snippet(format!("source = \"{}\"", raw))
                    .confidence(EXPLICIT_SOURCE_CONFIDENCE)
                    .evidence_type(EvidenceType::Explicit)
                    .description("module source attribute")
                    .build()]
            } else {
                node.source_evidence.clone()
            };

            let options = SourcesEdgeOptions {
                source_node_id: node.id.clone(),
                target_node_id: resolution.target_node_id.clone(),
                scan_id: context.scan_id.clone(),
                source_type: EdgeSourceType::from(resolution.source_type).to_string(),
                source_expression: expression.raw.clone(),
                version_constraint: expression.version.clone(),
                git_ref: expression.git_ref.clone(),
                subdir: expression.subdir.clone(),
                is_synthetic_target: resolution.is_synthetic,
            };
            match pass.factory.create_sources_edge(options, evidence) {
                Ok(edge) => {
                    pass.edges.push(edge);
                    if let Some(synthetic) = resolution.synthetic_node {
                        if !pass.synthetic_nodes.iter().any(|existing| existing.id == synthetic.id) {
                            pass.synthetic_nodes.push(synthetic);
                        }
                    }
                }
                Err(e) => pass.record_unresolved(ReferenceType::Source, &node.id, raw, e.to_string()),
            }
        }
    }
}
