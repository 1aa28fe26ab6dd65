//! Fluent builders for edge batches.
//!
//! Tests describe a scan as nodes plus hints and run it through the
//! [`EdgeService`] in one expression:
//!
//! ```rust,ignore
//! let result = BatchBuilder::new("scan-1", "/repo")
//!     .node("app", "live/app/terragrunt.hcl")
//!     .node("root", "root.hcl")
//!     .include("app", "root")
//!     .run()?;
//! ```

use std::sync::Arc;

use iaclink_core::kit::{Evidence, EvidenceType, IacError, IdGenerator, SequentialIdGenerator, SourceLocation};
use iaclink_core::{
    ConfigNode, DependencyHint, EdgeBatch, EdgeCreationContext, EdgeCreationResult, EdgeService,
    EdgeServiceConfig, IncludeHint, InputHint, SourceResolver,
};

/// Evidence at line 1 of `file`, built through the clamping builder
pub fn evidence(file: &str, confidence: i64, evidence_type: EvidenceType) -> Evidence {
    Evidence::builder(SourceLocation::line(file, 1))
        .confidence(confidence)
        .evidence_type(evidence_type)
        .description(format!("{} evidence", evidence_type))
        .build()
}

pub struct BatchBuilder {
    scan_id: String,
    tenant_id: String,
    repository_root: String,
    batch: EdgeBatch,
    existing_modules: Vec<(String, String)>,
    config: EdgeServiceConfig,
    resolver: Option<Arc<dyn SourceResolver>>,
    sequential_ids: bool,
}

impl BatchBuilder {
    pub fn new(scan_id: &str, repository_root: &str) -> Self {
        Self {
            scan_id: scan_id.to_string(),
            tenant_id: "tenant-test".to_string(),
            repository_root: repository_root.to_string(),
            batch: EdgeBatch::default(),
            existing_modules: Vec::new(),
            config: EdgeServiceConfig::default(),
            resolver: None,
            sequential_ids: false,
        }
    }

    pub fn tenant(mut self, tenant_id: &str) -> Self {
        self.tenant_id = tenant_id.to_string();
        self
    }

    /// Add a configuration node without a module source
    pub fn node(mut self, id: &str, config_path: &str) -> Self {
        self.batch.nodes.push(ConfigNode::new(id, config_path));
        self
    }

    /// Add a configuration node that declares `terraform { source = ... }`
    pub fn module(mut self, id: &str, config_path: &str, source: &str) -> Self {
        self.batch.nodes.push(ConfigNode::new(id, config_path).with_source(source));
        self
    }

    /// Register a module directory the scan already produced a node for
    pub fn existing_module(mut self, path: &str, node_id: &str) -> Self {
        self.existing_modules.push((path.to_string(), node_id.to_string()));
        self
    }

    /// Resolved include from `source` to `target`
    pub fn include(mut self, source: &str, target: &str) -> Self {
        let hint = IncludeHint {
            source_id: source.to_string(),
            target_id: Some(target.to_string()),
            target_path: format!("{}.hcl", target),
            resolved: true,
            include_name: target.to_string(),
            ..Default::default()
        };
        self.batch.include_hints.push(hint);
        self
    }

    /// Escape hatch for includes that need a merge strategy, evidence, etc.
    pub fn include_hint(mut self, hint: IncludeHint) -> Self {
        self.batch.include_hints.push(hint);
        self
    }

    pub fn unresolved_include(mut self, source: &str, target_path: &str) -> Self {
        let hint = IncludeHint {
            source_id: source.to_string(),
            target_path: target_path.to_string(),
            include_name: "root".to_string(),
            ..Default::default()
        };
        self.batch.include_hints.push(hint);
        self
    }

    /// Resolved dependency from `source` to `target`, named after the target
    pub fn dependency(mut self, source: &str, target: &str) -> Self {
        let hint = DependencyHint {
            source_id: source.to_string(),
            target_id: Some(target.to_string()),
            target_path: format!("../{}", target),
            resolved: true,
            dependency_name: target.to_string(),
            ..Default::default()
        };
        self.batch.dependency_hints.push(hint);
        self
    }

    pub fn dependency_hint(mut self, hint: DependencyHint) -> Self {
        self.batch.dependency_hints.push(hint);
        self
    }

    pub fn unresolved_dependency(mut self, source: &str, name: &str, target_path: &str) -> Self {
        let hint = DependencyHint {
            source_id: source.to_string(),
            target_path: target_path.to_string(),
            dependency_name: name.to_string(),
            ..Default::default()
        };
        self.batch.dependency_hints.push(hint);
        self
    }

    /// Input `name` of `source` fed by `dependency.{target}.outputs.{output}`
    pub fn input(mut self, source: &str, target: &str, name: &str, output: &str) -> Self {
        let hint = InputHint {
            source_id: source.to_string(),
            target_id: Some(target.to_string()),
            target_path: format!("../{}", target),
            resolved: true,
            input_name: name.to_string(),
            expression: format!("dependency.{}.outputs.{}", target, output),
            dependency_name: Some(target.to_string()),
            output_name: Some(output.to_string()),
            ..Default::default()
        };
        self.batch.input_hints.push(hint);
        self
    }

    pub fn config(mut self, config: EdgeServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Mint ids as `{scan_id}-1`, `{scan_id}-2`, ... restarting on every run
    pub fn sequential_ids(mut self) -> Self {
        self.sequential_ids = true;
        self
    }

    pub fn context(&self) -> EdgeCreationContext {
        let mut context = EdgeCreationContext::new(&self.scan_id, &self.tenant_id, &self.repository_root);
        for (path, node_id) in &self.existing_modules {
            context = context.with_existing_module(path.as_str(), node_id.as_str());
        }
        if self.sequential_ids {
            let generator: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new(self.scan_id.as_str()));
            context.with_id_generator(generator)
        } else {
            context
        }
    }

    pub fn batch(&self) -> &EdgeBatch {
        &self.batch
    }

    pub fn service(&self) -> EdgeService {
        let service = EdgeService::new(self.config.clone());
        match &self.resolver {
            Some(resolver) => service.with_resolver(resolver.clone()),
            None => service,
        }
    }

    /// Run the batch through a fresh [`EdgeService`]
    pub fn run(&self) -> Result<EdgeCreationResult, IacError> {
        self.service().create_edges(&self.batch, &self.context())
    }
}
