//! Validated construction of the four edge variants.
//!
//! Every constructor runs the same pipeline: validation, confidence
//! aggregation, metadata assembly and id minting. Validation failures are
//! returned as recoverable [`IacError`]s from the edge category carrying the
//! offending field, what was expected, what was found and the edge ids.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::confidence::aggregate;
use crate::kit::types::ErrorCode;
use crate::kit::{Evidence, IacError, IdGenerator, UuidGenerator};

use super::types::{Edge, EdgeKind, EdgeMetadata, EdgeSourceType, EdgeType, EvidenceSummary, MergeStrategy};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludesEdgeOptions {
    pub source_node_id: String,
    pub target_node_id: String,
    pub scan_id: String,
    pub include_name: String,
    /// `no_merge`, `shallow` or `deep`; unset means `shallow`
    #[serde(default)]
    pub merge_strategy: Option<String>,
    #[serde(default)]
    pub expose: bool,
    #[serde(default)]
    pub include_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependsOnEdgeOptions {
    pub source_node_id: String,
    pub target_node_id: String,
    pub scan_id: String,
    pub dependency_name: String,
    #[serde(default)]
    pub config_path: Option<String>,
    #[serde(default)]
    pub skip_outputs: bool,
    #[serde(default)]
    pub has_mock_outputs: bool,
    #[serde(default)]
    pub outputs_consumed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassesInputEdgeOptions {
    pub source_node_id: String,
    pub target_node_id: String,
    pub scan_id: String,
    pub input_name: String,
    pub expression: String,
    #[serde(default)]
    pub dependency_name: Option<String>,
    #[serde(default)]
    pub output_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesEdgeOptions {
    pub source_node_id: String,
    pub target_node_id: String,
    pub scan_id: String,
    /// One of the seven edge source types
    pub source_type: String,
    pub source_expression: String,
    #[serde(default)]
    pub version_constraint: Option<String>,
    #[serde(default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub subdir: Option<String>,
    #[serde(default)]
    pub is_synthetic_target: bool,
}

struct Endpoints<'a> {
    edge_type: EdgeType,
    source: &'a str,
    target: &'a str,
    scan_id: &'a str,
}

impl Endpoints<'_> {
    fn field_error(&self, code: ErrorCode, field: &str, expected: &str, actual: impl Into<String>) -> IacError {
        IacError::invalid_field(code, field, expected, actual)
            .with_context("edgeType", self.edge_type.to_string())
            .with_context("sourceNodeId", self.source)
            .with_context("targetNodeId", self.target)
    }

    fn require(&self, field: &str, value: &str) -> Result<(), IacError> {
        if value.trim().is_empty() {
            return Err(self.field_error(ErrorCode::MissingEdgeField, field, "a non-empty string", "an empty string"));
        }
        Ok(())
    }

    fn validate(&self, evidence: &[Evidence]) -> Result<(), IacError> {
        self.require("sourceNodeId", self.source)?;
        self.require("targetNodeId", self.target)?;
        self.require("scanId", self.scan_id)?;

        if self.source == self.target {
            return Err(self
                .field_error(
                    ErrorCode::SelfReferentialEdge,
                    "targetNodeId",
                    "a node different from the source",
                    format!("'{}'", self.target),
                ));
        }

        if evidence.is_empty() {
            return Err(self.field_error(
                ErrorCode::InvalidEvidence,
                "evidence",
                "at least one evidence item",
                "an empty list",
            ));
        }
        for (index, item) in evidence.iter().enumerate() {
            if let Err(e) = item.validate() {
                return Err(self
                    .field_error(ErrorCode::InvalidEvidence, &format!("evidence[{}]", index), "valid evidence", e.to_string())
                    .with_location(item.location().clone()));
            }
        }
        Ok(())
    }

    fn parse_enum<T: FromStr>(&self, field: &str, allowed: &str, value: &str) -> Result<T, IacError> {
        T::from_str(value.trim()).map_err(|_| {
            self.field_error(ErrorCode::InvalidEdgeOption, field, &format!("one of {}", allowed), format!("'{}'", value))
        })
    }
}

#[derive(Debug, Clone)]
pub struct EdgeFactory {
    id_generator: Arc<dyn IdGenerator>,
}

impl Default for EdgeFactory {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl EdgeFactory {
    pub fn new(id_generator: Arc<dyn IdGenerator>) -> Self {
        EdgeFactory { id_generator }
    }

    pub fn create_includes_edge(
        &self,
        options: IncludesEdgeOptions,
        evidence: Vec<Evidence>,
    ) -> Result<Edge, IacError> {
        let endpoints = Endpoints {
            edge_type: EdgeType::Includes,
            source: &options.source_node_id,
            target: &options.target_node_id,
            scan_id: &options.scan_id,
        };
        endpoints.validate(&evidence)?;
        endpoints.require("includeName", &options.include_name)?;
        let merge_strategy = match options.merge_strategy.as_deref() {
            None => MergeStrategy::default(),
            Some(value) => endpoints.parse_enum("mergeStrategy", "no_merge, shallow, deep", value)?,
        };

        let kind = EdgeKind::Includes {
            include_name: options.include_name.clone(),
            merge_strategy,
            expose: options.expose,
            include_path: options.include_path.clone(),
        };
        Ok(self.assemble(options.source_node_id, options.target_node_id, options.scan_id, evidence, kind))
    }

    pub fn create_depends_on_edge(
        &self,
        options: DependsOnEdgeOptions,
        evidence: Vec<Evidence>,
    ) -> Result<Edge, IacError> {
        let endpoints = Endpoints {
            edge_type: EdgeType::DependsOn,
            source: &options.source_node_id,
            target: &options.target_node_id,
            scan_id: &options.scan_id,
        };
        endpoints.validate(&evidence)?;
        endpoints.require("dependencyName", &options.dependency_name)?;

        let kind = EdgeKind::DependsOn {
            dependency_name: options.dependency_name.clone(),
            config_path: options.config_path.clone(),
            skip_outputs: options.skip_outputs,
            has_mock_outputs: options.has_mock_outputs,
            outputs_consumed: options.outputs_consumed.clone(),
        };
        Ok(self.assemble(options.source_node_id, options.target_node_id, options.scan_id, evidence, kind))
    }

    pub fn create_passes_input_edge(
        &self,
        options: PassesInputEdgeOptions,
        evidence: Vec<Evidence>,
    ) -> Result<Edge, IacError> {
        let endpoints = Endpoints {
            edge_type: EdgeType::PassesInput,
            source: &options.source_node_id,
            target: &options.target_node_id,
            scan_id: &options.scan_id,
        };
        endpoints.validate(&evidence)?;
        endpoints.require("inputName", &options.input_name)?;
        endpoints.require("expression", &options.expression)?;

        let kind = EdgeKind::PassesInput {
            input_name: options.input_name.clone(),
            expression: options.expression.clone(),
            dependency_name: options.dependency_name.clone(),
            output_name: options.output_name.clone(),
        };
        Ok(self.assemble(options.source_node_id, options.target_node_id, options.scan_id, evidence, kind))
    }

    pub fn create_sources_edge(
        &self,
        options: SourcesEdgeOptions,
        evidence: Vec<Evidence>,
    ) -> Result<Edge, IacError> {
        let endpoints = Endpoints {
            edge_type: EdgeType::Sources,
            source: &options.source_node_id,
            target: &options.target_node_id,
            scan_id: &options.scan_id,
        };
        endpoints.validate(&evidence)?;
        endpoints.require("sourceExpression", &options.source_expression)?;
        let source_type: EdgeSourceType = endpoints.parse_enum(
            "sourceType",
            "local, registry, git, s3, gcs, http, unknown",
            &options.source_type,
        )?;

        let kind = EdgeKind::Sources {
            source_type,
            source_expression: options.source_expression.clone(),
            version_constraint: options.version_constraint.clone(),
            git_ref: options.git_ref.clone(),
            subdir: options.subdir.clone(),
            is_synthetic_target: options.is_synthetic_target,
        };
        Ok(self.assemble(options.source_node_id, options.target_node_id, options.scan_id, evidence, kind))
    }

    fn assemble(
        &self,
        source: String,
        target: String,
        scan_id: String,
        evidence: Vec<Evidence>,
        kind: EdgeKind,
    ) -> Edge {
        let confidence = aggregate(&evidence);
        let metadata = EdgeMetadata {
            // validation guarantees at least one item
            location: evidence[0].location().clone(),
            implicit: !evidence.iter().any(Evidence::is_explicit),
            evidence: evidence.iter().map(EvidenceSummary::from).collect(),
        };
        Edge::new(self.id_generator.next_id(), source, target, scan_id, confidence, metadata, evidence, kind)
    }
}
