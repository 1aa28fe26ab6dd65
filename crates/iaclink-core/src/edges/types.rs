use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::kit::{Evidence, EvidenceType, SourceLocation};
use crate::linker::SourceType;

/// Closed set of edge tags shared with the persistence layer
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EdgeType {
    Includes,
    DependsOn,
    PassesInput,
    Sources,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MergeStrategy {
    NoMerge,
    #[default]
    Shallow,
    Deep,
}

/// Source taxonomy of `sources` edges. GitHub shorthands are folded into
/// [`EdgeSourceType::Git`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EdgeSourceType {
    Local,
    Registry,
    Git,
    S3,
    Gcs,
    Http,
    Unknown,
}

impl From<SourceType> for EdgeSourceType {
    fn from(source_type: SourceType) -> Self {
        match source_type {
            SourceType::Local => EdgeSourceType::Local,
            SourceType::Registry => EdgeSourceType::Registry,
            SourceType::Git | SourceType::Github => EdgeSourceType::Git,
            SourceType::S3 => EdgeSourceType::S3,
            SourceType::Gcs => EdgeSourceType::Gcs,
            SourceType::Http => EdgeSourceType::Http,
            SourceType::Unknown => EdgeSourceType::Unknown,
        }
    }
}

/// Evidence vocabulary exposed in edge metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidenceKind {
    Explicit,
    Semantic,
    Heuristic,
}

impl From<EvidenceType> for EvidenceKind {
    fn from(evidence_type: EvidenceType) -> Self {
        match evidence_type {
            EvidenceType::Explicit => EvidenceKind::Explicit,
            EvidenceType::Inferred => EvidenceKind::Semantic,
            EvidenceType::Heuristic => EvidenceKind::Heuristic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSummary {
    pub kind: EvidenceKind,
    pub description: String,
    pub confidence: u8,
    pub location: SourceLocation,
}

impl From<&Evidence> for EvidenceSummary {
    fn from(evidence: &Evidence) -> Self {
        EvidenceSummary {
            kind: evidence.evidence_type().into(),
            description: evidence.description().to_string(),
            confidence: evidence.confidence(),
            location: evidence.location().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    /// Location of the first evidence item
    pub location: SourceLocation,
    /// True when no evidence item is explicit
    pub implicit: bool,
    pub evidence: Vec<EvidenceSummary>,
}

/// Per-variant payload, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EdgeKind {
    Includes {
        include_name: String,
        merge_strategy: MergeStrategy,
        expose: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include_path: Option<String>,
    },
    DependsOn {
        dependency_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config_path: Option<String>,
        skip_outputs: bool,
        has_mock_outputs: bool,
        #[serde(default)]
        outputs_consumed: Vec<String>,
    },
    PassesInput {
        input_name: String,
        expression: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dependency_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_name: Option<String>,
    },
    Sources {
        source_type: EdgeSourceType,
        source_expression: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version_constraint: Option<String>,
        #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
        git_ref: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subdir: Option<String>,
        is_synthetic_target: bool,
    },
}

impl EdgeKind {
    pub fn edge_type(&self) -> EdgeType {
        match self {
            EdgeKind::Includes { .. } => EdgeType::Includes,
            EdgeKind::DependsOn { .. } => EdgeType::DependsOn,
            EdgeKind::PassesInput { .. } => EdgeType::PassesInput,
            EdgeKind::Sources { .. } => EdgeType::Sources,
        }
    }

    /// Deterministic label built from the discriminating field
    pub fn label(&self) -> String {
        match self {
            EdgeKind::Includes { include_name, .. } => format!("includes:{}", include_name),
            EdgeKind::DependsOn { dependency_name, .. } => format!("depends_on:{}", dependency_name),
            EdgeKind::PassesInput { input_name, .. } => format!("passes:{}", input_name),
            EdgeKind::Sources { source_type, .. } => format!("sources:{}", source_type),
        }
    }
}

/// A validated relationship between two graph nodes.
///
/// Only [`crate::edges::EdgeFactory`] builds edges; the fields are read
/// through accessors so an edge cannot drift from its validated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    id: String,
    source: String,
    target: String,
    label: String,
    metadata: EdgeMetadata,
    scan_id: String,
    confidence: u8,
    evidence: Vec<Evidence>,
    #[serde(flatten)]
    kind: EdgeKind,
}

impl Edge {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        source: String,
        target: String,
        scan_id: String,
        confidence: u8,
        metadata: EdgeMetadata,
        evidence: Vec<Evidence>,
        kind: EdgeKind,
    ) -> Self {
        Edge { id, source, target, label: kind.label(), metadata, scan_id, confidence, evidence, kind }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn edge_type(&self) -> EdgeType {
        self.kind.edge_type()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn metadata(&self) -> &EdgeMetadata {
        &self.metadata
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn kind(&self) -> &EdgeKind {
        &self.kind
    }

    pub fn source_type(&self) -> Option<EdgeSourceType> {
        match &self.kind {
            EdgeKind::Sources { source_type, .. } => Some(*source_type),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_edge_type_tags() {
        let tags: Vec<String> = EdgeType::iter().map(|t| t.to_string()).collect();
        assert_eq!(tags, vec!["includes", "depends_on", "passes_input", "sources"]);
        for edge_type in EdgeType::iter() {
            let json = serde_json::to_string(&edge_type).unwrap();
            assert_eq!(serde_json::from_str::<EdgeType>(&json).unwrap(), edge_type);
        }
    }

    #[test]
    fn test_github_folds_into_git() {
        assert_eq!(EdgeSourceType::from(SourceType::Github), EdgeSourceType::Git);
        assert_eq!(EdgeSourceType::iter().count(), 7);
    }

    #[test]
    fn test_labels() {
        let kind = EdgeKind::Sources {
            source_type: EdgeSourceType::Registry,
            source_expression: "hashicorp/consul/aws".into(),
            version_constraint: None,
            git_ref: None,
            subdir: None,
            is_synthetic_target: true,
        };
        assert_eq!(kind.label(), "sources:registry");

        let kind = EdgeKind::PassesInput {
            input_name: "vpc_id".into(),
            expression: "dependency.vpc.outputs.vpc_id".into(),
            dependency_name: Some("vpc".into()),
            output_name: Some("vpc_id".into()),
        };
        assert_eq!(kind.label(), "passes:vpc_id");
        assert_eq!(kind.edge_type(), EdgeType::PassesInput);
    }

    #[test]
    fn test_merge_strategy_parsing() {
        assert_eq!("no_merge".parse::<MergeStrategy>(), Ok(MergeStrategy::NoMerge));
        assert!("wide".parse::<MergeStrategy>().is_err());
    }
}
