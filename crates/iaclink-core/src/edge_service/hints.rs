//! Inputs handed over by upstream detectors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::kit::{Evidence, SourceLocation};

/// A configuration file turned into a graph node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNode {
    pub id: String,
    /// Path of the configuration file, used to anchor relative module sources
    pub config_path: String,
    /// Raw `source` attribute of the `terraform` block or `module` call
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_location: Option<SourceLocation>,
    #[serde(default)]
    pub source_evidence: Vec<Evidence>,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

impl ConfigNode {
    pub fn new(id: impl Into<String>, config_path: impl Into<String>) -> Self {
        ConfigNode { id: id.into(), config_path: config_path.into(), ..Default::default() }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// An `include` block, resolved or not by the include pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeHint {
    pub source_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub resolved: bool,
    pub include_name: String,
    #[serde(default)]
    pub merge_strategy: Option<String>,
    #[serde(default)]
    pub expose: bool,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// A `dependency` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyHint {
    pub source_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub resolved: bool,
    pub dependency_name: String,
    #[serde(default)]
    pub skip_outputs: bool,
    #[serde(default)]
    pub has_mock_outputs: bool,
    #[serde(default)]
    pub outputs_consumed: Vec<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// An `inputs` entry wired to another configuration's output, e.g.
/// `vpc_id = dependency.vpc.outputs.vpc_id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputHint {
    pub source_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub resolved: bool,
    pub input_name: String,
    pub expression: String,
    #[serde(default)]
    pub dependency_name: Option<String>,
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Common view over the three hint shapes
pub(crate) trait Hint {
    fn source_id(&self) -> &str;
    fn target_id(&self) -> Option<&str>;
    fn target_path(&self) -> &str;
    fn resolved(&self) -> bool;
    fn location(&self) -> Option<&SourceLocation>;
    fn evidence(&self) -> &[Evidence];

    /// Target of a resolved hint; `None` sends the hint down the unresolved path.
    fn resolved_target(&self) -> Option<&str> {
        if !self.resolved() {
            return None;
        }
        self.target_id().filter(|id| !id.trim().is_empty())
    }
}

macro_rules! impl_hint {
    ($($hint:ty),*) => {
        $(impl Hint for $hint {
            fn source_id(&self) -> &str {
                &self.source_id
            }
            fn target_id(&self) -> Option<&str> {
                self.target_id.as_deref()
            }
            fn target_path(&self) -> &str {
                &self.target_path
            }
            fn resolved(&self) -> bool {
                self.resolved
            }
            fn location(&self) -> Option<&SourceLocation> {
                self.location.as_ref()
            }
            fn evidence(&self) -> &[Evidence] {
                &self.evidence
            }
        })*
    };
}

impl_hint!(IncludeHint, DependencyHint, InputHint);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceType {
    Include,
    Dependency,
    Input,
    Source,
}

/// Everything the batch could not turn into an edge, with a readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedReference {
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub source_node_id: String,
    pub target_path: String,
    pub reason: String,
}

impl UnresolvedReference {
    pub fn new(
        reference_type: ReferenceType,
        source_node_id: impl Into<String>,
        target_path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        UnresolvedReference {
            reference_type,
            source_node_id: source_node_id.into(),
            target_path: target_path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_target() {
        let mut hint = DependencyHint {
            source_id: "app".into(),
            target_id: Some("vpc".into()),
            resolved: true,
            dependency_name: "vpc".into(),
            ..Default::default()
        };
        assert_eq!(hint.resolved_target(), Some("vpc"));

        hint.resolved = false;
        assert_eq!(hint.resolved_target(), None);

        hint.resolved = true;
        hint.target_id = Some("  ".into());
        assert_eq!(hint.resolved_target(), None);
    }

    #[test]
    fn test_hint_from_json() {
        let raw = r#"{
            "sourceId": "app",
            "targetId": null,
            "targetPath": "../root.hcl",
            "resolved": false,
            "includeName": "root"
        }"#;
        let hint: IncludeHint = serde_json::from_str(raw).unwrap();
        assert_eq!(hint.target_id, None);
        assert!(hint.evidence.is_empty());
        assert_eq!(hint.merge_strategy, None);
    }

    #[test]
    fn test_unresolved_reference_shape() {
        let reference = UnresolvedReference::new(ReferenceType::Source, "app", "./modules/x", "no path");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["type"], "source");
        assert_eq!(json["sourceNodeId"], "app");
    }
}
