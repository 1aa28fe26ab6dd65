//! Include, dependency, function and reference strategies: record the
//! target as unresolved or stand in a default value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kit::types::errors::ErrorDetail;
use crate::kit::IacError;

/// What a failed include or dependency leaves behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedTarget {
    pub name: String,
    /// Always `None`: the target node is unknown
    pub target_id: Option<String>,
    pub reason: String,
}

pub fn mark_unresolved(error: &IacError) -> UnresolvedTarget {
    let name = match error.detail() {
        ErrorDetail::Include { include_path } => include_path.clone(),
        ErrorDetail::Dependency { dependency_name } => dependency_name.clone(),
        ErrorDetail::Function { function_name } => function_name.clone(),
        ErrorDetail::Source { raw } => raw.clone(),
        ErrorDetail::Path { path } => path.clone(),
        _ => String::new(),
    };
    UnresolvedTarget { name, target_id: None, reason: error.message().to_string() }
}

/// Outputs of a dependency that could not be read: its `mock_outputs` when
/// declared, an empty object otherwise.
pub fn substitute_mock_outputs(mock_outputs: Option<&Value>) -> Value {
    match mock_outputs {
        Some(Value::Object(outputs)) => Value::Object(outputs.clone()),
        _ => Value::Object(Map::new()),
    }
}

/// Value standing in for an unknown function call or an undefined reference
pub fn substitute_default(error: &IacError) -> Value {
    match error.detail() {
        ErrorDetail::Dependency { .. } => Value::Object(Map::new()),
        _ => Value::Null,
    }
}
