use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::kit::{IacError, IdGenerator, UuidGenerator};

fn default_id_generator() -> Arc<dyn IdGenerator> {
    Arc::new(UuidGenerator)
}

/// Scan-wide inputs shared by every edge built in one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCreationContext {
    pub scan_id: String,
    pub tenant_id: String,
    pub repository_root: String,
    /// Module path -> node id of the modules already scanned
    #[serde(default)]
    pub existing_modules: IndexMap<String, String>,
    #[serde(skip, default = "default_id_generator")]
    pub id_generator: Arc<dyn IdGenerator>,
}

impl EdgeCreationContext {
    pub fn new(
        scan_id: impl Into<String>,
        tenant_id: impl Into<String>,
        repository_root: impl Into<String>,
    ) -> Self {
        EdgeCreationContext {
            scan_id: scan_id.into(),
            tenant_id: tenant_id.into(),
            repository_root: repository_root.into(),
            existing_modules: IndexMap::new(),
            id_generator: default_id_generator(),
        }
    }

    pub fn with_existing_module(mut self, path: impl Into<String>, node_id: impl Into<String>) -> Self {
        self.existing_modules.insert(path.into(), node_id.into());
        self
    }

    pub fn with_existing_modules(mut self, modules: IndexMap<String, String>) -> Self {
        self.existing_modules = modules;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Caller contract checks, run before any edge is built.
    pub fn validate(&self) -> Result<(), IacError> {
        for (field, value) in [
            ("scanId", &self.scan_id),
            ("tenantId", &self.tenant_id),
            ("repositoryRoot", &self.repository_root),
        ] {
            if value.trim().is_empty() {
                return Err(IacError::invalid_context(field, "an empty string"));
            }
        }

        for (path, node_id) in self.existing_modules.iter() {
            if path.trim().is_empty() {
                return Err(IacError::invalid_context("existingModules", format!("an empty path mapped to '{}'", node_id))
                    .with_context("nodeId", node_id.as_str()));
            }
            if node_id.trim().is_empty() {
                return Err(IacError::invalid_context("existingModules", format!("an empty node id for '{}'", path))
                    .with_context("modulePath", path.as_str()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::types::ErrorCode;
    use test_case::test_case;

    #[test]
    fn test_valid_context() {
        let context = EdgeCreationContext::new("scan-1", "tenant-1", "/repo")
            .with_existing_module("modules/vpc", "mod-vpc");
        assert!(context.validate().is_ok());
    }

    #[test_case("", "tenant-1", "/repo", "scanId")]
    #[test_case("scan-1", " ", "/repo", "tenantId")]
    #[test_case("scan-1", "tenant-1", "", "repositoryRoot")]
    fn test_rejects_missing_fields(scan_id: &str, tenant_id: &str, root: &str, field: &str) {
        let error = EdgeCreationContext::new(scan_id, tenant_id, root).validate().unwrap_err();
        assert_eq!(error.code(), ErrorCode::InvalidContext);
        assert!(!error.is_recoverable());
        assert!(error.message().contains(field));
    }

    #[test]
    fn test_rejects_malformed_module_map() {
        let context = EdgeCreationContext::new("scan-1", "tenant-1", "/repo").with_existing_module("modules/vpc", "");
        let error = context.validate().unwrap_err();
        assert!(error.message().contains("existingModules"));
        assert_eq!(error.context()["modulePath"], "modules/vpc");
    }

    #[test]
    fn test_deserializes_without_generator() {
        let raw = r#"{"scanId": "s", "tenantId": "t", "repositoryRoot": "/repo"}"#;
        let context: EdgeCreationContext = serde_json::from_str(raw).unwrap();
        assert!(context.existing_modules.is_empty());
        assert!(!context.id_generator.next_id().is_empty());
    }
}
