use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{ARCHIVE_EXTENSIONS, SYNTHETIC_ID_PREFIX};
use crate::kit::helpers::path;
use crate::kit::{IacError, IdGenerator, UuidGenerator};

use super::source::{parse_source, SourceExpression, SourceType};

/// Everything a resolution needs to know about the configuration holding the
/// `source` attribute
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub scan_id: &'a str,
    pub tenant_id: &'a str,
    /// Path of the configuration file declaring the source
    pub config_path: &'a str,
    pub repository_root: &'a str,
    /// Module path (absolute or relative to `repository_root`) -> node id
    pub existing_modules: &'a IndexMap<String, String>,
}

/// Placeholder node for a module outside the scanned set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticModuleNode {
    pub id: String,
    pub name: String,
    pub path: String,
    pub synthetic: bool,
    pub scan_id: String,
    pub tenant_id: String,
    pub source: String,
    pub source_type: SourceType,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Set for local sources whose resolved path escapes the repository root
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub outside_repository: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub target_node_id: String,
    pub is_synthetic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_node: Option<SyntheticModuleNode>,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionResult {
    pub fn failure(source_type: SourceType, error: impl Into<String>) -> Self {
        ResolutionResult {
            target_node_id: String::new(),
            is_synthetic: false,
            synthetic_node: None,
            source_type,
            resolved_path: None,
            success: false,
            error: Some(error.into()),
        }
    }

    fn existing(node_id: &str, resolved_path: String) -> Self {
        ResolutionResult {
            target_node_id: node_id.to_string(),
            is_synthetic: false,
            synthetic_node: None,
            source_type: SourceType::Local,
            resolved_path: Some(resolved_path),
            success: true,
            error: None,
        }
    }

    fn synthesized(node: SyntheticModuleNode, resolved_path: Option<String>) -> Self {
        ResolutionResult {
            target_node_id: node.id.clone(),
            is_synthetic: true,
            source_type: node.source_type,
            synthetic_node: Some(node),
            resolved_path,
            success: true,
            error: None,
        }
    }
}

/// How synthetic node ids are minted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticIdStrategy {
    /// Ask the injected [`IdGenerator`]
    #[default]
    Generated,
    /// `synthetic:{scan}:{type}:{source}`, so repeated references to one
    /// external module collapse onto a single node
    Deterministic,
}

/// Resolution seam used by the edge service
pub trait SourceResolver: Send + Sync {
    fn parse(&self, raw: &str) -> SourceExpression {
        parse_source(raw)
    }

    fn resolve_source(
        &self,
        expression: &SourceExpression,
        context: &ResolutionContext<'_>,
    ) -> Result<ResolutionResult, IacError>;
}

#[derive(Debug, Clone)]
pub struct SourceLinker {
    id_generator: Arc<dyn IdGenerator>,
    synthetic_ids: SyntheticIdStrategy,
}

impl Default for SourceLinker {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl SourceLinker {
    pub fn new(id_generator: Arc<dyn IdGenerator>) -> Self {
        SourceLinker { id_generator, synthetic_ids: SyntheticIdStrategy::Generated }
    }

    pub fn with_synthetic_ids(mut self, strategy: SyntheticIdStrategy) -> Self {
        self.synthetic_ids = strategy;
        self
    }

    pub fn parse(&self, raw: &str) -> SourceExpression {
        parse_source(raw)
    }

    pub fn resolve(&self, expression: &SourceExpression, context: &ResolutionContext<'_>) -> ResolutionResult {
        match expression.source_type {
            SourceType::Local => self.resolve_local(expression, context),
            _ => {
                let node = self.synthesize(expression, context, None);
                ResolutionResult::synthesized(node, None)
            }
        }
    }

    fn resolve_local(&self, expression: &SourceExpression, context: &ResolutionContext<'_>) -> ResolutionResult {
        let Some(relative) = expression.path.as_deref().filter(|p| !p.trim().is_empty()) else {
            return ResolutionResult::failure(SourceType::Local, "local source has no path");
        };

        // Relative sources are anchored at the declaring file, not the repository root
        let config_dir = if context.config_path.starts_with('/') {
            path::parent_dir(context.config_path)
        } else {
            path::join(context.repository_root, &path::parent_dir(context.config_path))
        };
        let resolved = path::join(&config_dir, relative);

        if let Some(node_id) = lookup_module(context.existing_modules, &resolved, context.repository_root) {
            return ResolutionResult::existing(node_id, resolved);
        }

        log::debug!(
            "local module '{}' resolved to unscanned path '{}', synthesizing a node",
            expression.raw,
            resolved
        );
        let node = self.synthesize(expression, context, Some(&resolved));
        ResolutionResult::synthesized(node, Some(resolved))
    }

    fn synthesize(
        &self,
        expression: &SourceExpression,
        context: &ResolutionContext<'_>,
        resolved_path: Option<&str>,
    ) -> SyntheticModuleNode {
        let key = resolved_path.unwrap_or(&expression.raw);
        let id = match self.synthetic_ids {
            SyntheticIdStrategy::Generated => self.id_generator.next_id(),
            SyntheticIdStrategy::Deterministic => format!(
                "{}{}:{}:{}",
                SYNTHETIC_ID_PREFIX, context.scan_id, expression.source_type, key
            ),
        };

        SyntheticModuleNode {
            id,
            name: module_name(expression, resolved_path),
            path: key.to_string(),
            synthetic: true,
            scan_id: context.scan_id.to_string(),
            tenant_id: context.tenant_id.to_string(),
            source: expression.raw.clone(),
            source_type: expression.source_type,
            git_ref: expression.git_ref.clone(),
            version: expression.version.clone(),
            registry: expression.registry.clone(),
            bucket: expression.bucket.clone(),
            outside_repository: resolved_path
                .map(|resolved| !path::is_within(resolved, context.repository_root))
                .unwrap_or(false),
        }
    }
}

/// Node id of the scanned module at `resolved`. Keys may be absolute or
/// relative to the repository root; exact keys are tried before keys that
/// only match once normalized (`./modules/vpc`, `modules/vpc/`).
fn lookup_module<'m>(modules: &'m IndexMap<String, String>, resolved: &str, root: &str) -> Option<&'m String> {
    let relative = path::relative_to(resolved, root);
    modules
        .get(resolved)
        .or_else(|| relative.as_ref().and_then(|rel| modules.get(rel)))
        .or_else(|| {
            modules
                .iter()
                .find(|(key, _)| {
                    let key = path::normalize(key);
                    key == resolved || relative.as_deref() == Some(key.as_str())
                })
                .map(|(_, node_id)| node_id)
        })
}

impl SourceResolver for SourceLinker {
    fn resolve_source(
        &self,
        expression: &SourceExpression,
        context: &ResolutionContext<'_>,
    ) -> Result<ResolutionResult, IacError> {
        Ok(self.resolve(expression, context))
    }
}

/// Readable node name for a source
pub(crate) fn module_name(expression: &SourceExpression, resolved_path: Option<&str>) -> String {
    let name = match expression.source_type {
        SourceType::Local => resolved_path
            .or(expression.path.as_deref())
            .and_then(path::last_segment)
            .map(str::to_string),
        SourceType::Registry => expression.registry.as_deref().and_then(|address| {
            let segments: Vec<&str> = address.split('/').collect();
            // `[host/]namespace/name/provider`
            segments.len().checked_sub(2).map(|index| segments[index].to_string())
        }),
        SourceType::Git | SourceType::Github => expression.git_url.as_deref().and_then(|url| {
            url.trim_end_matches('/')
                .rsplit(|c: char| c == '/' || c == ':')
                .next()
                .map(|repo| repo.trim_end_matches(".git").to_string())
        }),
        SourceType::S3 | SourceType::Gcs => expression.bucket.as_ref().map(|bucket| match &expression.subdir {
            Some(subdir) => format!("{}/{}", bucket, subdir),
            None => bucket.clone(),
        }),
        SourceType::Http => expression.http_url.as_deref().and_then(|url| {
            let without_query = url.split('?').next().unwrap_or(url);
            let without_scheme = without_query.split_once("://").map(|(_, rest)| rest).unwrap_or(without_query);
            // the host alone is not a useful name
            let (_, path_part) = without_scheme.split_once('/')?;
            path::last_segment(path_part).map(strip_archive_extension)
        }),
        SourceType::Unknown => None,
    };

    name.filter(|n| !n.is_empty()).unwrap_or_else(|| expression.raw.clone())
}

fn strip_archive_extension(segment: &str) -> String {
    ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::SequentialIdGenerator;
    use test_case::test_case;

    fn modules(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn context<'a>(config_path: &'a str, existing: &'a IndexMap<String, String>) -> ResolutionContext<'a> {
        ResolutionContext {
            scan_id: "scan-1",
            tenant_id: "tenant-1",
            config_path,
            repository_root: "/repo",
            existing_modules: existing,
        }
    }

    fn linker() -> SourceLinker {
        SourceLinker::new(Arc::new(SequentialIdGenerator::new("node")))
    }

    #[test]
    fn test_local_hit_by_absolute_path() {
        let existing = modules(&[("/repo/live/vpc/modules/vpc", "mod-vpc")]);
        let ctx = context("/repo/live/vpc/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("./modules/vpc"), &ctx);

        assert!(result.success);
        assert!(!result.is_synthetic);
        assert_eq!(result.target_node_id, "mod-vpc");
        assert_eq!(result.resolved_path.as_deref(), Some("/repo/live/vpc/modules/vpc"));
    }

    #[test]
    fn test_local_hit_by_repository_relative_path() {
        let existing = modules(&[("modules/app", "mod-app")]);
        let ctx = context("/repo/live/app/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("../../modules/app"), &ctx);

        assert_eq!(result.target_node_id, "mod-app");
        assert!(!result.is_synthetic);
    }

    #[test]
    fn test_local_relative_config_path_is_anchored_at_root() {
        let existing = modules(&[("modules/app", "mod-app")]);
        let ctx = context("live/app/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("../../modules/app"), &ctx);
        assert_eq!(result.target_node_id, "mod-app");
    }

    #[test_case("./modules/app" ; "dot prefixed")]
    #[test_case("modules/app/" ; "trailing slash")]
    #[test_case("/repo/modules//app/" ; "doubled separator")]
    #[test_case("/repo/live/../modules/app" ; "parent segment")]
    fn test_local_hit_with_unnormalized_keys(key: &str) {
        let existing = modules(&[(key, "mod-app")]);
        let ctx = context("/repo/live/app/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("../../modules/app"), &ctx);

        assert_eq!(result.target_node_id, "mod-app");
        assert!(!result.is_synthetic);
    }

    #[test]
    fn test_local_miss_synthesizes() {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/vpc/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("./modules/vpc"), &ctx);

        assert!(result.success);
        assert!(result.is_synthetic);
        let node = result.synthetic_node.unwrap();
        assert_eq!(node.id, "node-1");
        assert_eq!(node.name, "vpc");
        assert_eq!(node.path, "/repo/live/vpc/modules/vpc");
        assert_eq!(node.tenant_id, "tenant-1");
        assert!(node.synthetic);
        assert!(!node.outside_repository);
    }

    #[test]
    fn test_local_traversal_is_accepted_and_flagged() {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source("../../../x"), &ctx);

        assert!(result.success);
        assert_eq!(result.resolved_path.as_deref(), Some("/x"));
        assert!(result.synthetic_node.unwrap().outside_repository);
    }

    #[test]
    fn test_local_without_path_fails() {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/terragrunt.hcl", &existing);
        let mut expression = parse_source("./x");
        expression.path = None;
        let result = linker().resolve(&expression, &ctx);

        assert!(!result.success);
        assert!(result.target_node_id.is_empty());
        assert!(result.error.is_some());
    }

    #[test_case("hashicorp/consul/aws", "consul")]
    #[test_case("registry.terraform.io/terraform-aws-modules/vpc/aws", "vpc")]
    #[test_case("git@github.com:org/m.git//vpc?ref=v1.2.0", "m")]
    #[test_case("git::https://example.com/network.git", "network")]
    #[test_case("github.com/hashicorp/example", "example")]
    #[test_case("s3::https://s3-eu-west-1.amazonaws.com/acme-modules/vpc.zip", "acme-modules")]
    #[test_case("gcs::https://www.googleapis.com/storage/v1/acme/vpc.zip//net", "acme/net")]
    #[test_case("https://example.com/modules/vpc-module.tar.gz", "vpc-module")]
    #[test_case("https://example.com", "https://example.com")]
    #[test_case("mystery", "mystery")]
    fn test_external_names(raw: &str, expected: &str) {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/terragrunt.hcl", &existing);
        let result = linker().resolve(&parse_source(raw), &ctx);

        assert!(result.success);
        assert!(result.is_synthetic);
        assert!(result.resolved_path.is_none());
        assert_eq!(result.synthetic_node.unwrap().name, expected);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/vpc/terragrunt.hcl", &existing);
        let linker = linker().with_synthetic_ids(SyntheticIdStrategy::Deterministic);
        let expression = parse_source("./modules/vpc");

        let first = linker.resolve(&expression, &ctx);
        let second = linker.resolve(&expression, &ctx);
        assert_eq!(first, second);
        assert_eq!(first.target_node_id, "synthetic:scan-1:local:/repo/live/vpc/modules/vpc");
    }

    #[test]
    fn test_trait_resolution_never_fails_for_linker() {
        let existing = IndexMap::new();
        let ctx = context("/repo/live/terragrunt.hcl", &existing);
        let linker = linker();
        let expression = SourceResolver::parse(&linker, "hashicorp/consul/aws");
        assert!(linker.resolve_source(&expression, &ctx).is_ok());
    }
}
