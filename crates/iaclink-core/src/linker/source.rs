//! Classification of raw module `source` strings.
//!
//! [`parse_source`] is total: every input yields a [`SourceExpression`] whose
//! type is one of the known [`SourceType`]s, falling back to
//! [`SourceType::Unknown`].

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::constants::PUBLIC_REGISTRY_HOST;

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
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceType {
    Local,
    Registry,
    Git,
    Github,
    S3,
    Gcs,
    Http,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceExpression {
    pub raw: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
}

impl SourceExpression {
    fn empty(raw: &str, source_type: SourceType) -> Self {
        SourceExpression {
            raw: raw.to_string(),
            source_type,
            path: None,
            registry: None,
            git_url: None,
            git_ref: None,
            subdir: None,
            version: None,
            bucket: None,
            http_url: None,
        }
    }

    pub fn is_external(&self) -> bool {
        is_external(self)
    }
}

pub fn is_external(expression: &SourceExpression) -> bool {
    expression.source_type != SourceType::Local
}

pub fn parse_source(raw: &str) -> SourceExpression {
    let trimmed = raw.trim();
    let source_type = classify(trimmed);

    if source_type == SourceType::Local {
        let mut expression = SourceExpression::empty(trimmed, source_type);
        expression.path = Some(trimmed.to_string());
        return expression;
    }

    let parts = SharedParts::split(trimmed);
    let mut expression = SourceExpression::empty(trimmed, source_type);
    expression.subdir = parts.subdir.clone();
    expression.git_ref = parts.git_ref.clone();
    expression.version = parts.version.clone();

    match source_type {
        SourceType::Registry => extract_registry(&mut expression, &parts),
        SourceType::Git => extract_git(&mut expression, &parts),
        SourceType::Github => extract_github(&mut expression, &parts),
        SourceType::S3 => extract_s3(&mut expression, &parts),
        SourceType::Gcs => extract_gcs(&mut expression, &parts),
        SourceType::Http => extract_http(&mut expression, &parts),
        SourceType::Local | SourceType::Unknown => {}
    }
    expression
}

pub fn classify(source: &str) -> SourceType {
    if is_local(source) {
        SourceType::Local
    } else if is_s3(source) {
        SourceType::S3
    } else if is_gcs(source) {
        SourceType::Gcs
    } else if is_git(source) {
        SourceType::Git
    } else if source.contains("github.com") {
        SourceType::Github
    } else if is_registry(source) {
        SourceType::Registry
    } else if source.starts_with("http://") || source.starts_with("https://") {
        SourceType::Http
    } else {
        SourceType::Unknown
    }
}

fn is_local(source: &str) -> bool {
    source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with('/')
        || source == "."
        || source == ".."
}

fn is_s3(source: &str) -> bool {
    source.starts_with("s3::") || (!source.contains("://") && host_of(source).contains(".amazonaws.com"))
}

fn is_gcs(source: &str) -> bool {
    source.starts_with("gcs::") || (!source.contains("://") && source.starts_with("www.googleapis.com/storage/"))
}

fn is_git(source: &str) -> bool {
    if source.starts_with("git::") || source.starts_with("git@") || source.starts_with("bitbucket.org/") {
        return true;
    }
    // `.git` only counts when it ends a path segment, so `.github` does not match
    source.match_indices(".git").any(|(index, marker)| {
        matches!(source[index + marker.len()..].chars().next(), None | Some('/') | Some('?'))
    })
}

fn is_registry(source: &str) -> bool {
    let base = SharedParts::split(source).base;
    let segments: Vec<&str> = base.split('/').collect();
    match segments.as_slice() {
        [namespace, name, provider] => [namespace, name, provider].iter().all(|s| is_registry_segment(s)),
        [host, namespace, name, provider] => {
            is_hostname(host) && [namespace, name, provider].iter().all(|s| is_registry_segment(s))
        }
        _ => false,
    }
}

fn is_registry_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_hostname(segment: &str) -> bool {
    segment.contains('.')
        && !segment.contains(':')
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

fn host_of(source: &str) -> &str {
    let without_scheme = source.split_once("://").map(|(_, rest)| rest).unwrap_or(source);
    without_scheme.split('/').next().unwrap_or("")
}

/// Pieces of a source string shared by every remote type: `base//subdir?query`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SharedParts {
    base: String,
    query: Option<String>,
    subdir: Option<String>,
    git_ref: Option<String>,
    version: Option<String>,
}

impl SharedParts {
    fn split(source: &str) -> Self {
        let (before_query, query) = match source.split_once('?') {
            Some((before, query)) => (before, Some(query.to_string())),
            None => (source, None),
        };

        // Skip the `scheme://` separator when looking for the subdirectory marker
        let search_from = before_query.rfind("://").map(|index| index + 3).unwrap_or(0);
        let (base, subdir) = match before_query[search_from..].find("//") {
            Some(offset) => {
                let index = search_from + offset;
                let subdir = before_query[index + 2..].trim_matches('/');
                (
                    before_query[..index].to_string(),
                    if subdir.is_empty() { None } else { Some(subdir.to_string()) },
                )
            }
            None => (before_query.to_string(), None),
        };

        let mut parts = SharedParts { base, query: query.clone(), subdir, ..Default::default() };
        for pair in query.iter().flat_map(|q| q.split('&')) {
            match pair.split_once('=') {
                Some(("ref", value)) if !value.is_empty() => parts.git_ref = Some(value.to_string()),
                Some(("version", value)) if !value.is_empty() => parts.version = Some(value.to_string()),
                _ => {}
            }
        }
        parts
    }

    fn base_with_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.base, query),
            None => self.base.clone(),
        }
    }
}

fn extract_registry(expression: &mut SourceExpression, parts: &SharedParts) {
    let address = parts.base.strip_prefix(&format!("{}/", PUBLIC_REGISTRY_HOST)).unwrap_or(&parts.base);
    expression.registry = Some(address.to_string());
}

fn extract_git(expression: &mut SourceExpression, parts: &SharedParts) {
    let url = parts.base.strip_prefix("git::").unwrap_or(&parts.base);
    let url = if url.starts_with("bitbucket.org/") { format!("https://{}", url) } else { url.to_string() };
    expression.git_url = Some(url);
}

fn extract_github(expression: &mut SourceExpression, parts: &SharedParts) {
    let url = if parts.base.contains("://") {
        parts.base.clone()
    } else {
        format!("https://{}", parts.base)
    };
    expression.git_url = Some(url);
}

fn extract_s3(expression: &mut SourceExpression, parts: &SharedParts) {
    let url = parts.base.strip_prefix("s3::").unwrap_or(&parts.base);
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let (host, key) = without_scheme.split_once('/').unwrap_or((without_scheme, ""));

    // Path style `s3[-.]region.amazonaws.com/bucket/key` or virtual-host style `bucket.s3...`
    let (bucket, key) = if host.starts_with("s3.") || host.starts_with("s3-") {
        key.split_once('/').unwrap_or((key, ""))
    } else {
        (host.split(".s3").next().unwrap_or(host), key)
    };
    if !bucket.is_empty() {
        expression.bucket = Some(bucket.to_string());
    }
    if !key.is_empty() {
        expression.path = Some(key.to_string());
    }
}

fn extract_gcs(expression: &mut SourceExpression, parts: &SharedParts) {
    let url = parts.base.strip_prefix("gcs::").unwrap_or(&parts.base);
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let object = match without_scheme.find("/storage/v1/") {
        Some(index) => &without_scheme[index + "/storage/v1/".len()..],
        None => without_scheme.split_once('/').map(|(_, rest)| rest).unwrap_or(""),
    };
    let (bucket, key) = object.split_once('/').unwrap_or((object, ""));
    if !bucket.is_empty() {
        expression.bucket = Some(bucket.to_string());
    }
    if !key.is_empty() {
        expression.path = Some(key.to_string());
    }
}

fn extract_http(expression: &mut SourceExpression, parts: &SharedParts) {
    expression.http_url = Some(parts.base_with_query());
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    #[test_case("./modules/vpc", SourceType::Local)]
    #[test_case("../../modules/app", SourceType::Local)]
    #[test_case("/opt/modules/db", SourceType::Local)]
    #[test_case("  ./padded  ", SourceType::Local)]
    #[test_case("hashicorp/consul/aws", SourceType::Registry)]
    #[test_case("registry.terraform.io/hashicorp/consul/aws", SourceType::Registry)]
    #[test_case("app.terraform.io/acme/network/aws", SourceType::Registry)]
    #[test_case("git::https://example.com/vpc.git", SourceType::Git)]
    #[test_case("git@github.com:org/m.git//vpc?ref=v1.2.0", SourceType::Git)]
    #[test_case("https://example.com/org/repo.git?ref=main", SourceType::Git)]
    #[test_case("bitbucket.org/acme/terraform-modules", SourceType::Git)]
    #[test_case("github.com/hashicorp/example", SourceType::Github)]
    #[test_case("https://github.com/org/repo//modules/x", SourceType::Github)]
    #[test_case("https://example.com/.github/module.zip", SourceType::Http)]
    #[test_case("s3::https://s3-eu-west-1.amazonaws.com/acme-modules/vpc.zip", SourceType::S3)]
    #[test_case("acme-modules.s3.amazonaws.com/vpc.zip", SourceType::S3)]
    #[test_case("gcs::https://www.googleapis.com/storage/v1/acme/vpc.zip", SourceType::Gcs)]
    #[test_case("https://example.com/vpc-module.zip", SourceType::Http)]
    #[test_case("", SourceType::Unknown)]
    #[test_case("not a source", SourceType::Unknown)]
    #[test_case("example.com/foo/bar", SourceType::Unknown)]
    fn test_classify(raw: &str, expected: SourceType) {
        assert_eq!(parse_source(raw).source_type, expected);
    }

    #[test]
    fn test_local_fields() {
        let expression = parse_source("./modules/vpc");
        assert_eq!(expression.path.as_deref(), Some("./modules/vpc"));
        assert_eq!(expression.subdir, None);
        assert!(!expression.is_external());
    }

    #[test]
    fn test_registry_fields() {
        let expression = parse_source("hashicorp/consul/aws");
        assert_eq!(expression.registry.as_deref(), Some("hashicorp/consul/aws"));
        assert!(expression.git_url.is_none() && expression.bucket.is_none());

        let expression = parse_source("registry.terraform.io/hashicorp/consul/aws//modules/consul-cluster");
        assert_eq!(expression.registry.as_deref(), Some("hashicorp/consul/aws"));
        assert_eq!(expression.subdir.as_deref(), Some("modules/consul-cluster"));
    }

    #[test]
    fn test_git_ssh_fields() {
        let expression = parse_source("git@github.com:org/m.git//vpc?ref=v1.2.0");
        assert_eq!(expression.source_type, SourceType::Git);
        assert_eq!(expression.git_ref.as_deref(), Some("v1.2.0"));
        assert_eq!(expression.subdir.as_deref(), Some("vpc"));
        assert_eq!(expression.git_url.as_deref(), Some("git@github.com:org/m.git"));
    }

    #[test]
    fn test_git_https_fields() {
        let expression = parse_source("git::https://example.com/network.git//modules/vpc?ref=v3&depth=1");
        assert_eq!(expression.git_url.as_deref(), Some("https://example.com/network.git"));
        assert_eq!(expression.subdir.as_deref(), Some("modules/vpc"));
        assert_eq!(expression.git_ref.as_deref(), Some("v3"));
    }

    #[test]
    fn test_github_fields() {
        let expression = parse_source("github.com/hashicorp/example?ref=main");
        assert_eq!(expression.git_url.as_deref(), Some("https://github.com/hashicorp/example"));
        assert_eq!(expression.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn test_s3_fields() {
        let expression = parse_source("s3::https://s3-eu-west-1.amazonaws.com/acme-modules/net/vpc.zip?version=3");
        assert_eq!(expression.bucket.as_deref(), Some("acme-modules"));
        assert_eq!(expression.path.as_deref(), Some("net/vpc.zip"));
        assert_eq!(expression.version.as_deref(), Some("3"));

        let expression = parse_source("acme-modules.s3.amazonaws.com/vpc.zip");
        assert_eq!(expression.bucket.as_deref(), Some("acme-modules"));
    }

    #[test]
    fn test_gcs_fields() {
        let expression = parse_source("gcs::https://www.googleapis.com/storage/v1/acme/modules/vpc.zip");
        assert_eq!(expression.bucket.as_deref(), Some("acme"));
        assert_eq!(expression.path.as_deref(), Some("modules/vpc.zip"));
    }

    #[test]
    fn test_http_fields() {
        let expression = parse_source("https://example.com/vpc-module.zip?archive=zip");
        assert_eq!(expression.http_url.as_deref(), Some("https://example.com/vpc-module.zip?archive=zip"));
        assert!(expression.git_url.is_none());
    }

    #[test]
    fn test_parse_is_total() {
        let known: Vec<SourceType> = SourceType::iter().collect();
        for raw in ["::", "//", "?ref=", "git::", "s3::", "a/b/c/d/e", "\u{1F600}", "https://", "..//x"] {
            let expression = parse_source(raw);
            assert!(known.contains(&expression.source_type));
            assert_eq!(parse_source(raw), expression);
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(parse_source("git@github.com:org/m.git?ref=v1")).unwrap();
        assert_eq!(json["type"], "git");
        assert_eq!(json["ref"], "v1");
        assert_eq!(json["gitUrl"], "git@github.com:org/m.git");
    }
}
