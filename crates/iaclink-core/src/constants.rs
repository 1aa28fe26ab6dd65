/// Prefix of placeholder targets for hints that could not be resolved
pub const UNRESOLVED_TARGET_PREFIX: &str = "unresolved:";

/// Prefix of deterministic synthetic node ids
pub const SYNTHETIC_ID_PREFIX: &str = "synthetic:";

/// Multiplier applied to evidence of edges built for unresolved hints
pub const DEFAULT_UNRESOLVED_CONFIDENCE_FACTOR: f64 = 0.5;

// Confidence of the evidence the service derives when a hint carries none
pub const EXPLICIT_INCLUDE_CONFIDENCE: i64 = 95;
pub const EXPLICIT_DEPENDENCY_CONFIDENCE: i64 = 95;
pub const EXPLICIT_SOURCE_CONFIDENCE: i64 = 95;
pub const INFERRED_INPUT_CONFIDENCE: i64 = 85;

pub const PUBLIC_REGISTRY_HOST: &str = "registry.terraform.io";

/// Archive suffixes stripped when naming modules fetched over HTTP
pub const ARCHIVE_EXTENSIONS: &[&str] =
    &[".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".tbz2", ".txz", ".zip", ".tar"];

/// Block types that start a top-level construct in Terraform and Terragrunt files
pub const BLOCK_KEYWORDS: &[&str] = &[
    "terraform",
    "include",
    "dependency",
    "dependencies",
    "locals",
    "inputs",
    "remote_state",
    "generate",
    "module",
    "resource",
    "data",
    "variable",
    "output",
    "provider",
    "feature",
    "exclude",
    "errors",
];
