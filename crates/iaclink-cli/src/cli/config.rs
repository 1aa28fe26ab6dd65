use std::path::Path;

use iaclink_core::{EdgeServiceConfig, RecoveryOptions};
use serde::{Deserialize, Serialize};

use super::errors::CliError;

pub const DEFAULT_CONFIG_PATH: &str = "./.iaclink.yml";

/// Content of `.iaclink.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    pub edges: EdgeServiceConfig,
    pub recovery: RecoveryOptions,
}

impl CliConfig {
    /// Reads `path`, or `./.iaclink.yml` when it exists. An explicit path
    /// must exist.
    pub fn load(path: Option<&str>) -> Result<CliConfig, CliError> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH,
            None => return Ok(CliConfig::default()),
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|source| CliError::Read { path: path.to_string(), source })?;
        CliConfig::from_yaml(path, &contents)
    }

    pub fn from_yaml(path: &str, contents: &str) -> Result<CliConfig, CliError> {
        if contents.trim().is_empty() {
            return Ok(CliConfig::default());
        }
        serde_yml::from_str(contents).map_err(|e| CliError::Parse {
            path: path.to_string(),
            format: "yaml",
            message: e.to_string(),
        })
    }
}
