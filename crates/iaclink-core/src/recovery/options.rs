use serde::{Deserialize, Serialize};

use crate::kit::types::errors::DEFAULT_MAX_ERRORS;

pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: usize = 3;

/// Flags consulted by the recovery policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryOptions {
    /// Errors kept per session; one more aborts
    pub max_errors: usize,
    /// Attempts allowed while recovering from one error
    pub max_recovery_attempts: usize,
    pub skip_malformed_blocks: bool,
    pub continue_on_include_failure: bool,
    pub continue_on_dependency_failure: bool,
    pub skip_unknown_blocks: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            max_errors: DEFAULT_MAX_ERRORS,
            max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
            skip_malformed_blocks: true,
            continue_on_include_failure: true,
            continue_on_dependency_failure: true,
            skip_unknown_blocks: true,
        }
    }
}

impl RecoveryOptions {
    /// Every policy flag off: any gated category aborts
    pub fn strict() -> Self {
        RecoveryOptions {
            skip_malformed_blocks: false,
            continue_on_include_failure: false,
            continue_on_dependency_failure: false,
            skip_unknown_blocks: false,
            ..Default::default()
        }
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_max_recovery_attempts(mut self, attempts: usize) -> Self {
        self.max_recovery_attempts = attempts;
        self
    }

    pub fn with_skip_malformed_blocks(mut self, enabled: bool) -> Self {
        self.skip_malformed_blocks = enabled;
        self
    }

    pub fn with_continue_on_include_failure(mut self, enabled: bool) -> Self {
        self.continue_on_include_failure = enabled;
        self
    }

    pub fn with_continue_on_dependency_failure(mut self, enabled: bool) -> Self {
        self.continue_on_dependency_failure = enabled;
        self
    }

    pub fn with_skip_unknown_blocks(mut self, enabled: bool) -> Self {
        self.skip_unknown_blocks = enabled;
        self
    }
}
