//! Decision table for recoverable errors.
//!
//! Rules are keyed by `(category, code)` with a `(category, None)` fallback
//! per category. A rule may be gated by one [`RecoveryOptions`] flag: when
//! the flag is off the decision becomes [`RecoveryAction::Abort`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::kit::types::{ErrorCategory, ErrorCode};
use crate::kit::IacError;

use super::options::RecoveryOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryAction {
    Continue,
    Abort,
    SubstituteDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PolicyFlag {
    SkipMalformedBlocks,
    ContinueOnIncludeFailure,
    ContinueOnDependencyFailure,
    SkipUnknownBlocks,
}

impl PolicyFlag {
    pub fn is_enabled(&self, options: &RecoveryOptions) -> bool {
        match self {
            PolicyFlag::SkipMalformedBlocks => options.skip_malformed_blocks,
            PolicyFlag::ContinueOnIncludeFailure => options.continue_on_include_failure,
            PolicyFlag::ContinueOnDependencyFailure => options.continue_on_dependency_failure,
            PolicyFlag::SkipUnknownBlocks => options.skip_unknown_blocks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyRule {
    pub action: RecoveryAction,
    pub gate: Option<PolicyFlag>,
}

const fn rule(action: RecoveryAction, gate: Option<PolicyFlag>) -> PolicyRule {
    PolicyRule { action, gate }
}

type PolicyKey = (ErrorCategory, Option<ErrorCode>);

lazy_static! {
    pub static ref POLICY_TABLE: HashMap<PolicyKey, PolicyRule> = {
        use ErrorCategory as C;
        use PolicyFlag as F;
        use RecoveryAction as A;

        let mut table = HashMap::new();
        table.insert((C::Lexer, None), rule(A::Continue, None));
        table.insert((C::Syntax, None), rule(A::Continue, Some(F::SkipMalformedBlocks)));

        table.insert((C::Block, Some(ErrorCode::UnknownBlockType)), rule(A::Continue, Some(F::SkipUnknownBlocks)));
        table.insert((C::Block, None), rule(A::Continue, Some(F::SkipMalformedBlocks)));

        table.insert((C::IncludeResolution, None), rule(A::Continue, Some(F::ContinueOnIncludeFailure)));

        table.insert(
            (C::DependencyResolution, Some(ErrorCode::DependencyNotFound)),
            rule(A::SubstituteDefault, Some(F::ContinueOnDependencyFailure)),
        );
        table.insert((C::DependencyResolution, None), rule(A::Continue, Some(F::ContinueOnDependencyFailure)));

        table.insert((C::Function, None), rule(A::SubstituteDefault, None));
        table.insert((C::Reference, None), rule(A::SubstituteDefault, None));
        table.insert((C::Validation, None), rule(A::Continue, None));
        table.insert((C::Edge, None), rule(A::Continue, None));
        table.insert((C::SourceResolution, None), rule(A::Continue, None));

        table.insert((C::Filesystem, None), rule(A::Abort, None));
        table.insert((C::Internal, None), rule(A::Abort, None));
        table
    };
}

pub fn lookup(category: ErrorCategory, code: ErrorCode) -> Option<PolicyRule> {
    POLICY_TABLE
        .get(&(category, Some(code)))
        .or_else(|| POLICY_TABLE.get(&(category, None)))
        .copied()
}

/// Continue, abort or substitute for one error. Fatal and non-recoverable
/// errors abort whatever the table says.
pub fn decide(error: &IacError, options: &RecoveryOptions) -> RecoveryAction {
    if error.is_fatal() || !error.is_recoverable() {
        return RecoveryAction::Abort;
    }
    match lookup(error.category(), error.code()) {
        Some(PolicyRule { gate: Some(flag), .. }) if !flag.is_enabled(options) => RecoveryAction::Abort,
        Some(PolicyRule { action, .. }) => action,
        None => RecoveryAction::Continue,
    }
}
