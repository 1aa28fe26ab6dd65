//! Session-scoped error recovery.
//!
//! A [`RecoveryManager`] collects the errors of one parse or build session,
//! decides from the policy table whether to go on, and applies the
//! strategy of the error's category. It moves between
//! [`RecoveryMode::Normal`] and [`RecoveryMode::InRecovery`]; the caller
//! ends a recovery with [`RecoveryManager::complete`] once the next
//! construct parsed cleanly.

pub mod block;
pub mod lexer;
mod options;
pub mod policy;
pub mod reference;
mod state;

use indexmap::IndexMap;
use serde_json::Value;
use strum::{AsRefStr, Display};

pub use block::PartialBlock;
pub use options::{RecoveryOptions, DEFAULT_MAX_RECOVERY_ATTEMPTS};
pub use policy::RecoveryAction;
pub use reference::UnresolvedTarget;
pub use state::{RecoveryMode, RecoveryPoint, RecoveryState, SkippedRange};

use crate::kit::types::{ErrorCategory, ErrorCode};
use crate::kit::{ErrorCollection, IacError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    SkipToSafePoint,
    InsertMissingTerminator,
    ReplaceAndSkip,
    SkipToMatchingBrace,
    SyncToNextBlock,
    SkipToEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    /// Scanning resumes at `offset`; `replacement` stands in for the
    /// skipped text when the strategy produces one
    Resume { offset: usize, strategy: Strategy, replacement: Option<String> },
    /// The failed include or dependency is kept with no target
    MarkUnresolved(UnresolvedTarget),
    SubstituteDefault(Value),
    /// Nothing to repair, go on with the next construct
    Continue,
    Abort { reason: String },
}

#[derive(Debug, Clone)]
pub struct RecoveryManager {
    options: RecoveryOptions,
    state: RecoveryState,
    errors: ErrorCollection,
}

impl Default for RecoveryManager {
    fn default() -> Self {
        Self::new(RecoveryOptions::default())
    }
}

impl RecoveryManager {
    pub fn new(options: RecoveryOptions) -> Self {
        RecoveryManager { options, state: RecoveryState::default(), errors: ErrorCollection::new(options.max_errors) }
    }

    pub fn options(&self) -> &RecoveryOptions {
        &self.options
    }

    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    pub fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    pub fn into_errors(self) -> ErrorCollection {
        self.errors
    }

    /// Starts a new session
    pub fn reset(&mut self) {
        self.state.reset();
        self.errors.clear();
    }

    /// Stores `error`, enters recovery and returns the policy decision.
    pub fn record(&mut self, error: IacError) -> RecoveryAction {
        if !self.state.is_recovering() {
            self.state.mode = RecoveryMode::InRecovery;
            self.state.recovery_attempts = 0;
        }
        self.state.error_count += 1;
        self.state.recovery_attempts += 1;
        self.state.total_attempts += 1;

        let action = policy::decide(&error, &self.options);
        let code = error.code();
        if !self.errors.push(error) {
            log::warn!("error limit of {} reached, aborting", self.options.max_errors);
            return RecoveryAction::Abort;
        }
        if self.state.recovery_attempts > self.options.max_recovery_attempts {
            log::warn!(
                "giving up after {} recovery attempts (last error {})",
                self.state.recovery_attempts - 1,
                code
            );
            return RecoveryAction::Abort;
        }
        log::debug!("recovering from {}: {}", code, action);
        action
    }

    /// Records `error` raised at byte `offset` of `source` and applies the
    /// matching strategy.
    pub fn handle(&mut self, error: IacError, source: &str, offset: usize) -> RecoveryOutcome {
        let (category, code) = (error.category(), error.code());
        let unresolved = reference::mark_unresolved(&error);
        let default = reference::substitute_default(&error);
        let message = error.to_string();

        match self.record(error) {
            RecoveryAction::Abort => Self::abort(message),
            RecoveryAction::SubstituteDefault => RecoveryOutcome::SubstituteDefault(default),
            RecoveryAction::Continue => match category {
                ErrorCategory::Lexer => self.recover_lexer(code, source, offset),
                ErrorCategory::Syntax | ErrorCategory::Block => self.recover_block(source, offset),
                ErrorCategory::IncludeResolution | ErrorCategory::DependencyResolution => {
                    RecoveryOutcome::MarkUnresolved(unresolved)
                }
                _ => RecoveryOutcome::Continue,
            },
        }
    }

    /// Keeps the attributes parsed before a block failed
    pub fn emit_partial_block(
        &mut self,
        block_type: impl Into<String>,
        labels: Vec<String>,
        attributes: IndexMap<String, Value>,
    ) -> PartialBlock {
        let block = PartialBlock::new(block_type, labels, attributes);
        log::debug!("keeping {} attributes of partial {} block", block.attributes.len(), block.block_type);
        block
    }

    /// The construct following the last error parsed cleanly
    pub fn complete(&mut self) {
        if self.state.is_recovering() {
            log::debug!("recovered after {} attempts", self.state.recovery_attempts);
        }
        self.state.mode = RecoveryMode::Normal;
        self.state.recovery_attempts = 0;
    }

    fn abort(message: String) -> RecoveryOutcome {
        RecoveryOutcome::Abort { reason: message }
    }

    fn recover_lexer(&mut self, code: ErrorCode, source: &str, offset: usize) -> RecoveryOutcome {
        let (next, strategy, replacement) = match code {
            ErrorCode::UnterminatedString => {
                let terminated = lexer::insert_missing_terminator(source, offset);
                (terminated.end, Strategy::InsertMissingTerminator, Some(terminated.value))
            }
            ErrorCode::InvalidCharacter | ErrorCode::InvalidEscapeSequence => {
                let (next, replacement) = lexer::replace_and_skip(source, offset);
                (next, Strategy::ReplaceAndSkip, Some(replacement.to_string()))
            }
            _ => (lexer::skip_to_safe_point(source, offset), Strategy::SkipToSafePoint, None),
        };
        self.resume(source, offset, next, strategy, replacement)
    }

    fn recover_block(&mut self, source: &str, offset: usize) -> RecoveryOutcome {
        let (next, strategy) = match block::skip_to_matching_brace(source, offset) {
            Some(next) => (next, Strategy::SkipToMatchingBrace),
            None => match block::sync_to_next_block(source, offset) {
                Some(next) => (next, Strategy::SyncToNextBlock),
                None => (source.len(), Strategy::SkipToEnd),
            },
        };
        self.resume(source, offset, next, strategy, None)
    }

    /// Records the skipped range and the recovery point. Always moves past
    /// `offset` unless the input is exhausted.
    fn resume(
        &mut self,
        source: &str,
        offset: usize,
        next: usize,
        strategy: Strategy,
        replacement: Option<String>,
    ) -> RecoveryOutcome {
        let start = lexer::floor_char_boundary(source, offset);
        let next = if next <= start && start < source.len() {
            lexer::replace_and_skip(source, start).0
        } else {
            next
        };
        if next > start {
            self.state.skipped_ranges.push(SkippedRange { start, end: next, reason: strategy.to_string() });
        }
        self.state.recovery_points.push(RecoveryPoint { offset: next, strategy: strategy.to_string() });
        RecoveryOutcome::Resume { offset: next, strategy, replacement }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::types::errors::LexerPosition;
    use crate::kit::types::Severity;

    fn unterminated(offset: usize) -> IacError {
        IacError::lexer(ErrorCode::UnterminatedString, "unterminated string", LexerPosition { offset, line: 1, column: 1 })
    }

    #[test]
    fn test_state_machine() {
        let mut manager = RecoveryManager::default();
        assert_eq!(manager.state().mode, RecoveryMode::Normal);

        let source = "name = \"vpc\nregion = 1";
        let outcome = manager.handle(unterminated(8), source, 8);
        assert_eq!(
            outcome,
            RecoveryOutcome::Resume { offset: 11, strategy: Strategy::InsertMissingTerminator, replacement: Some("vpc".into()) }
        );
        assert_eq!(manager.state().mode, RecoveryMode::InRecovery);
        assert_eq!(manager.state().skipped_ranges, vec![SkippedRange { start: 8, end: 11, reason: "insert_missing_terminator".into() }]);

        manager.complete();
        assert_eq!(manager.state().mode, RecoveryMode::Normal);
        assert_eq!(manager.state().recovery_attempts, 0);
        assert_eq!(manager.state().error_count, 1);
        assert_eq!(manager.errors().len(), 1);
    }

    #[test]
    fn test_block_recovery() {
        let mut manager = RecoveryManager::default();
        let source = "locals {\n  a = = 1\n}\ninputs = {}";
        let outcome = manager.handle(IacError::malformed_block("locals", "unexpected '='"), source, 0);
        match outcome {
            RecoveryOutcome::Resume { offset, strategy, .. } => {
                assert_eq!(strategy, Strategy::SkipToMatchingBrace);
                assert_eq!(&source[offset..], "\ninputs = {}");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_block_recovery_from_inside_body() {
        let mut manager = RecoveryManager::default();
        let source = "locals {\n  a = = 1\n}\ninputs = {\n  x = 1\n}\n";
        let offset = source.find("= 1").unwrap();
        match manager.handle(IacError::new(ErrorCode::UnexpectedToken, "unexpected '='"), source, offset) {
            RecoveryOutcome::Resume { offset: next, strategy, .. } => {
                assert_eq!(strategy, Strategy::SkipToMatchingBrace);
                assert_eq!(&source[next..], "\ninputs = {\n  x = 1\n}\n");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_block_syncs_forward() {
        let mut manager = RecoveryManager::default();
        let source = "locals {\n  a = [\nterraform {\n  source = \"x\"\n";
        match manager.handle(IacError::new(ErrorCode::MissingClosingBrace, "missing '}'"), source, 0) {
            RecoveryOutcome::Resume { offset, strategy, .. } => {
                assert_eq!(strategy, Strategy::SyncToNextBlock);
                assert!(source[offset..].starts_with("terraform {"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_include_and_dependency_outcomes() {
        let mut manager = RecoveryManager::default();
        match manager.handle(IacError::include_not_found("../root.hcl"), "", 0) {
            RecoveryOutcome::MarkUnresolved(target) => assert_eq!(target.name, "../root.hcl"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            manager.handle(IacError::dependency_not_found("vpc", "../vpc"), "", 0),
            RecoveryOutcome::SubstituteDefault(serde_json::json!({}))
        );
    }

    #[test]
    fn test_strict_policy_aborts() {
        let mut manager = RecoveryManager::new(RecoveryOptions::strict());
        let outcome = manager.handle(IacError::unknown_block("widget"), "widget {}", 0);
        assert!(matches!(outcome, RecoveryOutcome::Abort { .. }));
    }

    #[test]
    fn test_fatal_always_aborts() {
        let mut manager = RecoveryManager::default();
        let error = IacError::filesystem(ErrorCode::PermissionDenied, "live", "permission denied");
        assert_eq!(error.severity(), Severity::Fatal);
        assert!(matches!(manager.handle(error, "", 0), RecoveryOutcome::Abort { .. }));
        assert!(manager.errors().has_fatal());
    }

    #[test]
    fn test_max_errors_aborts() {
        let mut manager = RecoveryManager::new(RecoveryOptions::default().with_max_errors(2));
        let source = "a\u{1}b\u{1}c\u{1}";
        let invalid = || IacError::new(ErrorCode::InvalidCharacter, "invalid character");
        assert!(matches!(manager.handle(invalid(), source, 1), RecoveryOutcome::Resume { .. }));
        manager.complete();
        assert!(matches!(manager.handle(invalid(), source, 3), RecoveryOutcome::Resume { .. }));
        manager.complete();
        assert!(matches!(manager.handle(invalid(), source, 5), RecoveryOutcome::Abort { .. }));
        assert_eq!(manager.errors().len(), 2);
        assert!(manager.errors().overflowed());
    }

    #[test]
    fn test_attempt_cap() {
        let mut manager = RecoveryManager::new(RecoveryOptions::default().with_max_recovery_attempts(2));
        let source = "x = \"a\n\"b\n\"c\n";
        assert!(matches!(manager.handle(unterminated(5), source, 5), RecoveryOutcome::Resume { .. }));
        assert!(matches!(manager.handle(unterminated(8), source, 8), RecoveryOutcome::Resume { .. }));
        // still recovering from the first error
        assert!(matches!(manager.handle(unterminated(11), source, 11), RecoveryOutcome::Abort { .. }));
        assert_eq!(manager.state().total_attempts, 3);
    }

    #[test]
    fn test_progress_at_whitespace() {
        let mut manager = RecoveryManager::default();
        let error = IacError::new(ErrorCode::InvalidNumber, "bad number");
        match manager.handle(error, "1x 2", 2) {
            RecoveryOutcome::Resume { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_reset() {
        let mut manager = RecoveryManager::default();
        manager.handle(IacError::unknown_block("widget"), "widget {}", 0);
        manager.reset();
        assert_eq!(manager.state(), &RecoveryState::default());
        assert!(manager.errors().is_empty());
    }
}
