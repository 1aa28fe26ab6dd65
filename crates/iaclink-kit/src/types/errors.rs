//! Structured errors for parsing, linking and edge construction.
//!
//! A single [`IacError`] value covers every category. Its handling metadata
//! (severity, recoverability, suggestion) comes from the [`ErrorCode`]
//! registry, and the category-specific payload lives in [`ErrorDetail`].

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::error_codes::{ErrorCategory, ErrorCode, Severity};
use super::location::SourceLocation;

pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Position of a lexer error in the scanned buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerPosition {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LexerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (offset {})", self.line, self.column, self.offset)
    }
}

/// Category specific payload of an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorDetail {
    #[default]
    None,
    Lexer { position: LexerPosition },
    Block { block_type: String },
    Include { include_path: String },
    Dependency { dependency_name: String },
    Function { function_name: String },
    Field { field: String, expected: String, actual: String },
    Source { raw: String },
    Path { path: String },
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct IacError {
    code: ErrorCode,
    message: String,
    location: Option<SourceLocation>,
    detail: ErrorDetail,
    context: IndexMap<String, Value>,
    #[source]
    cause: Option<Box<IacError>>,
}

impl IacError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        IacError {
            code,
            message: message.into(),
            location: None,
            detail: ErrorDetail::None,
            context: IndexMap::new(),
            cause: None,
        }
    }

    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_cause(mut self, cause: IacError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    // Constructors

    pub fn lexer(code: ErrorCode, message: impl Into<String>, position: LexerPosition) -> Self {
        Self::new(code, message).with_detail(ErrorDetail::Lexer { position })
    }

    pub fn unknown_block(block_type: impl Into<String>) -> Self {
        let block_type = block_type.into();
        Self::new(ErrorCode::UnknownBlockType, format!("unknown block type '{}'", block_type))
            .with_detail(ErrorDetail::Block { block_type })
    }

    pub fn malformed_block(block_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedBlock, message)
            .with_detail(ErrorDetail::Block { block_type: block_type.into() })
    }

    pub fn include_not_found(include_path: impl Into<String>) -> Self {
        let include_path = include_path.into();
        Self::new(ErrorCode::IncludeNotFound, format!("included configuration '{}' not found", include_path))
            .with_detail(ErrorDetail::Include { include_path })
    }

    pub fn dependency_not_found(dependency_name: impl Into<String>, config_path: &str) -> Self {
        let dependency_name = dependency_name.into();
        Self::new(
            ErrorCode::DependencyNotFound,
            format!("dependency '{}' points at '{}' which was not found", dependency_name, config_path),
        )
        .with_detail(ErrorDetail::Dependency { dependency_name })
        .with_context("configPath", config_path)
    }

    pub fn unknown_function(function_name: impl Into<String>) -> Self {
        let function_name = function_name.into();
        Self::new(ErrorCode::UnknownFunction, format!("unknown function '{}'", function_name))
            .with_detail(ErrorDetail::Function { function_name })
    }

    pub fn invalid_field(
        code: ErrorCode,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (field, expected, actual) = (field.into(), expected.into(), actual.into());
        Self::new(code, format!("field '{}' expected {} but got {}", field, expected, actual))
            .with_detail(ErrorDetail::Field { field, expected, actual })
    }

    pub fn invalid_context(field: &str, reason: impl Into<String>) -> Self {
        Self::invalid_field(ErrorCode::InvalidContext, field, "a non-empty value", reason)
    }

    pub fn resolver_failure(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResolverFailure, reason).with_detail(ErrorDetail::Source { raw: raw.into() })
    }

    pub fn filesystem(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message).with_detail(ErrorDetail::Path { path: path.into() })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // Accessors

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn suggestion(&self) -> &'static str {
        self.code.suggestion()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    pub fn context(&self) -> &IndexMap<String, Value> {
        &self.context
    }

    pub fn cause(&self) -> Option<&IacError> {
        self.cause.as_deref()
    }

    /// Error class name used by the serialized shape, e.g. `EdgeValidationError`
    pub fn name(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Lexer => "LexerError",
            ErrorCategory::Syntax => "SyntaxError",
            ErrorCategory::Block => "BlockError",
            ErrorCategory::IncludeResolution => "IncludeResolutionError",
            ErrorCategory::DependencyResolution => "DependencyResolutionError",
            ErrorCategory::Function => "FunctionError",
            ErrorCategory::Reference => "ReferenceError",
            ErrorCategory::Filesystem => "FileSystemError",
            ErrorCategory::Validation => "ValidationError",
            ErrorCategory::Internal => "InternalError",
            ErrorCategory::Edge => "EdgeValidationError",
            ErrorCategory::SourceResolution => "SourceResolutionError",
        }
    }

    pub fn to_serialized(&self) -> SerializedError {
        let mut details = serde_json::Map::new();
        if let Ok(Value::Object(fields)) = serde_json::to_value(&self.detail) {
            if self.detail != ErrorDetail::None {
                details.extend(fields);
            }
        }
        details.extend(self.context.iter().map(|(k, v)| (k.clone(), v.clone())));

        SerializedError {
            name: self.name().to_string(),
            message: self.message.clone(),
            code: self.code,
            severity: self.severity(),
            location: self.location.clone(),
            suggestion: self.suggestion().to_string(),
            recoverable: self.is_recoverable(),
            details: if details.is_empty() { None } else { Some(Value::Object(details)) },
            cause: self.cause.as_ref().map(|cause| Box::new(cause.to_serialized())),
        }
    }
}

impl Serialize for IacError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_serialized().serialize(serializer)
    }
}

/// Wire shape of an error handed to reporting layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedError {
    pub name: String,
    pub message: String,
    pub code: ErrorCode,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub suggestion: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<SerializedError>>,
}

/// Errors gathered during one session, capped at `max_errors`
#[derive(Debug, Clone)]
pub struct ErrorCollection {
    errors: Vec<IacError>,
    max_errors: usize,
    dropped: usize,
}

impl ErrorCollection {
    pub fn new(max_errors: usize) -> Self {
        ErrorCollection { errors: Vec::new(), max_errors, dropped: 0 }
    }

    /// Stores the error unless the collection is full. Returns whether it
    /// was kept.
    pub fn push(&mut self, error: IacError) -> bool {
        if self.is_full() {
            self.dropped += 1;
            return false;
        }
        self.errors.push(error);
        true
    }

    pub fn is_full(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    /// True once an error had to be dropped for lack of room
    pub fn overflowed(&self) -> bool {
        self.dropped > 0
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(IacError::is_fatal)
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.errors.iter().map(IacError::severity).max()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity() == severity).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IacError> {
        self.errors.iter()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.dropped = 0;
    }

    pub fn into_vec(self) -> Vec<IacError> {
        self.errors
    }
}

impl Default for ErrorCollection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}
