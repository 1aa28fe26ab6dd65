//! Closed error-code registry.
//!
//! Every code carries a fixed category, severity, recoverability flag and
//! suggestion. Nothing about an error's handling is decided ad hoc: callers
//! look the code up here.

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

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
pub enum ErrorCategory {
    Lexer,
    Syntax,
    Block,
    IncludeResolution,
    DependencyResolution,
    Function,
    Reference,
    Filesystem,
    Validation,
    Internal,
    Edge,
    SourceResolution,
}

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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lexer
    UnterminatedString,
    UnterminatedComment,
    InvalidCharacter,
    InvalidEscapeSequence,
    InvalidNumber,

    // Syntax
    UnexpectedToken,
    MissingClosingBrace,
    MissingEquals,
    UnexpectedEof,

    // Block
    UnknownBlockType,
    MissingBlockLabel,
    DuplicateBlock,
    MalformedBlock,

    // Include resolution
    IncludeNotFound,
    IncludeCycle,
    InvalidIncludePath,

    // Dependency resolution
    DependencyNotFound,
    DependencyCycle,
    MissingConfigPath,

    // Functions
    UnknownFunction,
    InvalidFunctionArguments,

    // References
    UndefinedReference,
    InvalidTraversal,

    // Filesystem
    FileNotFound,
    FileReadFailed,
    PermissionDenied,

    // Validation
    InvalidAttributeValue,
    MissingRequiredAttribute,
    InvalidContext,

    // Internal
    InternalError,

    // Edges
    InvalidEdgeOption,
    SelfReferentialEdge,
    InvalidEvidence,
    MissingEdgeField,

    // Source resolution
    EmptySource,
    UnresolvableSource,
    ResolverFailure,
}

/// Fixed handling metadata attached to an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeInfo {
    pub category: ErrorCategory,
    pub severity: Severity,
    pub recoverable: bool,
    pub suggestion: &'static str,
}

const fn info(
    category: ErrorCategory,
    severity: Severity,
    recoverable: bool,
    suggestion: &'static str,
) -> CodeInfo {
    CodeInfo { category, severity, recoverable, suggestion }
}

impl ErrorCode {
    pub const fn info(&self) -> CodeInfo {
        use ErrorCategory as C;
        use ErrorCode::*;
        use Severity as S;
        match self {
            UnterminatedString => info(C::Lexer, S::Error, true, "Close the string literal with a matching double quote"),
            UnterminatedComment => info(C::Lexer, S::Error, true, "Close the block comment with '*/'"),
            InvalidCharacter => info(C::Lexer, S::Error, true, "Remove the unexpected character or quote it inside a string"),
            InvalidEscapeSequence => info(C::Lexer, S::Warning, true, "Use a supported escape sequence such as \\n, \\t, \\\" or \\\\"),
            InvalidNumber => info(C::Lexer, S::Error, true, "Check the numeric literal for stray characters"),

            UnexpectedToken => info(C::Syntax, S::Error, true, "Check the expression syntax near the reported position"),
            MissingClosingBrace => info(C::Syntax, S::Error, true, "Add the missing '}' to close the block"),
            MissingEquals => info(C::Syntax, S::Error, true, "Attributes are written as 'name = value'"),
            UnexpectedEof => info(C::Syntax, S::Error, false, "The file ended inside a construct; check for unbalanced braces or quotes"),

            UnknownBlockType => info(C::Block, S::Warning, true, "Check the block type spelling or remove the block"),
            MissingBlockLabel => info(C::Block, S::Error, true, "Add the label the block type requires, e.g. include \"root\" { ... }"),
            DuplicateBlock => info(C::Block, S::Warning, true, "Remove or rename the duplicated block"),
            MalformedBlock => info(C::Block, S::Error, true, "Fix the block body; attributes parsed so far were kept"),

            IncludeNotFound => info(C::IncludeResolution, S::Error, true, "Check that the include path points at an existing configuration"),
            IncludeCycle => info(C::IncludeResolution, S::Error, true, "Break the include cycle so that configurations form a hierarchy"),
            InvalidIncludePath => info(C::IncludeResolution, S::Error, true, "Use a path or find_in_parent_folders() for the include path"),

            DependencyNotFound => info(C::DependencyResolution, S::Error, true, "Check the dependency config_path or provide mock_outputs"),
            DependencyCycle => info(C::DependencyResolution, S::Error, true, "Remove one of the dependencies forming the cycle"),
            MissingConfigPath => info(C::DependencyResolution, S::Error, true, "Dependency blocks require a config_path attribute"),

            UnknownFunction => info(C::Function, S::Warning, true, "Check the function name against the supported built-in functions"),
            InvalidFunctionArguments => info(C::Function, S::Warning, true, "Check the number and type of function arguments"),

            UndefinedReference => info(C::Reference, S::Warning, true, "Define the referenced local, dependency or input before using it"),
            InvalidTraversal => info(C::Reference, S::Warning, true, "Check the attribute path of the reference"),

            FileNotFound => info(C::Filesystem, S::Fatal, false, "Check that the file exists and the path is correct"),
            FileReadFailed => info(C::Filesystem, S::Fatal, false, "Check file permissions and encoding"),
            PermissionDenied => info(C::Filesystem, S::Fatal, false, "Grant read access to the scanned directory"),

            InvalidAttributeValue => info(C::Validation, S::Error, true, "Check the attribute value against the expected type"),
            MissingRequiredAttribute => info(C::Validation, S::Error, true, "Add the required attribute"),
            InvalidContext => info(C::Validation, S::Error, false, "Provide scanId, tenantId, repositoryRoot and a well-formed module map"),

            InternalError => info(C::Internal, S::Fatal, false, "This is a bug; please report it with the input that triggered it"),

            InvalidEdgeOption => info(C::Edge, S::Error, true, "Check the edge option against its allowed values"),
            SelfReferentialEdge => info(C::Edge, S::Error, true, "An edge cannot point from a node to itself"),
            InvalidEvidence => info(C::Edge, S::Error, true, "Evidence needs a location, a description and a confidence in 0..=100"),
            MissingEdgeField => info(C::Edge, S::Error, true, "Provide the required edge field"),

            EmptySource => info(C::SourceResolution, S::Warning, true, "Set the module source attribute"),
            UnresolvableSource => info(C::SourceResolution, S::Warning, true, "Check the module source expression"),
            ResolverFailure => info(C::SourceResolution, S::Error, true, "The source resolver failed; the reference was recorded as unresolved"),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.info().category
    }

    pub fn severity(&self) -> Severity {
        self.info().severity
    }

    pub fn is_recoverable(&self) -> bool {
        self.info().recoverable
    }

    pub fn suggestion(&self) -> &'static str {
        self.info().suggestion
    }
}
