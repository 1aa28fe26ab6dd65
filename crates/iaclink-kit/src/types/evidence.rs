//! Located observations supporting a graph relationship.
//!
//! Detectors hand evidence to the edge factory, which aggregates the
//! individual confidences into the confidence of the edge. An `Evidence`
//! value is immutable once built: the checked constructor rejects scores
//! outside `0..=100` while [`EvidenceBuilder`] clamps them.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use super::location::SourceLocation;

pub const MIN_CONFIDENCE: i64 = 0;
pub const MAX_CONFIDENCE: i64 = 100;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("confidence {value} is outside the range 0..=100")]
    ConfidenceOutOfRange { value: i64 },

    #[error("evidence is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("evidence location '{0}' is not a valid line range")]
    InvalidLocation(String),
}

/// How the relationship was observed
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidenceType {
    /// Written out in the configuration (an `include` block, a `source` attribute)
    Explicit,
    /// Derived from the meaning of an expression (`dependency.vpc.outputs.id`)
    Inferred,
    /// Guessed from naming or layout conventions
    Heuristic,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    location: SourceLocation,
    #[serde(default)]
    snippet: String,
    confidence: u8,
    evidence_type: EvidenceType,
    description: String,
}

impl Evidence {
    /// Checked constructor, fails when `confidence` is outside `0..=100`.
    pub fn new(
        location: SourceLocation,
        snippet: impl Into<String>,
        confidence: i64,
        evidence_type: EvidenceType,
        description: impl Into<String>,
    ) -> Result<Evidence, EvidenceError> {
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
            return Err(EvidenceError::ConfidenceOutOfRange { value: confidence });
        }
        Ok(Evidence {
            location,
            snippet: snippet.into(),
            confidence: confidence as u8,
            evidence_type,
            description: description.into(),
        })
    }

    pub fn builder(location: SourceLocation) -> EvidenceBuilder {
        EvidenceBuilder::new(location)
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn evidence_type(&self) -> EvidenceType {
        self.evidence_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_explicit(&self) -> bool {
        self.evidence_type == EvidenceType::Explicit
    }

    /// Copy of this evidence with its confidence multiplied by `factor`,
    /// clamped back into range.
    pub fn scaled(&self, factor: f64) -> Evidence {
        let scaled = (self.confidence as f64 * factor).round() as i64;
        Evidence {
            confidence: scaled.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u8,
            ..self.clone()
        }
    }

    /// Re-checks the invariants of a value that may have been deserialized
    /// from an upstream detector rather than built here.
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if self.confidence as i64 > MAX_CONFIDENCE {
            return Err(EvidenceError::ConfidenceOutOfRange { value: self.confidence as i64 });
        }
        if self.location.file.trim().is_empty() {
            return Err(EvidenceError::MissingField("location.file"));
        }
        if !self.location.is_well_formed() {
            return Err(EvidenceError::InvalidLocation(self.location.to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(EvidenceError::MissingField("description"));
        }
        Ok(())
    }
}

/// Fluent construction of [`Evidence`], clamping the confidence instead of
/// failing.
#[derive(Clone, Debug)]
pub struct EvidenceBuilder {
    location: SourceLocation,
    snippet: String,
    confidence: i64,
    evidence_type: EvidenceType,
    description: String,
}

impl EvidenceBuilder {
    pub fn new(location: SourceLocation) -> Self {
        EvidenceBuilder {
            location,
            snippet: String::new(),
            confidence: MAX_CONFIDENCE,
            evidence_type: EvidenceType::Explicit,
            description: String::new(),
        }
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn confidence(mut self, confidence: i64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn evidence_type(mut self, evidence_type: EvidenceType) -> Self {
        self.evidence_type = evidence_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn build(self) -> Evidence {
        Evidence {
            location: self.location,
            snippet: self.snippet,
            confidence: self.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u8,
            evidence_type: self.evidence_type,
            description: self.description,
        }
    }
}
