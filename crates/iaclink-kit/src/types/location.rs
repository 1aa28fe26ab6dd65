use std::fmt;

/// A line range inside a configuration file
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file: String,
    pub line_start: u32,
    pub line_end: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_end: Option<u32>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line_start: u32, line_end: u32) -> Self {
        SourceLocation { file: file.into(), line_start, line_end, column_start: None, column_end: None }
    }

    pub fn line(file: impl Into<String>, line: u32) -> Self {
        Self::new(file, line, line)
    }

    pub fn with_columns(mut self, column_start: u32, column_end: u32) -> Self {
        self.column_start = Some(column_start);
        self.column_end = Some(column_end);
        self
    }

    /// A location is well formed when it names a file and its lines are
    /// 1-indexed and ordered.
    pub fn is_well_formed(&self) -> bool {
        !self.file.trim().is_empty() && self.line_start >= 1 && self.line_end >= self.line_start
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line_start)?;
        if let Some(column) = self.column_start {
            write!(f, ":{}", column)?;
        }
        if self.line_end != self.line_start {
            write!(f, "-{}", self.line_end)?;
        }
        Ok(())
    }
}
