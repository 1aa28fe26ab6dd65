use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unable to read '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("unable to parse '{path}' as {format}: {message}")]
    Parse { path: String, format: &'static str, message: String },

    #[error("unknown error code '{0}', run `iaclink explain --list` for the known codes")]
    UnknownErrorCode(String),

    #[error("unable to serialize output: {0}")]
    Output(String),

    #[error(transparent)]
    Linker(#[from] iaclink_core::kit::IacError),
}

impl From<CliError> for String {
    fn from(error: CliError) -> Self {
        error.to_string()
    }
}
