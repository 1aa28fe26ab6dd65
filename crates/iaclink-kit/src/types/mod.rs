pub mod error_codes;
pub mod errors;
pub mod evidence;
pub mod ids;
pub mod location;

pub use error_codes::{ErrorCategory, ErrorCode, Severity};
