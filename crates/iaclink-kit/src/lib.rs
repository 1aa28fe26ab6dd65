#[macro_use]
extern crate serde_derive;

pub mod helpers;
pub mod types;

pub use indexmap;
pub use serde;
pub use serde_json;
pub use uuid;

pub use types::errors::{ErrorCollection, IacError, SerializedError};
pub use types::evidence::{Evidence, EvidenceBuilder, EvidenceError, EvidenceType};
pub use types::ids::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use types::location::SourceLocation;
