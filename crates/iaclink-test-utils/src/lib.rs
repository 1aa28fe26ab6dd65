pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use builders::{evidence, BatchBuilder};
pub use iaclink_core::kit;
