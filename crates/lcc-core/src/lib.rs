#![deny(missing_docs)]
#![doc = "Shared types for the LCC simulation result analysis tools."]

pub mod errors;

pub use errors::{ErrorInfo, LccError};
