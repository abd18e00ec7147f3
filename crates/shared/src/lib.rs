pub mod errors;
pub mod types;

pub use errors::{AppError, DomainError};
pub use types::*;
