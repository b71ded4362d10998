//! Auth Service Shared Library
//!
//! Wire types and error taxonomy shared between the backend and its clients.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
