/// EventDesk Core - Shared library for the EventDesk backend
///
/// This crate contains the entity models, the persistence abstraction and the
/// thin wrappers around the AWS services used by the API Lambda.
pub mod auth;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use error::EventDeskError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
