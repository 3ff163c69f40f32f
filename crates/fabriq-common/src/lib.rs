//! Shared foundations for Fabriq services: configuration loading,
//! configuration errors, and logging initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use config::ConfigLoader;
pub use error::ConfigurationError;
