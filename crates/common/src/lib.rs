//! DOF Archive Common Library
//!
//! Shared code for the DOF archive API including:
//! - Configuration management
//! - Error types and HTTP mapping
//! - Database models and repository
//! - PDF resolution and download bundling
//! - Publication tree assembly
//! - Metrics helpers

pub mod assembly;
pub mod bundle;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod pdf;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use pdf::PdfResolver;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
