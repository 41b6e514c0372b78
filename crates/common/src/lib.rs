//! Museo Common Library
//!
//! Shared code for the Museo catalog including:
//! - The catalog domain core (artworks, restorations, loans, exhibitions)
//! - Storage collaborators (in-memory and PostgreSQL via SeaORM)
//! - Error types and handling
//! - Configuration management
//! - Authentication and role projection
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::CatalogStore;
pub use errors::{AppError, Result};
pub use services::CatalogService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
