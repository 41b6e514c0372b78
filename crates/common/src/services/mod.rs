//! Application services shared by the binaries

pub mod catalog;

pub use catalog::{CatalogService, HomeView};
