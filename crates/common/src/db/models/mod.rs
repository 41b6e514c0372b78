//! SeaORM entity models
//!
//! One table per catalog entity plus join tables for the many-to-many
//! relations. Enumerations are stored as their snake_case names.

pub mod artwork;
pub mod exhibition;
pub mod links;
pub mod loan;
pub mod loan_request;
pub mod museum;
pub mod museum_contact;
pub mod requested_artwork;
pub mod restoration;
pub mod restorer;
pub mod taxonomy_entry;

pub use links::{artwork_taxonomy, exhibition_artworks, loan_artworks, restoration_team};
