//! API handlers module

pub mod artworks;
pub mod exhibitions;
pub mod health;
pub mod loans;
pub mod museums;
pub mod public;
pub mod reports;
pub mod restorations;
pub mod restorers;
pub mod taxonomy;

use serde::Deserialize;

/// `offset`/`limit` query parameters for listings that page
#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Largest page a caller may ask for
pub const MAX_PAGE_SIZE: usize = 100;

impl Paging {
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }
}
