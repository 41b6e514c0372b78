//! In-process store, used for development and tests

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::domain::{Catalog, ChangeSet};
use crate::errors::Result;

#[derive(Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing catalog
    pub fn with_catalog(mut catalog: Catalog) -> Self {
        catalog.take_changes();
        Self {
            catalog: RwLock::new(catalog),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn load(&self) -> Result<Catalog> {
        Ok(self.catalog.read().await.clone())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.catalog.write().await.apply(changes);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
