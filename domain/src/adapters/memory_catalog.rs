use std::sync::Mutex;

use crate::{CatalogItem, CatalogProvider, CoreError};

/// Simple in-memory catalog. Items are returned in insertion order.
pub struct InMemoryCatalog {
    items: Mutex<Vec<CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn push(&self, item: CatalogItem) -> Result<(), CoreError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| CoreError::Catalog("mutex poisoned".into()))?;
        items.push(item);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<CatalogItem>, CoreError> {
        let items = self
            .items
            .lock()
            .map_err(|_| CoreError::Catalog("mutex poisoned".into()))?;
        Ok(items.clone())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogProvider for InMemoryCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CoreError> {
        self.snapshot()
    }
}
