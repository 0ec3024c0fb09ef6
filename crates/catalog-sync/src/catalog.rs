//! # Catalog Store
//!
//! The in-memory product list the user browses.
//!
//! Owned by the submission coordinator task; nothing else mutates it. It
//! holds fetched products and products the server confirmed for this client.
//! Pending (queued) products are never in here.

use catalog_core::search;
use catalog_core::{Product, ProductRecord};
use tracing::debug;

/// In-memory list of known products, ids unique.
#[derive(Debug, Default, Clone)]
pub struct CatalogStore {
    products: Vec<Product>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list with freshly fetched records.
    ///
    /// Every record gets a new id, so favorites do not survive a refetch.
    pub fn replace_all(&mut self, records: Vec<ProductRecord>) {
        self.products = records.into_iter().map(Product::from_remote).collect();
        debug!(count = self.products.len(), "Catalog replaced");
    }

    /// Drops every product.
    pub fn clear(&mut self) {
        self.products.clear();
    }

    /// Appends a product. Returns false (and changes nothing) when a product
    /// with the same id is already present.
    pub fn add(&mut self, product: Product) -> bool {
        if self.products.iter().any(|p| p.id == product.id) {
            debug!(id = %product.id, "Product already in catalog");
            return false;
        }
        self.products.push(product);
        true
    }

    /// Flips `is_favorite` and returns the new value, or None if no product
    /// has this id.
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        let product = self.products.iter_mut().find(|p| p.id == id)?;
        product.is_favorite = !product.is_favorite;
        Some(product.is_favorite)
    }

    /// Case-insensitive match on name or type.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        search::filter_products(&self.products, query)
    }

    pub fn favorites(&self) -> Vec<&Product> {
        search::favorites(&self.products)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
