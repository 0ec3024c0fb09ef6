//! # Catalog Search
//!
//! Filtering used by the product list's search box.
//!
//! Matching is a case-insensitive substring test against the product name
//! and the product type. An empty query matches everything. Results keep the
//! catalog's order.

use crate::types::Product;

/// Returns the products matching `query`, in catalog order.
///
/// ## Example
/// ```rust
/// use catalog_core::{search::filter_products, NewProduct, Product};
///
/// let catalog = vec![
///     Product::user_added(NewProduct::new("Blue Pen", "Stationery", 1.0, 0.0)),
///     Product::user_added(NewProduct::new("Bread", "Grocery", 2.0, 0.0)),
/// ];
/// let hits = filter_products(&catalog, "pen");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].product_name, "Blue Pen");
/// ```
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();

    if needle.is_empty() {
        return products.iter().collect();
    }

    products
        .iter()
        .filter(|p| {
            p.product_name.to_lowercase().contains(&needle)
                || p.product_type.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Returns the products the user marked as favorite.
pub fn favorites(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_favorite).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewProduct;

    fn catalog() -> Vec<Product> {
        vec![
            Product::user_added(NewProduct::new("Pen", "Stationery", 10.0, 5.0)),
            Product::user_added(NewProduct::new("Laptop", "Electronics", 900.0, 18.0)),
            Product::user_added(NewProduct::new("Notebook", "Stationery", 3.0, 5.0)),
        ]
    }

    #[test]
    fn test_empty_query_matches_all() {
        let products = catalog();
        assert_eq!(filter_products(&products, "  ").len(), 3);
    }

    #[test]
    fn test_matches_type_case_insensitively() {
        let products = catalog();
        let hits = filter_products(&products, "STATION");
        let names: Vec<_> = hits.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["Pen", "Notebook"]);
    }

    #[test]
    fn test_no_match() {
        let products = catalog();
        assert!(filter_products(&products, "guitar").is_empty());
    }

    #[test]
    fn test_favorites() {
        let mut products = catalog();
        products[1].is_favorite = true;
        let favs = favorites(&products);
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].product_name, "Laptop");
    }
}
