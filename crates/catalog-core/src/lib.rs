//! # catalog-core: Pure Domain Logic for the Catalog Client
//!
//! This crate holds the product model, the wire/persisted record shapes,
//! input validation and the search filter. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Catalog Client Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front end (CLI / excluded UI)                   │   │
//! │  │      list ──► search ──► add product ──► pending / sync         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CoordinatorHandle                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          catalog-sync (coordinator, REST client)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐                │   │
//! │  │   │   types   │  │ validation  │  │  search   │                │   │
//! │  │   │  Product  │  │  name/price │  │  filter   │                │   │
//! │  │   │  Record   │  │  tax/type   │  │ favorites │                │   │
//! │  │   └───────────┘  └─────────────┘  └───────────┘                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ProductRecord, PendingSubmission, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for new products
//! - [`search`] - Case-insensitive catalog filtering
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::{NewProduct, Product};
//!
//! let input = NewProduct::new("Pen", "stationery", 10.0, 5.0);
//! let input = catalog_core::validation::validate_new_product(input).unwrap();
//!
//! let product = Product::user_added(input);
//! assert!(product.is_user_added);
//! assert!(!product.is_favorite);
//! ```

pub mod error;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Product categories the client knows about.
///
/// A client-created product must use one of these, or leave the type empty.
/// Products fetched from the server are accepted with any type string.
pub const KNOWN_PRODUCT_TYPES: &[&str] = &[
    "Product",
    "Service",
    "Electronics",
    "Stationery",
    "Grocery",
    "Clothing",
    "Other",
];

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
