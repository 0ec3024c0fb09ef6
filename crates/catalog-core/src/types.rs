//! # Domain Types
//!
//! Core domain types used throughout the catalog client.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   NewProduct    │   │    Product      │   │   ProductRecord     │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  form input     │──►│  id (UUID)      │◄─►│  wire + persisted   │   │
//! │  │  (no id yet)    │   │  is_favorite    │   │  shape (exact API   │   │
//! │  │                 │   │  is_user_added  │   │  field names)       │   │
//! │  └─────────────────┘   └─────────────────┘   └──────────┬──────────┘   │
//! │                                                         │              │
//! │                                              ┌──────────▼──────────┐   │
//! │                                              │  PendingSubmission  │   │
//! │                                              │  record + id +      │   │
//! │                                              │  queued_at          │   │
//! │                                              │  (image bytes are   │   │
//! │                                              │   never persisted)  │   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! The remote API never returns ids. Every product gets a UUID v4 on the
//! client: fetched products when they are loaded, user-created products when
//! the form is submitted. A queued product keeps its id through replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// New Product (form input)
// =============================================================================

/// User input for a product that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    /// Empty when the user did not pick a category.
    #[serde(default)]
    pub product_type: String,
    pub price: f64,
    pub tax: f64,
}

impl NewProduct {
    pub fn new(
        product_name: impl Into<String>,
        product_type: impl Into<String>,
        price: f64,
        tax: f64,
    ) -> Self {
        NewProduct {
            product_name: product_name.into(),
            product_type: product_type.into(),
            price,
            tax,
        }
    }
}

// =============================================================================
// Product Record (wire / persisted shape)
// =============================================================================

/// A product as the remote API and the offline store see it.
///
/// Field names match the API contract exactly:
/// `image`, `price`, `product_name`, `product_type`, `tax`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// URL of an externally hosted image.
    #[serde(default)]
    pub image: Option<String>,

    pub price: f64,

    pub product_name: String,

    #[serde(default)]
    pub product_type: String,

    /// Percentage, expected 0-100.
    pub tax: f64,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog item as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Client-generated identifier (UUID v4).
    pub id: String,

    /// URL of an externally hosted image.
    pub image: Option<String>,

    pub price: f64,

    pub product_name: String,

    /// One of [`crate::KNOWN_PRODUCT_TYPES`] for user-created items, empty if unset.
    pub product_type: String,

    /// Tax percentage.
    pub tax: f64,

    /// Toggled by the user after creation.
    pub is_favorite: bool,

    /// True for items created on this client. Never changes after creation.
    pub is_user_added: bool,
}

impl Product {
    /// Builds a client-created product with a fresh id.
    pub fn user_added(input: NewProduct) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            image: None,
            price: input.price,
            product_name: input.product_name,
            product_type: input.product_type,
            tax: input.tax,
            is_favorite: false,
            is_user_added: true,
        }
    }

    /// Builds a server-fetched product with a fresh id.
    pub fn from_remote(record: ProductRecord) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            image: record.image,
            price: record.price,
            product_name: record.product_name,
            product_type: record.product_type,
            tax: record.tax,
            is_favorite: false,
            is_user_added: false,
        }
    }

    /// Returns the wire/persisted representation of this product.
    pub fn record(&self) -> ProductRecord {
        ProductRecord {
            image: self.image.clone(),
            price: self.price,
            product_name: self.product_name.clone(),
            product_type: self.product_type.clone(),
            tax: self.tax,
        }
    }
}

// =============================================================================
// Pending Submission
// =============================================================================

/// A product creation request waiting for the network.
///
/// Serialized form:
/// ```json
/// {"id":"…","image":null,"price":10.0,"product_name":"Pen",
///  "product_type":"Stationery","tax":5.0,"queued_at":"2024-01-01T00:00:00Z"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSubmission {
    /// Id of the product this submission will become.
    pub id: String,

    #[serde(flatten)]
    pub record: ProductRecord,

    pub queued_at: DateTime<Utc>,

    /// Raw JPEG bytes picked with the form. Not persisted.
    #[serde(skip)]
    pub image_bytes: Option<Vec<u8>>,
}

impl PendingSubmission {
    /// Creates a submission for a product that was just created offline.
    pub fn new(product: &Product, image_bytes: Option<Vec<u8>>) -> Self {
        PendingSubmission {
            id: product.id.clone(),
            record: product.record(),
            queued_at: Utc::now(),
            image_bytes,
        }
    }

    /// Rebuilds the user-added product once the server confirmed it.
    pub fn into_product(self) -> Product {
        Product {
            id: self.id,
            image: self.record.image,
            price: self.record.price,
            product_name: self.record.product_name,
            product_type: self.record.product_type,
            tax: self.record.tax,
            is_favorite: false,
            is_user_added: true,
        }
    }
}

// =============================================================================
// Submission Outcome
// =============================================================================

/// What the caller learns about a creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Stored locally; will be replayed when connectivity returns.
    Queued,
    /// Accepted by the server and added to the catalog.
    Confirmed(Product),
    /// Rejected, unreachable, or unparseable response. Nothing was stored.
    Failed,
}

impl SubmissionOutcome {
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmissionOutcome::Confirmed(_))
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        matches!(self, SubmissionOutcome::Queued)
    }
}

impl std::fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionOutcome::Queued => write!(f, "queued"),
            SubmissionOutcome::Confirmed(_) => write!(f, "confirmed"),
            SubmissionOutcome::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> NewProduct {
        NewProduct::new("Pen", "Stationery", 10.0, 5.0)
    }

    #[test]
    fn test_user_added_product_defaults() {
        let product = Product::user_added(pen());
        assert!(product.is_user_added);
        assert!(!product.is_favorite);
        assert!(product.image.is_none());
        assert!(Uuid::parse_str(&product.id).is_ok());
    }

    #[test]
    fn test_user_added_ids_are_unique() {
        let a = Product::user_added(pen());
        let b = Product::user_added(pen());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_remote_product_is_not_user_added() {
        let record = ProductRecord {
            image: Some("https://img.example/pen.jpg".into()),
            price: 2.5,
            product_name: "Pen".into(),
            product_type: "Stationery".into(),
            tax: 18.0,
        };
        let product = Product::from_remote(record.clone());
        assert!(!product.is_user_added);
        assert_eq!(product.record(), record);
    }

    #[test]
    fn test_record_parses_api_shape_without_image() {
        let json = r#"{"price": 99.5, "product_name": "Mug", "product_type": "Grocery", "tax": 12}"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();
        assert!(record.image.is_none());
        assert_eq!(record.tax, 12.0);
        assert_eq!(record.product_name, "Mug");
    }

    #[test]
    fn test_pending_submission_serializes_flat_fields() {
        let product = Product::user_added(pen());
        let pending = PendingSubmission::new(&product, Some(vec![0xFF, 0xD8]));
        let value = serde_json::to_value(&pending).unwrap();

        assert_eq!(value["product_name"], "Pen");
        assert_eq!(value["product_type"], "Stationery");
        assert_eq!(value["price"], 10.0);
        assert_eq!(value["tax"], 5.0);
        assert!(value["image"].is_null());
        assert!(value.get("image_bytes").is_none());
        assert!(value.get("record").is_none());
    }

    #[test]
    fn test_pending_submission_keeps_product_id() {
        let product = Product::user_added(pen());
        let pending = PendingSubmission::new(&product, None);
        let restored = pending.into_product();
        assert_eq!(restored.id, product.id);
        assert!(restored.is_user_added);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SubmissionOutcome::Queued.to_string(), "queued");
        assert_eq!(SubmissionOutcome::Failed.to_string(), "failed");
        assert!(SubmissionOutcome::Queued.is_queued());
        assert!(!SubmissionOutcome::Failed.is_confirmed());
    }
}
