//! # Validation Module
//!
//! Input validation for product creation requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (form / CLI flags)                                 │
//! │  └── Type parsing (numbers are numbers)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── name present and bounded                                          │
//! │  ├── price finite and non-negative                                     │
//! │  ├── tax finite (0-100 expected, not enforced)                         │
//! │  └── type empty or one of KNOWN_PRODUCT_TYPES                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Submission coordinator                                       │
//! │  └── only validated input is queued or sent                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A non-finite price would serialize as JSON `null` and make the whole
//! persisted offline list unreadable, so it is rejected here.

use crate::error::ValidationError;
use crate::types::NewProduct;
use crate::{KNOWN_PRODUCT_TYPES, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a search query.
const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use catalog_core::validation::validate_product_name;
///
/// assert_eq!(validate_product_name("  Pen ").unwrap(), "Pen");
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product_name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "product_name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a product type and returns its canonical spelling.
///
/// Empty means "unset" and is allowed. Matching is case-insensitive.
///
/// ## Example
/// ```rust
/// use catalog_core::validation::validate_product_type;
///
/// assert_eq!(validate_product_type("stationery").unwrap(), "Stationery");
/// assert_eq!(validate_product_type("").unwrap(), "");
/// assert!(validate_product_type("Spaceships").is_err());
/// ```
pub fn validate_product_type(product_type: &str) -> ValidationResult<String> {
    let product_type = product_type.trim();

    if product_type.is_empty() {
        return Ok(String::new());
    }

    KNOWN_PRODUCT_TYPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(product_type))
        .map(|known| known.to_string())
        .ok_or_else(|| ValidationError::NotAllowed {
            field: "product_type".to_string(),
            allowed: KNOWN_PRODUCT_TYPES.iter().map(|s| s.to_string()).collect(),
        })
}

/// Validates a search query.
///
/// Empty is allowed (matches everything). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price.
///
/// ## Rules
/// - Must be finite
/// - Must be non-negative (zero is allowed)
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax percentage.
///
/// Only finiteness is checked; the 0-100 range is a convention the server
/// does not enforce either.
pub fn validate_tax(tax: f64) -> ValidationResult<()> {
    if !tax.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "tax".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validator
// =============================================================================

/// Validates a whole creation request and returns it normalized
/// (trimmed name, canonical type).
///
/// ## Example
/// ```rust
/// use catalog_core::{validation::validate_new_product, NewProduct};
///
/// let input = NewProduct::new(" Pen ", "stationery", 10.0, 5.0);
/// let clean = validate_new_product(input).unwrap();
/// assert_eq!(clean.product_name, "Pen");
/// assert_eq!(clean.product_type, "Stationery");
/// ```
pub fn validate_new_product(input: NewProduct) -> ValidationResult<NewProduct> {
    let product_name = validate_product_name(&input.product_name)?;
    let product_type = validate_product_type(&input.product_type)?;
    validate_price(input.price)?;
    validate_tax(input.tax)?;

    Ok(NewProduct {
        product_name,
        product_type,
        price: input.price,
        tax: input.tax,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coca-Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_product_type() {
        assert_eq!(validate_product_type("GROCERY").unwrap(), "Grocery");
        assert_eq!(validate_product_type("  ").unwrap(), "");
        assert!(matches!(
            validate_product_type("Boats"),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(10.99).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_tax_range_not_enforced() {
        assert!(validate_tax(0.0).is_ok());
        assert!(validate_tax(150.0).is_ok());
        assert!(validate_tax(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  pen ").unwrap(), "pen");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_new_product_reports_first_error() {
        let input = NewProduct::new("", "Nope", -1.0, 5.0);
        assert!(matches!(
            validate_new_product(input),
            Err(ValidationError::Required { .. })
        ));
    }
}
