//! # Validation Module
//!
//! Input validation for records entered by hand.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI arguments (clap)                                         │
//! │  ├── Types and required arguments                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: business rules                                  │
//! │  ├── Names, codes, quantities, prices, discounts                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Imports do NOT go through these checks: spreadsheet data is coerced
//! instead (see [`crate::coerce`]) so one bad cell never rejects a file.

use crate::error::ValidationError;
use crate::types::{LineInput, Percentage};
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES, MAX_UPLIFT_BPS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a client code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, digits, hyphens, underscores, dots and slashes
///
/// ## Example
/// ```rust
/// use botica_core::validation::validate_client_code;
///
/// assert!(validate_client_code("F-0042").is_ok());
/// assert!(validate_client_code("").is_err());
/// assert!(validate_client_code("has space").is_err());
/// ```
pub fn validate_client_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, '-', '_', '.' and '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates a required name (client name, product name).
pub fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a client name: required, at most 200 characters.
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Loose email check: one `@` with something on both sides and a dot in
/// the domain. Empty is allowed (the field is optional).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty is allowed (lists everything).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: positive and at most [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents. Zero is allowed (free samples).
///
/// ```rust
/// use botica_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// A line discount cannot exceed 100%.
pub fn validate_discount(discount: Percentage) -> ValidationResult<()> {
    if discount.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// The desired uplift is capped at [`MAX_UPLIFT_BPS`].
pub fn validate_uplift(uplift: Percentage) -> ValidationResult<()> {
    if uplift.bps() > MAX_UPLIFT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "uplift".to_string(),
            min: 0,
            max: (MAX_UPLIFT_BPS / 100) as i64,
        });
    }

    Ok(())
}

/// A quarterly target must be positive. Clearing a target is a separate
/// operation (setting zero).
pub fn validate_target_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "target".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates every line of a manually entered order.
pub fn validate_lines(lines: &[LineInput]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    for line in lines {
        validate_name("product", &line.product, 200)?;
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_price.cents())?;
        validate_discount(line.discount)?;
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use botica_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn line(product: &str, quantity: i64, cents: i64, pct: f64) -> LineInput {
        LineInput {
            product: product.to_string(),
            quantity,
            unit_price: Money::from_cents(cents),
            discount: Percentage::from_percentage(pct),
        }
    }

    #[test]
    fn test_validate_client_code() {
        assert!(validate_client_code("F-0042").is_ok());
        assert!(validate_client_code("41/009.A").is_ok());

        assert!(validate_client_code("").is_err());
        assert!(validate_client_code("  ").is_err());
        assert!(validate_client_code("F 42").is_err());
        assert!(validate_client_code(&"9".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_client_name() {
        assert!(validate_client_name("Farmacia Ldo. Pérez").is_ok());
        assert!(validate_client_name("").is_err());
        assert!(validate_client_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("farmacia@example.es").is_ok());
        assert!(validate_email("farmacia").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@example.es").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_percentages() {
        assert!(validate_discount(Percentage::from_percentage(100.0)).is_ok());
        assert!(validate_discount(Percentage::from_percentage(100.5)).is_err());
        assert!(validate_uplift(Percentage::from_percentage(15.0)).is_ok());
        assert!(validate_uplift(Percentage::from_bps(MAX_UPLIFT_BPS + 1)).is_err());
    }

    #[test]
    fn test_validate_lines() {
        assert!(validate_lines(&[line("Paracetamol", 2, 150, 0.0)]).is_ok());
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&[line("", 2, 150, 0.0)]).is_err());
        assert!(validate_lines(&[line("X", 0, 150, 0.0)]).is_err());
        assert!(validate_lines(&[line("X", 1, -1, 0.0)]).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
