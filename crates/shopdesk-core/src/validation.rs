//! # Validation Module
//!
//! Input validation utilities for Shopdesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Malformed bodies rejected before any handler runs                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── CPF, email, price, stock and date rules                          │
//! │  └── Order shape (non-empty, positive quantities)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints (email, cpf, barcode)                          │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::validation::{clean_cpf, validate_cpf};
//!
//! assert_eq!(clean_cpf("529.982.247-25"), "52998224725");
//! assert!(validate_cpf("529.982.247-25").is_ok());
//! assert!(validate_cpf("111.111.111-11").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ClientInput, NewOrder, ProductInput};
use crate::CPF_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Cheapest price a product may carry, in cents.
pub const MIN_PRICE_CENTS: i64 = 100;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;
const MAX_TEXT_LEN: usize = 2000;
const MAX_PASSWORD_LEN: usize = 128;

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a trimmed field is present and not longer than `max`.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a person or product name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name, MAX_NAME_LEN)
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@` with something on both sides
/// - A dot somewhere in the domain part, not at either end
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_email;
///
/// assert!(validate_email("ana@shop.test").is_ok());
/// assert!(validate_email("ana@shop").is_err());
/// assert!(validate_email("@shop.test").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email, MAX_EMAIL_LEN)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a plaintext password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// CPF
// =============================================================================

/// Strips everything that is not an ASCII digit.
pub fn clean_cpf(cpf: &str) -> String {
    cpf.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validates a CPF and returns its cleaned form.
///
/// ## Rules
/// ```text
/// "529.982.247-25" ──► clean ──► "52998224725"
///                                    │
///                     11 digits? ────┤ no ──► InvalidCpf
///                                    │
///               all the same digit? ─┤ yes ─► InvalidCpf
///                                    │
///                                    ▼
///                                   Ok
/// ```
/// Only the format is checked; check digits are not verified.
pub fn validate_cpf(cpf: &str) -> ValidationResult<String> {
    let cleaned = clean_cpf(cpf);

    if cleaned.len() != CPF_LENGTH {
        return Err(ValidationError::InvalidCpf);
    }

    let first = cleaned.as_bytes()[0];
    if cleaned.bytes().all(|b| b == first) {
        return Err(ValidationError::InvalidCpf);
    }

    Ok(cleaned)
}

// =============================================================================
// Product Rules
// =============================================================================

/// Rejects prices under one major unit.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.cents() < MIN_PRICE_CENTS {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(())
}

/// Rejects stock levels under one.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity);
    }
    Ok(())
}

/// Parses an expiration date written as `dd/mm/yyyy` or `yyyy-mm-dd`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use shopdesk_core::validation::parse_expiration;
///
/// let expected = NaiveDate::from_ymd_opt(2031, 12, 25).unwrap();
/// assert_eq!(parse_expiration("25/12/2031").unwrap(), expected);
/// assert_eq!(parse_expiration("2031-12-25").unwrap(), expected);
/// assert!(parse_expiration("31/02/2031").is_err());
/// ```
pub fn parse_expiration(input: &str) -> ValidationResult<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .map_err(|_| ValidationError::InvalidDateFormat)
}

/// Rejects expiration dates before `today`. Today itself is accepted.
pub fn validate_expiration(expiration: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if expiration < today {
        return Err(ValidationError::InvalidExpiration);
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates client input and returns it with the CPF cleaned and the
/// text fields trimmed.
///
/// CPF is checked first so a bad CPF is always reported as such.
pub fn validate_client_input(input: &ClientInput) -> ValidationResult<ClientInput> {
    let cpf = validate_cpf(&input.cpf)?;
    validate_name(&input.name)?;
    validate_email(&input.email)?;

    Ok(ClientInput {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        cpf,
    })
}

/// Validates product input against the catalog rules.
///
/// ## Order of checks
/// price → quantity → expiration → text fields
pub fn validate_product_input(input: &ProductInput, today: NaiveDate) -> ValidationResult<()> {
    validate_price(input.price)?;
    validate_stock_quantity(input.quantity)?;
    validate_expiration(input.expiration, today)?;

    validate_name(&input.name)?;
    validate_required("barcode", &input.barcode, MAX_NAME_LEN)?;
    validate_required("category", &input.category, MAX_NAME_LEN)?;
    if input.description.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates the shape of an order request.
///
/// ## Rules
/// - At least one line item
/// - Every line quantity >= 1
///
/// Stock and existence are checked later, inside the placement transaction.
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    if order.items.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }

    if order.items.iter().any(|item| item.quantity < 1) {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewOrderItem;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product_input() -> ProductInput {
        ProductInput {
            name: "Coffee 500g".to_string(),
            description: "Dark roast".to_string(),
            category: "Grocery".to_string(),
            price: Money::from_cents(1999),
            barcode: "7891000100103".to_string(),
            quantity: 10,
            expiration: date(2031, 1, 1),
            image: None,
        }
    }

    #[test]
    fn test_clean_cpf() {
        assert_eq!(clean_cpf("529.982.247-25"), "52998224725");
        assert_eq!(clean_cpf(" 529 982 247 25 "), "52998224725");
        assert_eq!(clean_cpf("abc"), "");
    }

    #[test]
    fn test_validate_cpf_accepts_formatted_and_plain() {
        assert_eq!(validate_cpf("529.982.247-25").unwrap(), "52998224725");
        assert_eq!(validate_cpf("52998224725").unwrap(), "52998224725");
    }

    #[test]
    fn test_validate_cpf_rejects_repeated_digits() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(11);
            assert_eq!(validate_cpf(&cpf), Err(ValidationError::InvalidCpf));
        }
        assert_eq!(validate_cpf("111.111.111-11"), Err(ValidationError::InvalidCpf));
    }

    #[test]
    fn test_validate_cpf_rejects_wrong_length() {
        assert_eq!(validate_cpf("1234567890"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf("123456789012"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf(""), Err(ValidationError::InvalidCpf));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@shop.test").is_ok());
        assert!(validate_email("  ana@shop.test ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("ana@@shop.test").is_err());
        assert!(validate_email("ana@shop.").is_err());
        assert!(validate_email("a na@shop.test").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::from_cents(100)).is_ok());
        assert_eq!(validate_price(Money::from_cents(99)), Err(ValidationError::InvalidPrice));
        assert_eq!(validate_price(Money::zero()), Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(1).is_ok());
        assert_eq!(validate_stock_quantity(0), Err(ValidationError::InvalidQuantity));
        assert_eq!(validate_stock_quantity(-3), Err(ValidationError::InvalidQuantity));
    }

    #[test]
    fn test_parse_expiration_formats() {
        assert_eq!(parse_expiration("01/02/2030").unwrap(), date(2030, 2, 1));
        assert_eq!(parse_expiration("2030-02-01").unwrap(), date(2030, 2, 1));
        assert_eq!(parse_expiration("02-01-2030"), Err(ValidationError::InvalidDateFormat));
        assert_eq!(parse_expiration("tomorrow"), Err(ValidationError::InvalidDateFormat));
    }

    #[test]
    fn test_validate_expiration_today_is_fine() {
        let today = date(2026, 5, 10);
        assert!(validate_expiration(today, today).is_ok());
        assert!(validate_expiration(date(2026, 5, 11), today).is_ok());
        assert_eq!(
            validate_expiration(date(2026, 5, 9), today),
            Err(ValidationError::InvalidExpiration)
        );
    }

    #[test]
    fn test_validate_client_input_cleans() {
        let input = ClientInput {
            name: " Ana Souza ".to_string(),
            email: "ana@shop.test".to_string(),
            cpf: "529.982.247-25".to_string(),
        };
        let cleaned = validate_client_input(&input).unwrap();
        assert_eq!(cleaned.name, "Ana Souza");
        assert_eq!(cleaned.cpf, "52998224725");
    }

    #[test]
    fn test_validate_client_input_reports_cpf_first() {
        let input = ClientInput {
            name: String::new(),
            email: "bad".to_string(),
            cpf: "000.000.000-00".to_string(),
        };
        assert_eq!(validate_client_input(&input), Err(ValidationError::InvalidCpf));
    }

    #[test]
    fn test_validate_product_input() {
        let today = date(2026, 1, 1);
        assert!(validate_product_input(&product_input(), today).is_ok());

        let cheap = ProductInput {
            price: Money::from_cents(50),
            ..product_input()
        };
        assert_eq!(validate_product_input(&cheap, today), Err(ValidationError::InvalidPrice));

        let empty = ProductInput {
            quantity: 0,
            ..product_input()
        };
        assert_eq!(validate_product_input(&empty, today), Err(ValidationError::InvalidQuantity));

        let expired = ProductInput {
            expiration: date(2025, 12, 31),
            ..product_input()
        };
        assert_eq!(
            validate_product_input(&expired, today),
            Err(ValidationError::InvalidExpiration)
        );

        let unnamed = ProductInput {
            name: "  ".to_string(),
            ..product_input()
        };
        assert!(matches!(
            validate_product_input(&unnamed, today),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_new_order() {
        let ok = NewOrder {
            client_id: 1,
            items: vec![NewOrderItem {
                product_id: 1,
                quantity: 2,
            }],
        };
        assert!(validate_new_order(&ok).is_ok());

        let empty = NewOrder {
            client_id: 1,
            items: vec![],
        };
        assert_eq!(validate_new_order(&empty), Err(ValidationError::EmptyOrder));

        let zero = NewOrder {
            client_id: 1,
            items: vec![NewOrderItem {
                product_id: 1,
                quantity: 0,
            }],
        };
        assert!(matches!(
            validate_new_order(&zero),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
