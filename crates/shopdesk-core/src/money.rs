//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    19.99 * 100 = 1998.9999999999998  ❌ WRONG!                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "19.99" is parsed digit by digit into 1999 cents                    │
//! │    Storage, totals and comparisons never see a float                   │
//! │    Only the JSON response converts back to major units                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Or parse what the caller typed, in major units
//! let typed = Money::parse_major("10.99").unwrap();
//! assert_eq!(price, typed);
//!
//! // Arithmetic is checked: overflow yields None instead of wrapping
//! let total = price
//!     .checked_multiply_quantity(2)
//!     .and_then(|line| line.checked_add(Money::from_cents(500)));
//! assert_eq!(total.map(|t| t.cents()), Some(2698));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: matches SQLite INTEGER and keeps subtraction total
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: use [`Money::to_major`] at the HTTP edge
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  "19.99" (form) ──► Product.price ──► OrderItem.unit_price (snapshot)   │
/// │                                              │                          │
/// │                                              ▼                          │
/// │                           Order.total = Σ unit_price × quantity         │
/// │                                              │                          │
/// │                                              ▼                          │
/// │                                    19.99 (JSON, major units)            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount in major units into cents.
    ///
    /// Accepts an optional leading `-`, an integer part and up to any number
    /// of fraction digits. Digits past the second decimal round half away
    /// from zero, so `"10.995"` becomes 1100 cents. No float is involved.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("25").unwrap().cents(), 2500);
    /// assert_eq!(Money::parse_major("19.9").unwrap().cents(), 1990);
    /// assert_eq!(Money::parse_major("0.015").unwrap().cents(), 2);
    /// assert!(Money::parse_major("abc").is_err());
    /// ```
    pub fn parse_major(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a number"));
        }

        let major: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("amount too large"))?
        };

        let mut digits = frac_part.bytes().map(|b| (b - b'0') as i64);
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().map(|d| d >= 5).unwrap_or(false);

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units, for JSON responses.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1999).to_major(), 19.99);
    /// ```
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.checked_multiply_quantity(3).unwrap();
    /// assert_eq!(line_total.cents(), 897);
    ///
    /// assert!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3).is_none());
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Coffee 2.99 (snapshot)
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Added to Order.total: 8.97
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount in major units with two decimals.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
