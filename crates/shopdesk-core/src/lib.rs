//! # shopdesk-core: Pure Business Logic for Shopdesk
//!
//! This crate holds the domain of the Shopdesk back-office: users, clients,
//! the product catalog and orders, plus the rules that guard them. It has
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopdesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    /auth  ──►  /clients  ──►  /products  ──►  /orders           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ shopdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   money   │  │ validation│                  │   │
//! │  │   │  Client   │  │   Money   │  │    CPF    │                  │   │
//! │  │   │  Product  │  │  (cents)  │  │  price    │                  │   │
//! │  │   │  Order    │  │           │  │  dates    │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shopdesk-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, repositories, orders         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Client, Product, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopdesk_core::money::Money;
//!
//! // Prices arrive in major units and are stored as cents
//! let price = Money::parse_major("10.99").unwrap();
//! assert_eq!(price.cents(), 1099);
//!
//! let line_total = price.checked_multiply_quantity(3);
//! assert_eq!(line_total, Some(Money::from_cents(3297)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a caller may request in one list call.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Number of digits in a cleaned CPF.
pub const CPF_LENGTH: usize = 11;
