//! # Domain Types
//!
//! Core domain types used throughout Shopdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Client      │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  email (unique) │   │  email (unique) │   │  barcode (uniq) │       │
//! │  │  password hash  │   │  cpf (unique)   │   │  price_cents    │       │
//! │  │  role           │   │                 │   │  quantity       │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │ 1:N                 │ 1:N             │
//! │                        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │                        │     Order       │──►│   OrderItem     │       │
//! │                        │  ─────────────  │1:N│  ─────────────  │       │
//! │                        │  status         │   │  quantity       │       │
//! │                        │  total_cents    │   │  unit_price     │       │
//! │                        └─────────────────┘   │  (snapshot)     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has an integer `id` assigned by the store. Ids only grow, so
//! "newest first" is simply `ORDER BY id DESC`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Authorization role of a back-office user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular staff: read and write, no deletes.
    Normal,
    /// Administrator: may delete clients, products and orders.
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Normal
    }
}

// =============================================================================
// User
// =============================================================================

/// A back-office user who can authenticate against the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Client
// =============================================================================

/// A customer of the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Digits only, exactly 11 of them.
    pub cpf: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client fields as submitted on create and update.
///
/// `cpf` may carry punctuation (`123.456.789-09`); it is cleaned before
/// anything is stored or compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
    pub cpf: String,
}

/// Optional list filters for clients. Matching is case-insensitive substring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its stock level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Price in cents (smallest currency unit).
    pub price_cents: i64,
    pub barcode: String,
    /// Units on hand. Never negative.
    pub quantity: i64,
    pub expiration: NaiveDate,
    /// Public URL of the product image on the image host.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Product fields as submitted on create and update.
///
/// `image` is the URL returned by the image host. On update, `None` keeps
/// the image already stored.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub barcode: String,
    pub quantity: i64,
    pub expiration: NaiveDate,
    pub image: Option<String>,
}

/// Optional list filters for products. Matching is case-insensitive substring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub category: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// Any status may be set at any time; there is no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order header. Line items live in [`OrderItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub status: OrderStatus,
    /// Σ unit_price_cents × quantity over the items, fixed at placement.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in an order.
/// Uses snapshot pattern to freeze the product price at time of placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Product price in cents when the order was placed (frozen).
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A line of an order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// An order request: who is buying and what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: i64,
    pub items: Vec<NewOrderItem>,
}

/// Optional list filters for orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    /// Exact order id.
    pub order_id: Option<i64>,
    /// Exact client id.
    pub client_id: Option<i64>,
    /// Case-insensitive substring of the status name.
    pub status: Option<String>,
}

// =============================================================================
// Pagination
// =============================================================================

/// `limit`/`skip` window for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

fn default_limit() -> i64 {
    crate::DEFAULT_PAGE_SIZE
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: crate::DEFAULT_PAGE_SIZE,
            skip: 0,
        }
    }
}

impl Page {
    pub fn new(limit: i64, skip: i64) -> Self {
        Page { limit, skip }
    }

    /// Clamps the window to sane bounds: limit in 1..=MAX_PAGE_SIZE, skip >= 0.
    pub fn clamped(self) -> Self {
        Page {
            limit: self.limit.clamp(1, crate::MAX_PAGE_SIZE),
            skip: self.skip.max(0),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
