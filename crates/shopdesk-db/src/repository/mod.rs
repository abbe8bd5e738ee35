//! # Repository Module
//!
//! Database repository implementations for Shopdesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.clients().list(&filter, page)                              │
//! │       ▼                                                                 │
//! │  ClientRepository                                                      │
//! │  ├── list(&self, filter, page)                                         │
//! │  ├── get(&self, id)                                                    │
//! │  ├── create(&self, input)   ← validates, checks uniqueness             │
//! │  ├── update(&self, id, input)                                          │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Back-office accounts
//! - [`ClientRepository`](client::ClientRepository) - Customers
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock
//! - [`OrderRepository`](order::OrderRepository) - Order placement and lookup

pub mod client;
pub mod order;
pub mod product;
pub mod user;

/// Builds a `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\`
/// escaped. Use with `ESCAPE '\'`.
///
/// SQLite's `LIKE` already ignores ASCII case.
pub(crate) fn contains_pattern(term: Option<&str>) -> Option<String> {
    let term = term?.trim();
    if term.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}
