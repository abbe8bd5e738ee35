//! # Shopdesk API
//!
//! JSON/HTTP back-office API: authentication, clients, products and order
//! placement.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Shopdesk API                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /auth, /users │  │  /clients      │  │  /orders                   ││
//! │  │                │  │  /products     │  │                            ││
//! │  │ • register     │  │                │  │ • place (transactional)    ││
//! │  │ • login        │  │ • CRUD + list  │  │ • list / get               ││
//! │  │ • refresh      │  │ • image upload │  │ • status update / delete   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  Cloudinary  │  │    JWT Auth              ││  │
//! │  │  │ (shopdesk-db)│  │              │  │                          ││  │
//! │  │  │ Primary data │  │ Product      │  │ argon2 passwords         ││  │
//! │  │  │ store        │  │ images       │  │ HMAC bearer tokens       ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config`]):
//! - `DATABASE_URL` - SQLite connection string (default: `sqlite://shopdesk.db`)
//! - `HOST` / `PORT` - bind address (default: `0.0.0.0:8000`)
//! - `SECRET_KEY` - Secret for JWT signing (required)
//! - `ALGORITHM` - HS256, HS384 or HS512 (default: HS256)
//! - `ACCESS_TOKEN_EXPIRE_MINUTES` - token lifetime (default: 30)
//! - `CLOUDINARY_*` - image host credentials
//! - `LOG_FORMAT` - `json` for JSON log lines

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod routes;
pub mod state;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,shopdesk_api=debug,shopdesk_db=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
