//! HTTP surface.
//!
//! ```text
//! /                    GET     status
//! /auth/*              POST    register, register-admin, login, refresh-token
//! /users               POST    register (role normal)
//! /clients[/{id}]      CRUD    bearer; delete admin-only
//! /products[/{id}]     CRUD    bearer, multipart; delete admin-only
//! /orders[/{id}]       CRUD    bearer; delete admin-only
//! ```

pub mod auth;
pub mod clients;
pub mod orders;
pub mod products;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .merge(auth::router())
        .merge(clients::router())
        .merge(products::router())
        .merge(orders::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "online" }))
}
