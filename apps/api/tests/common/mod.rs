//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use shopdesk_api::config::ApiConfig;
use shopdesk_api::images::{ImageStore, UploadError};
use shopdesk_api::{router, AppState};
use shopdesk_core::{NewUser, Role};
use shopdesk_db::{Database, DbConfig};

pub const BOUNDARY: &str = "shopdesk-test-boundary";

/// Image store that never touches the network.
pub struct StubImages {
    pub fail: bool,
}

#[async_trait]
impl ImageStore for StubImages {
    async fn upload(
        &self,
        filename: &str,
        _content_type: Option<&str>,
        _bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Timeout);
        }
        Ok(format!("https://img.test/{filename}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_images(StubImages { fail: false }).await
    }

    pub async fn with_failing_uploads() -> Self {
        Self::with_images(StubImages { fail: true }).await
    }

    async fn with_images(images: StubImages) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig::from_builder(
            ApiConfig::defaults()
                .unwrap()
                .set_override("secret_key", "integration-secret")
                .unwrap(),
        )
        .unwrap();

        let state = AppState::new(db, config, Arc::new(images));
        TestApp {
            router: router(state.clone()),
            state,
        }
    }

    /// Insert a user directly and return a valid bearer token for it.
    ///
    /// The stored hash is a placeholder; use the register/login routes when
    /// the password matters.
    pub async fn token_for(&self, email: &str, role: Role) -> String {
        self.state
            .db
            .users()
            .create(&NewUser {
                name: "Test User".into(),
                email: email.into(),
                password_hash: "not-a-hash".into(),
                role,
            })
            .await
            .unwrap();
        self.state.jwt.issue_token(email).unwrap()
    }

    pub async fn normal_token(&self) -> String {
        self.token_for("staff@shop.test", Role::Normal).await
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin@shop.test", Role::Admin).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(bearer(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(bearer(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let builder = match token {
            Some(token) => bearer(method, uri, token),
            None => Request::builder().method(method).uri(uri),
        };
        self.send(
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        image: Option<&[u8]>,
    ) -> (StatusCode, Value) {
        self.send(
            bearer(method, uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(fields, image)))
                .unwrap(),
        )
        .await
    }

    /// Create a client through the API and return its id.
    pub async fn create_client(&self, token: &str, email: &str, cpf: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                "/clients",
                Some(token),
                serde_json::json!({ "name": "Ana", "email": email, "cpf": cpf }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Create a product through the API and return its id.
    pub async fn create_product(&self, token: &str, barcode: &str, price: &str, quantity: &str) -> i64 {
        let expiration = future_date();
        let fields = product_fields(barcode, price, quantity, &expiration);
        let (status, body) = self
            .multipart(Method::POST, "/products", token, &fields, Some(b"png-bytes"))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

pub fn bearer(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

/// An expiration one year out, in `dd/mm/yyyy`.
pub fn future_date() -> String {
    (Utc::now() + Duration::days(365))
        .date_naive()
        .format("%d/%m/%Y")
        .to_string()
}

pub fn product_fields<'a>(
    barcode: &'a str,
    price: &'a str,
    quantity: &'a str,
    expiration: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", "Ground Coffee"),
        ("description", "500g bag"),
        ("category", "Beverages"),
        ("price", price),
        ("barcode", barcode),
        ("quantity", quantity),
        ("expiration", expiration),
    ]
}

pub fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"coffee.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
