//! Product catalog.
//!
//! Create and update take `multipart/form-data`: the product fields as text
//! parts plus an `image` file part.
//!
//! ```text
//! multipart ──► ProductForm ──► ProductInput ──► validate ──► barcode check
//!                                                                 │
//!                                             image host ◄────────┘
//!                                                  │ secure_url
//!                                                  ▼
//!                                           INSERT / UPDATE
//! ```
//!
//! The image is uploaded only after every other check has passed.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shopdesk_core::money::Money;
use shopdesk_core::validation::{parse_expiration, validate_product_input};
use shopdesk_core::{Page, Product, ProductFilter, ProductInput, ValidationError, DEFAULT_PAGE_SIZE};

use crate::error::ApiError;
use crate::extract::{require_admin, ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

/// Largest accepted multipart body.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

// =============================================================================
// Wire types
// =============================================================================

/// Product as returned to callers; `price` in major units.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductOutput {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub barcode: String,
    pub quantity: i64,
    pub expiration: NaiveDate,
    pub image: Option<String>,
}

impl From<Product> for ProductOutput {
    fn from(product: Product) -> Self {
        ProductOutput {
            id: product.id,
            price: product.price().to_major(),
            name: product.name,
            description: product.description,
            category: product.category,
            barcode: product.barcode,
            quantity: product.quantity,
            expiration: product.expiration,
            image: product.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<ProductOutput>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    name: Option<String>,
    category: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    skip: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

// =============================================================================
// Multipart form
// =============================================================================

struct ImageUpload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Text parts and the optional image part of a product form.
struct ProductForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            } else {
                fields.insert(name, field.text().await?);
            }
        }

        Ok(ProductForm { fields, image })
    }

    fn text(&mut self, field: &str) -> Result<String, ValidationError> {
        self.fields
            .remove(field)
            .ok_or_else(|| ValidationError::Required {
                field: field.to_string(),
            })
    }

    /// Parse the text parts into a product input without an image URL.
    fn input(&mut self) -> Result<ProductInput, ValidationError> {
        let price = Money::parse_major(&self.text("price")?)?;

        let quantity = self.text("quantity")?;
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: "expected an integer".to_string(),
            })?;

        let expiration = parse_expiration(&self.text("expiration")?)?;

        Ok(ProductInput {
            name: self.text("name")?,
            description: self.text("description")?,
            category: self.text("category")?,
            price,
            barcode: self.text("barcode")?,
            quantity,
            expiration,
            image: None,
        })
    }
}

async fn upload(state: &AppState, image: ImageUpload) -> Result<String, ApiError> {
    let url = state
        .images
        .upload(&image.filename, image.content_type.as_deref(), image.bytes)
        .await?;
    Ok(url)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiJson<ProductList>, ApiError> {
    let filter = ProductFilter {
        name: query.name,
        category: query.category,
    };
    let products = state
        .db
        .products()
        .list(&filter, Page::new(query.limit, query.skip))
        .await?;

    Ok(ApiJson(ProductList {
        products: products.into_iter().map(ProductOutput::from).collect(),
    }))
}

async fn create_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, ApiJson<ProductOutput>), ApiError> {
    let mut form = ProductForm::read(multipart?).await?;
    let mut input = form.input()?;

    validate_product_input(&input, today())?;
    state
        .db
        .products()
        .ensure_barcode_available(&input.barcode, None)
        .await?;

    let image = form
        .image
        .take()
        .ok_or_else(|| ApiError::unprocessable("image is required"))?;
    input.image = Some(upload(&state, image).await?);

    let product = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, ApiJson(product.into())))
}

async fn get_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<ProductOutput>, ApiError> {
    let product = state.db.products().get(id).await?;
    Ok(ApiJson(product.into()))
}

async fn update_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiJson<ProductOutput>, ApiError> {
    let mut form = ProductForm::read(multipart?).await?;

    state.db.products().get(id).await?;

    let mut input = form.input()?;
    validate_product_input(&input, today())?;
    state
        .db
        .products()
        .ensure_barcode_available(&input.barcode, Some(id))
        .await?;

    if let Some(image) = form.image.take() {
        debug!(id, "Replacing product image");
        input.image = Some(upload(&state, image).await?);
    }

    let product = state.db.products().update(id, &input).await?;
    Ok(ApiJson(product.into()))
}

async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;
    state.db.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
