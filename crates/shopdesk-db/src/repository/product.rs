//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Filtered listing (name, category)
//! - CRUD operations with barcode uniqueness
//!
//! Stock (`quantity`) is written here only by create and update. Order
//! placement decrements it inside its own transaction, see
//! [`OrderRepository::place`](super::order::OrderRepository::place).

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use shopdesk_core::validation::validate_product_input;
use shopdesk_core::{Page, Product, ProductFilter, ProductInput};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, category, price_cents, barcode, \
     quantity, expiration, image, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let coffee = repo.get(42).await?;
/// let page = repo.list(&ProductFilter::default(), Page::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by id, optionally filtered by name and category.
    pub async fn list(&self, filter: &ProductFilter, page: Page) -> DbResult<Vec<Product>> {
        let page = page.clamped();
        debug!(?filter, limit = page.limit, skip = page.skip, "Listing products");

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category LIKE ?2 ESCAPE '\')
            ORDER BY id ASC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(contains_pattern(filter.name.as_deref()))
        .bind(contains_pattern(filter.category.as_deref()))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Products listed");
        Ok(products)
    }

    /// Gets a product by id.
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    async fn find(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// Fails with `Conflict("This barcode already exists")` when another
    /// product carries `barcode`.
    ///
    /// Handlers call this before uploading an image so a doomed request never
    /// leaves an orphan file on the image host.
    pub async fn ensure_barcode_available(&self, barcode: &str, exclude_id: Option<i64>) -> DbResult<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE barcode = ?1 AND (?2 IS NULL OR id <> ?2))",
        )
        .bind(barcode.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(DbError::conflict("This barcode already exists"));
        }
        Ok(())
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// * `Domain(Validation(..))` - price < 1, quantity < 1, expired date, blank fields
    /// * `Conflict("This barcode already exists")`
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        validate_product_input(input, today())?;
        self.ensure_barcode_available(&input.barcode, None).await?;

        debug!(barcode = %input.barcode, price = %input.price, "Creating product");

        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (name, description, category, price_cents, barcode, quantity,
                 expiration, image, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.description.trim())
        .bind(input.category.trim())
        .bind(input.price.cents())
        .bind(input.barcode.trim())
        .bind(input.quantity)
        .bind(input.expiration)
        .bind(&input.image)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id = product.id, barcode = %product.barcode, "Product created");
        Ok(product)
    }

    /// Replaces a product's fields.
    ///
    /// `input.image == None` keeps the stored image.
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        if self.find(id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        validate_product_input(input, today())?;
        self.ensure_barcode_available(&input.barcode, Some(id)).await?;

        debug!(id, barcode = %input.barcode, "Updating product");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = ?2, description = ?3, category = ?4, price_cents = ?5,
                barcode = ?6, quantity = ?7, expiration = ?8,
                image = COALESCE(?9, image), updated_at = ?10
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.trim())
        .bind(input.category.trim())
        .bind(input.price.cents())
        .bind(input.barcode.trim())
        .bind(input.quantity)
        .bind(input.expiration)
        .bind(&input.image)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        info!(id, "Product updated");
        Ok(product)
    }

    /// Deletes a product.
    ///
    /// Products that appear on an order are kept; the foreign key refuses
    /// the delete.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).referenced_by_orders("Product"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id, "Product deleted");
        Ok(())
    }

    /// Counts products. Used by the seed tool.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
// Unit Tests
// =============================================================================
