//! # Order Repository
//!
//! Order placement and lookup.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place(NewOrder)                                      │
//! │                                                                         │
//! │  validate_new_order  (≥1 item, every quantity ≥ 1)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT order shell (pending, total 0) ... WHERE client exists         │
//! │       │   ← first statement writes, so the write lock is taken here    │
//! │       │     and concurrent placements queue behind it                  │
//! │       ▼                                                                 │
//! │  for each line, in submission order:                                   │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │ SELECT product            → missing?  ProductNotFound          │    │
//! │  │ UPDATE quantity -= n                                           │    │
//! │  │   WHERE quantity >= n     → 0 rows?   InsufficientStock        │    │
//! │  │ INSERT order_item (unit price snapshot)                        │    │
//! │  │ total += unit price × n   → overflow? TotalTooLarge            │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE order total; COMMIT                                            │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction: shell, decrements and    │
//! │  item rows all roll back together.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never restored: cancelling or deleting an order leaves product
//! quantities as they are.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use super::contains_pattern;
use super::product::PRODUCT_COLUMNS;
use crate::error::{DbError, DbResult};
use shopdesk_core::validation::validate_new_order;
use shopdesk_core::{
    CoreError, Money, NewOrder, Order, OrderDetail, OrderFilter, OrderItem, OrderStatus, Page,
    Product, ValidationError,
};

const ORDER_COLUMNS: &str = "id, client_id, status, total_cents, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order atomically.
    ///
    /// ## Errors
    /// * `Domain(Validation(EmptyOrder | MustBePositive))` - malformed request
    /// * `Domain(ClientNotFound)` - unknown `client_id`
    /// * `Domain(ProductNotFound)` - "Item {id} not found"
    /// * `Domain(InsufficientStock)` - "Not enough {name} in stock"
    /// * `Domain(Validation(TotalTooLarge))` - the total overflows i64 cents
    ///
    /// On any error nothing is persisted.
    pub async fn place(&self, request: &NewOrder) -> DbResult<OrderDetail> {
        validate_new_order(request)?;

        debug!(
            client_id = request.client_id,
            lines = request.items.len(),
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (client_id, status, total_cents, created_at, updated_at)
            SELECT ?1, ?2, 0, ?3, ?3
            WHERE EXISTS (SELECT 1 FROM clients WHERE id = ?1)
            RETURNING id
            "#,
        )
        .bind(request.client_id)
        .bind(OrderStatus::Pending)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::ClientNotFound(request.client_id))?;

        let mut total = Money::zero();

        for line in &request.items {
            let product = sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
            ))
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::ProductNotFound(line.product_id))?;

            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE id = ?1 AND quantity >= ?2
                "#,
            )
            .bind(product.id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                warn!(
                    product_id = product.id,
                    available = product.quantity,
                    requested = line.quantity,
                    "Insufficient stock, rolling back order"
                );
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(product.id)
            .bind(line.quantity)
            .bind(product.price_cents)
            .execute(&mut *tx)
            .await?;

            total = product
                .price()
                .checked_multiply_quantity(line.quantity)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or(CoreError::Validation(ValidationError::TotalTooLarge))?;
        }

        sqlx::query("UPDATE orders SET total_cents = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(total.cents())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id, total = %total, "Order placed");
        self.get(order_id).await
    }

    /// Lists orders newest first, each with its items.
    pub async fn list(&self, filter: &OrderFilter, page: Page) -> DbResult<Vec<OrderDetail>> {
        let page = page.clamped();
        debug!(?filter, limit = page.limit, skip = page.skip, "Listing orders");

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE (?1 IS NULL OR id = ?1)
              AND (?2 IS NULL OR client_id = ?2)
              AND (?3 IS NULL OR status LIKE ?3 ESCAPE '\')
            ORDER BY id DESC
            LIMIT ?4 OFFSET ?5
            "#
        ))
        .bind(filter.order_id)
        .bind(filter.client_id)
        .bind(contains_pattern(filter.status.as_deref()))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// Gets an order with its items.
    pub async fn get(&self, id: i64) -> DbResult<OrderDetail> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY id ASC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderDetail { order, items })
    }

    /// Sets the status of an order. `None` leaves it unchanged.
    ///
    /// Any status may follow any other. Total and items are never touched.
    pub async fn update_status(&self, id: i64, status: Option<OrderStatus>) -> DbResult<OrderDetail> {
        let Some(status) = status else {
            return self.get(id).await;
        };

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(id, %status, "Order status updated");
        self.get(id).await
    }

    /// Deletes an order and, by cascade, its items. Stock is not restored.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(id, "Order deleted");
        Ok(())
    }

    /// Loads the items of every order in one query and groups them.
    async fn attach_items(&self, orders: Vec<Order>) -> DbResult<Vec<OrderDetail>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id IN ("
        ));
        let mut ids = query.separated(", ");
        for order in &orders {
            ids.push_bind(order.id);
        }
        query.push(") ORDER BY id ASC");

        let items = query
            .build_query_as::<OrderItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_client, seed_product, test_db};
    use crate::{Database, DbConfig};
    use shopdesk_core::NewOrderItem;

    fn order_for(client_id: i64, lines: &[(i64, i64)]) -> NewOrder {
        NewOrder {
            client_id,
            items: lines
                .iter()
                .map(|&(product_id, quantity)| NewOrderItem {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    async fn order_row_counts(db: &Database) -> (i64, i64) {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        (orders, items)
    }

    #[tokio::test]
    async fn test_place_decrements_stock_and_snapshots_price() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1999, 5).await;

        let detail = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 3)]))
            .await
            .unwrap();

        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total_cents, 3 * 1999);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].unit_price_cents, 1999);
        assert_eq!(detail.items[0].quantity, 3);

        let after = db.products().get(product.id).await.unwrap();
        assert_eq!(after.quantity, 2);
    }

    #[tokio::test]
    async fn test_snapshot_survives_price_change() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let placed = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 1)]))
            .await
            .unwrap();

        let mut input = crate::repository::test_support::product_input("P-1", 5000, 4);
        input.image = None;
        db.products().update(product.id, &input).await.unwrap();

        let reloaded = db.orders().get(placed.order.id).await.unwrap();
        assert_eq!(reloaded.items[0].unit_price_cents, 1000);
        assert_eq!(reloaded.order.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let plenty = seed_product(&db, "P-1", 500, 10).await;
        let scarce = seed_product(&db, "P-2", 700, 2).await;

        let err = db
            .orders()
            .place(&order_for(client.id, &[(plenty.id, 4), (scarce.id, 3)]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), format!("Not enough {} in stock", scarce.name));
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));

        // The first line's decrement was undone too
        assert_eq!(db.products().get(plenty.id).await.unwrap().quantity, 10);
        assert_eq!(db.products().get(scarce.id).await.unwrap().quantity, 2);
        assert_eq!(order_row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_total_overflow_rolls_back_everything() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let cheap = seed_product(&db, "P-1", 500, 10).await;
        let price = Money::parse_major("92233720368547758").unwrap();
        let pricey = seed_product(&db, "P-2", price.cents(), 2).await;

        let err = db
            .orders()
            .place(&order_for(client.id, &[(cheap.id, 1), (pricey.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::TotalTooLarge))
        ));
        assert_eq!(db.products().get(cheap.id).await.unwrap().quantity, 10);
        assert_eq!(db.products().get(pricey.id).await.unwrap().quantity, 2);
        assert_eq!(order_row_counts(&db).await, (0, 0));

        // Each line fits on its own but the sum does not
        let err = db
            .orders()
            .place(&order_for(client.id, &[(pricey.id, 1), (pricey.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Order total is too large");
        assert_eq!(db.products().get(pricey.id).await.unwrap().quantity, 2);
        assert_eq!(order_row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_repeated_product_lines_see_earlier_decrements() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let err = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 3), (product.id, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(db.products().get(product.id).await.unwrap().quantity, 5);
        assert_eq!(order_row_counts(&db).await, (0, 0));

        let ok = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 2), (product.id, 3)]))
            .await
            .unwrap();
        assert_eq!(ok.order.total_cents, 5000);
        assert_eq!(db.products().get(product.id).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let err = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 1), (404, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Item 404 not found");
        assert_eq!(db.products().get(product.id).await.unwrap().quantity, 5);
        assert_eq!(order_row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_unknown_client_and_malformed_requests() {
        let db = test_db().await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let err = db
            .orders()
            .place(&order_for(77, &[(product.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Client 77 not found");

        let client = seed_client(&db, 1).await;
        let err = db.orders().place(&order_for(client.id, &[])).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::EmptyOrder))
        ));

        let err = db
            .orders()
            .place(&order_for(client.id, &[(product.id, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        assert_eq!(order_row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_list_filters_newest_first() {
        let db = test_db().await;
        let ana = seed_client(&db, 1).await;
        let bia = seed_client(&db, 2).await;
        let product = seed_product(&db, "P-1", 1000, 50).await;

        let first = db.orders().place(&order_for(ana.id, &[(product.id, 1)])).await.unwrap();
        let second = db.orders().place(&order_for(bia.id, &[(product.id, 2)])).await.unwrap();
        let third = db.orders().place(&order_for(ana.id, &[(product.id, 3)])).await.unwrap();

        db.orders()
            .update_status(second.order.id, Some(OrderStatus::Shipped))
            .await
            .unwrap();

        let all = db.orders().list(&OrderFilter::default(), Page::default()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|d| d.order.id).collect();
        assert_eq!(ids, vec![third.order.id, second.order.id, first.order.id]);
        assert!(all.iter().all(|d| d.items.len() == 1));

        let by_client = OrderFilter {
            client_id: Some(ana.id),
            ..OrderFilter::default()
        };
        assert_eq!(db.orders().list(&by_client, Page::default()).await.unwrap().len(), 2);

        let by_status = OrderFilter {
            status: Some("SHIP".to_string()),
            ..OrderFilter::default()
        };
        let shipped = db.orders().list(&by_status, Page::default()).await.unwrap();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].order.id, second.order.id);

        let by_id = OrderFilter {
            order_id: Some(first.order.id),
            ..OrderFilter::default()
        };
        let found = db.orders().list(&by_id, Page::default()).await.unwrap();
        assert_eq!(found[0].items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_update_status_is_unconstrained() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;
        let placed = db.orders().place(&order_for(client.id, &[(product.id, 1)])).await.unwrap();
        let id = placed.order.id;

        let delivered = db.orders().update_status(id, Some(OrderStatus::Delivered)).await.unwrap();
        assert_eq!(delivered.order.status, OrderStatus::Delivered);

        let back = db.orders().update_status(id, Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(back.order.status, OrderStatus::Pending);

        let unchanged = db.orders().update_status(id, None).await.unwrap();
        assert_eq!(unchanged.order.status, OrderStatus::Pending);
        assert_eq!(unchanged.order.total_cents, placed.order.total_cents);

        assert!(matches!(
            db.orders().update_status(999, Some(OrderStatus::Shipped)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_without_restock() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;
        let placed = db.orders().place(&order_for(client.id, &[(product.id, 2)])).await.unwrap();

        // Referenced rows cannot go while the order exists
        let err = db.products().delete(product.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Product is referenced by existing orders");
        let err = db.clients().delete(client.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Client is referenced by existing orders");

        db.orders().delete(placed.order.id).await.unwrap();

        assert_eq!(order_row_counts(&db).await, (0, 0));
        assert_eq!(db.products().get(product.id).await.unwrap().quantity, 3);
        assert!(matches!(
            db.orders().get(placed.order.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_placements_never_oversell() {
        let path = std::env::temp_dir().join(format!("shopdesk-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();

        let client = seed_client(&db, 1).await;
        let product = seed_product(&db, "P-1", 1000, 5).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = db.clone();
            let request = order_for(client.id, &[(product.id, 1)]);
            handles.push(tokio::spawn(async move { db.orders().place(&request).await }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DbError::Domain(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 5);
        assert_eq!(db.products().get(product.id).await.unwrap().quantity, 0);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
