//! # Client Repository
//!
//! Database operations for customers.
//!
//! ## Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_client_input  ──► "Invalid CPF", "email has invalid format"  │
//! │       │  (cpf now cleaned: 529.982.247-25 → 52998224725)               │
//! │       ▼                                                                 │
//! │  email taken by another client?  ──► Conflict                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cpf taken by another client?    ──► Conflict                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT / UPDATE  (UNIQUE indexes remain as a backstop)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! On update the record's own id is excluded from both checks.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use shopdesk_core::validation::validate_client_input;
use shopdesk_core::{Client, ClientFilter, ClientInput, Page};

const CLIENT_COLUMNS: &str = "id, name, email, cpf, created_at, updated_at";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists clients ordered by id, optionally filtered by name and email.
    pub async fn list(&self, filter: &ClientFilter, page: Page) -> DbResult<Vec<Client>> {
        let page = page.clamped();
        debug!(?filter, limit = page.limit, skip = page.skip, "Listing clients");

        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR email LIKE ?2 ESCAPE '\')
            ORDER BY id ASC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(contains_pattern(filter.name.as_deref()))
        .bind(contains_pattern(filter.email.as_deref()))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Gets a client by id.
    pub async fn get(&self, id: i64) -> DbResult<Client> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    async fn find(&self, id: i64) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// Creates a client.
    ///
    /// ## Errors
    /// * `Domain(Validation(InvalidCpf))` - CPF is not 11 digits or repeats one digit
    /// * `Conflict("Email already exists")`
    /// * `Conflict("CPF already exists")`
    pub async fn create(&self, input: &ClientInput) -> DbResult<Client> {
        let input = validate_client_input(input)?;
        debug!(email = %input.email, "Creating client");

        if self.email_taken(&input.email, None).await? {
            return Err(DbError::conflict("Email already exists"));
        }
        if self.cpf_taken(&input.cpf, None).await? {
            return Err(DbError::conflict("CPF already exists"));
        }

        let now = Utc::now();
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (name, email, cpf, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.cpf)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id = client.id, "Client created");
        Ok(client)
    }

    /// Replaces a client's name, email and CPF.
    ///
    /// ## Errors
    /// * `NotFound` - no client with this id
    /// * `Conflict("Email already registered by another client")`
    /// * `Conflict("CPF already registered by another client")`
    pub async fn update(&self, id: i64, input: &ClientInput) -> DbResult<Client> {
        if self.find(id).await?.is_none() {
            return Err(DbError::not_found("Client", id));
        }

        let input = validate_client_input(input)?;
        debug!(id, email = %input.email, "Updating client");

        if self.email_taken(&input.email, Some(id)).await? {
            return Err(DbError::conflict("Email already registered by another client"));
        }
        if self.cpf_taken(&input.cpf, Some(id)).await? {
            return Err(DbError::conflict("CPF already registered by another client"));
        }

        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = ?2, email = ?3, cpf = ?4, updated_at = ?5
            WHERE id = ?1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.cpf)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Client", id))?;

        info!(id, "Client updated");
        Ok(client)
    }

    /// Deletes a client.
    ///
    /// Clients with orders are kept; the foreign key refuses the delete.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).referenced_by_orders("Client"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        info!(id, "Client deleted");
        Ok(())
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE email = ?1 AND (?2 IS NULL OR id <> ?2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn cpf_taken(&self, cpf: &str, exclude_id: Option<i64>) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE cpf = ?1 AND (?2 IS NULL OR id <> ?2))",
        )
        .bind(cpf)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{client_input, seed_client, test_db};
    use shopdesk_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_create_stores_cleaned_cpf() {
        let db = test_db().await;
        let input = ClientInput {
            name: "Ana Souza".to_string(),
            email: "ana@shop.test".to_string(),
            cpf: "529.982.247-25".to_string(),
        };

        let client = db.clients().create(&input).await.unwrap();
        assert_eq!(client.cpf, "52998224725");

        // Same CPF, different punctuation
        let again = ClientInput {
            email: "other@shop.test".to_string(),
            cpf: "52998224725".to_string(),
            ..input
        };
        let err = db.clients().create(&again).await.unwrap_err();
        assert_eq!(err.to_string(), "CPF already exists");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_cpf() {
        let db = test_db().await;
        let input = ClientInput {
            cpf: "11111111111".to_string(),
            ..client_input(1)
        };

        let err = db.clients().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::InvalidCpf))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let db = test_db().await;
        seed_client(&db, 1).await;

        let input = ClientInput {
            cpf: "529.982.247-25".to_string(),
            ..client_input(1)
        };
        let err = db.clients().create(&input).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[tokio::test]
    async fn test_update_excludes_self_from_uniqueness() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;

        let renamed = ClientInput {
            name: "Renamed".to_string(),
            ..client_input(1)
        };
        let updated = db.clients().update(client.id, &renamed).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, client.email);
    }

    #[tokio::test]
    async fn test_update_conflicts_with_other_client() {
        let db = test_db().await;
        let first = seed_client(&db, 1).await;
        let second = seed_client(&db, 2).await;

        let steal_email = ClientInput {
            email: first.email.clone(),
            ..client_input(2)
        };
        let err = db.clients().update(second.id, &steal_email).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered by another client");

        let steal_cpf = ClientInput {
            cpf: first.cpf.clone(),
            ..client_input(2)
        };
        let err = db.clients().update(second.id, &steal_cpf).await.unwrap_err();
        assert_eq!(err.to_string(), "CPF already registered by another client");
    }

    #[tokio::test]
    async fn test_update_missing_client() {
        let db = test_db().await;
        let err = db.clients().update(42, &client_input(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Client not found");
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let db = test_db().await;
        for n in 1..=5 {
            seed_client(&db, n).await;
        }

        let all = db.clients().list(&ClientFilter::default(), Page::default()).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        let filter = ClientFilter {
            name: Some("CLIENT 3".to_string()),
            email: None,
        };
        let found = db.clients().list(&filter, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "client3@shop.test");

        let page = db.clients().list(&ClientFilter::default(), Page::new(2, 2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Client 3");
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let client = seed_client(&db, 1).await;

        db.clients().delete(client.id).await.unwrap();
        assert!(matches!(
            db.clients().get(client.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.clients().delete(client.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
