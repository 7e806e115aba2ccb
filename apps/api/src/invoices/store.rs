//! Invoice persistence. Every read and write is scoped to the owning user.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::invoice::{Invoice, InvoiceRow};

/// Carried in `AppState` as `Arc<dyn InvoiceStore>`.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError>;

    /// Returns `None` if the invoice is absent or owned by someone else.
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError>;

    /// All invoices of a user, newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Invoice>, AppError>;

    /// Returns `false` if no row of that owner was updated.
    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invoices
                (id, user_id, invoice_number, client_name, email, address,
                 items, total, status, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.user_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.client_name)
        .bind(&invoice.email)
        .bind(&invoice.address)
        .bind(Json(&invoice.items))
        .bind(invoice.total)
        .bind(invoice.status.as_str())
        .bind(invoice.due_date)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;

        info!(
            "Inserted invoice {} ({}) for user {}",
            invoice.id, invoice.invoice_number, invoice.user_id
        );
        Ok(())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let row: Option<InvoiceRow> =
            sqlx::query_as("SELECT * FROM invoices WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Invoice::from))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            "SELECT * FROM invoices WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET invoice_number = $3, client_name = $4, email = $5, address = $6,
                items = $7, total = $8, status = $9, due_date = $10, updated_at = $11
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.user_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.client_name)
        .bind(&invoice.email)
        .bind(&invoice.address)
        .bind(Json(&invoice.items))
        .bind(invoice.total)
        .bind(invoice.status.as_str())
        .bind(invoice.due_date)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!("Deleted invoice {id} for user {user_id}");
        }
        Ok(result.rows_affected() > 0)
    }
}
