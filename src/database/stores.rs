use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::Appointment;

/// Errors from data stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness/ownership policy conflict. The tenant resolver depends on
    /// this variant being distinguishable from other failures.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.to_string());
        }
    }
    StoreError::Sqlx(err)
}

/// Data-access port for the craftsman (tenant) table. Injected rather than
/// reached through a global client so tests can supply an in-memory fake.
#[async_trait]
pub trait CraftsmanStore: Send + Sync {
    async fn find_by_principal(&self, auth_user_id: &str) -> Result<Option<Uuid>, StoreError>;

    /// Insert a new craftsman row for the principal. Fails with
    /// StoreError::Conflict if a row for this principal already exists.
    async fn insert(
        &self,
        auth_user_id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Uuid, StoreError>;
}

/// Data-access port for appointment reads.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// All non-cancelled appointments for the craftsman with
    /// starts_at in [from, to).
    async fn appointments_between(
        &self,
        craftsman_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// One appointment scoped to the craftsman. Absent rows and rows
    /// belonging to another craftsman are both None.
    async fn find_by_id(
        &self,
        craftsman_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Appointment>, StoreError>;
}

/// Data-access port for customer ownership checks. Any handler that accepts
/// a customer reference in a request body verifies it through this port
/// before writing it.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Whether the customer exists and belongs to the craftsman.
    async fn exists(&self, craftsman_id: Uuid, customer_id: Uuid) -> Result<bool, StoreError>;
}

pub struct PgCraftsmanStore {
    pool: PgPool,
}

impl PgCraftsmanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CraftsmanStore for PgCraftsmanStore {
    async fn find_by_principal(&self, auth_user_id: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM craftsmen WHERE auth_user_id = $1")
            .bind(auth_user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert(
        &self,
        auth_user_id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Uuid, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO craftsmen (id, auth_user_id, name, email) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(auth_user_id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }
}

pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn appointments_between(
        &self,
        craftsman_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError> {
        let rows = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments \
             WHERE craftsman_id = $1 AND starts_at >= $2 AND starts_at < $3 \
               AND status <> 'cancelled' \
             ORDER BY starts_at",
        )
        .bind(craftsman_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(
        &self,
        craftsman_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND craftsman_id = $2",
        )
        .bind(id)
        .bind(craftsman_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn exists(&self, craftsman_id: Uuid, customer_id: Uuid) -> Result<bool, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM customers WHERE id = $1 AND craftsman_id = $2",
        )
        .bind(customer_id)
        .bind(craftsman_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id.is_some())
    }
}
