use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Customer;
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("customer query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

/// GET /api/customers
pub async fn list(
    Extension(ctx): Extension<CraftsmanContext>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE craftsman_id = $1 ORDER BY name",
    )
    .bind(ctx.craftsman_id)
    .fetch_all(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(rows))
}

/// GET /api/customers/:id
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(row))
}

/// POST /api/customers
pub async fn create(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<CreateCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("name: must not be empty"));
    }

    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (id, craftsman_id, name, email, phone, address, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(ctx.craftsman_id)
    .bind(payload.name.trim())
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .bind(payload.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/customers/:id
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomer>,
) -> Result<Json<Customer>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name: must not be empty"));
        }
        row.name = name.trim().to_string();
    }
    if let Some(email) = payload.email {
        row.email = Some(email);
    }
    if let Some(phone) = payload.phone {
        row.phone = Some(phone);
    }
    if let Some(address) = payload.address {
        row.address = Some(address);
    }
    if let Some(notes) = payload.notes {
        row.notes = Some(notes);
    }

    let updated = sqlx::query_as::<_, Customer>(
        "UPDATE customers \
         SET name = $3, email = $4, phone = $5, address = $6, notes = $7, updated_at = now() \
         WHERE id = $1 AND craftsman_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .bind(&row.name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(&row.address)
    .bind(&row.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(updated))
}

/// DELETE /api/customers/:id
pub async fn delete(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .execute(&pool)
        .await
        .map_err(internal)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Customer not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
