use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{quote::QUOTE_STATUSES, Quote};
use crate::database::stores::PgCustomerStore;
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;

use super::{ensure_customer_owned, parse_date};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuote {
    pub customer_id: Option<Uuid>,
    pub quote_number: Option<String>,
    pub items: Option<Value>,
    pub total_amount: Option<f64>,
    pub valid_until: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuote {
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    pub items: Option<Value>,
    pub total_amount: Option<f64>,
    pub valid_until: Option<String>,
    pub notes: Option<String>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("quote query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

fn validate_status(status: &str) -> Result<&str, ApiError> {
    if QUOTE_STATUSES.contains(&status) {
        Ok(status)
    } else {
        Err(ApiError::bad_request(format!(
            "status: expected one of {}",
            QUOTE_STATUSES.join(", ")
        )))
    }
}

fn document_number(prefix: &str) -> String {
    // Date-prefixed with a random suffix; uniqueness is enforced by the DB.
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d"), &suffix[..6])
}

/// GET /api/quotes
pub async fn list(
    Extension(ctx): Extension<CraftsmanContext>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = sqlx::query_as::<_, Quote>(
        "SELECT * FROM quotes WHERE craftsman_id = $1 ORDER BY created_at DESC",
    )
    .bind(ctx.craftsman_id)
    .fetch_all(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(rows))
}

/// GET /api/quotes/:id
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .fetch_optional(&pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    Ok(Json(row))
}

/// POST /api/quotes
pub async fn create(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<CreateQuote>,
) -> Result<impl IntoResponse, ApiError> {
    let valid_until = payload
        .valid_until
        .as_deref()
        .map(|raw| parse_date("validUntil", raw))
        .transpose()?;

    let quote_number = payload
        .quote_number
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| document_number("Q"));

    let pool = DatabaseManager::pool().await?;

    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
    }

    let row = sqlx::query_as::<_, Quote>(
        "INSERT INTO quotes \
           (id, craftsman_id, customer_id, quote_number, status, items, total_amount, valid_until, notes) \
         VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(ctx.craftsman_id)
    .bind(payload.customer_id)
    .bind(quote_number)
    .bind(payload.items.unwrap_or_else(|| Value::Array(vec![])))
    .bind(payload.total_amount.unwrap_or(0.0))
    .bind(valid_until)
    .bind(payload.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/quotes/:id
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuote>,
) -> Result<Json<Quote>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = sqlx::query_as::<_, Quote>(
        "SELECT * FROM quotes WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
        row.customer_id = Some(customer_id);
    }
    if let Some(status) = payload.status.as_deref() {
        row.status = validate_status(status)?.to_string();
    }
    if let Some(items) = payload.items {
        row.items = items;
    }
    if let Some(total) = payload.total_amount {
        row.total_amount = total;
    }
    if let Some(raw) = payload.valid_until.as_deref() {
        row.valid_until = Some(parse_date("validUntil", raw)?);
    }
    if let Some(notes) = payload.notes {
        row.notes = Some(notes);
    }

    let updated = sqlx::query_as::<_, Quote>(
        "UPDATE quotes \
         SET customer_id = $3, status = $4, items = $5, total_amount = $6, valid_until = $7, \
             notes = $8, updated_at = now() \
         WHERE id = $1 AND craftsman_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .bind(row.customer_id)
    .bind(&row.status)
    .bind(&row.items)
    .bind(row.total_amount)
    .bind(row.valid_until)
    .bind(&row.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(updated))
}

/// DELETE /api/quotes/:id
pub async fn delete(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let result = sqlx::query("DELETE FROM quotes WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .execute(&pool)
        .await
        .map_err(internal)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Quote not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_validation_matches_known_set() {
        assert!(validate_status("draft").is_ok());
        assert!(validate_status("accepted").is_ok());
        assert!(validate_status("paid").is_err());
    }

    #[test]
    fn generated_numbers_carry_prefix_and_date() {
        let n = document_number("Q");
        assert!(n.starts_with("Q-"));
        assert_eq!(n.split('-').count(), 3);
    }
}
