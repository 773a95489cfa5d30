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
use crate::database::models::{invoice::INVOICE_STATUSES, Invoice};
use crate::database::stores::PgCustomerStore;
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;

use super::{ensure_customer_owned, parse_date};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub customer_id: Option<Uuid>,
    pub invoice_number: Option<String>,
    pub items: Option<Value>,
    pub total_amount: Option<f64>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoice {
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    pub items: Option<Value>,
    pub total_amount: Option<f64>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("invoice query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

fn validate_status(status: &str) -> Result<&str, ApiError> {
    if INVOICE_STATUSES.contains(&status) {
        Ok(status)
    } else {
        Err(ApiError::bad_request(format!(
            "status: expected one of {}",
            INVOICE_STATUSES.join(", ")
        )))
    }
}

fn invoice_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("R-{}-{}", Utc::now().format("%Y%m%d"), &suffix[..6])
}

/// GET /api/invoices
pub async fn list(
    Extension(ctx): Extension<CraftsmanContext>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE craftsman_id = $1 ORDER BY created_at DESC",
    )
    .bind(ctx.craftsman_id)
    .fetch_all(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(rows))
}

/// GET /api/invoices/:id
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row =
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 AND craftsman_id = $2")
            .bind(id)
            .bind(ctx.craftsman_id)
            .fetch_optional(&pool)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    Ok(Json(row))
}

/// POST /api/invoices
pub async fn create(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<CreateInvoice>,
) -> Result<impl IntoResponse, ApiError> {
    let due_date = payload
        .due_date
        .as_deref()
        .map(|raw| parse_date("dueDate", raw))
        .transpose()?;

    let number = payload
        .invoice_number
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(invoice_number);

    let pool = DatabaseManager::pool().await?;

    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
    }

    let row = sqlx::query_as::<_, Invoice>(
        "INSERT INTO invoices \
           (id, craftsman_id, customer_id, invoice_number, status, items, total_amount, due_date, notes) \
         VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(ctx.craftsman_id)
    .bind(payload.customer_id)
    .bind(number)
    .bind(payload.items.unwrap_or_else(|| Value::Array(vec![])))
    .bind(payload.total_amount.unwrap_or(0.0))
    .bind(due_date)
    .bind(payload.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/invoices/:id
///
/// Moving an invoice to "paid" stamps paid_at; leaving "paid" clears it.
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoice>,
) -> Result<Json<Invoice>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
        row.customer_id = Some(customer_id);
    }
    if let Some(status) = payload.status.as_deref() {
        let status = validate_status(status)?;
        if status == "paid" && row.status != "paid" {
            row.paid_at = Some(Utc::now());
        } else if status != "paid" {
            row.paid_at = None;
        }
        row.status = status.to_string();
    }
    if let Some(items) = payload.items {
        row.items = items;
    }
    if let Some(total) = payload.total_amount {
        row.total_amount = total;
    }
    if let Some(raw) = payload.due_date.as_deref() {
        row.due_date = Some(parse_date("dueDate", raw)?);
    }
    if let Some(notes) = payload.notes {
        row.notes = Some(notes);
    }

    let updated = sqlx::query_as::<_, Invoice>(
        "UPDATE invoices \
         SET customer_id = $3, status = $4, items = $5, total_amount = $6, due_date = $7, \
             paid_at = $8, notes = $9, updated_at = now() \
         WHERE id = $1 AND craftsman_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .bind(row.customer_id)
    .bind(&row.status)
    .bind(&row.items)
    .bind(row.total_amount)
    .bind(row.due_date)
    .bind(row.paid_at)
    .bind(&row.notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(updated))
}

/// DELETE /api/invoices/:id
pub async fn delete(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .execute(&pool)
        .await
        .map_err(internal)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Invoice not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_validation_matches_known_set() {
        assert!(validate_status("overdue").is_ok());
        assert!(validate_status("accepted").is_err());
    }
}
