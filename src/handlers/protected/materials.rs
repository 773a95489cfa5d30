use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Material;
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterial {
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub stock_quantity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterial {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub stock_quantity: Option<f64>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("material query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

fn validate_non_negative(field: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::bad_request(format!("{}: must be non-negative", field)));
    }
    Ok(value)
}

/// GET /api/materials
pub async fn list(
    Extension(ctx): Extension<CraftsmanContext>,
) -> Result<Json<Vec<Material>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = sqlx::query_as::<_, Material>(
        "SELECT * FROM materials WHERE craftsman_id = $1 ORDER BY name",
    )
    .bind(ctx.craftsman_id)
    .fetch_all(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(rows))
}

/// GET /api/materials/:id
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Material>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Material>(
        "SELECT * FROM materials WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Material not found"))?;

    Ok(Json(row))
}

/// POST /api/materials
pub async fn create(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<CreateMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("name: must not be empty"));
    }
    let unit_price = validate_non_negative("unitPrice", payload.unit_price.unwrap_or(0.0))?;
    let stock = validate_non_negative("stockQuantity", payload.stock_quantity.unwrap_or(0.0))?;

    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Material>(
        "INSERT INTO materials (id, craftsman_id, name, description, unit, unit_price, stock_quantity) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(ctx.craftsman_id)
    .bind(payload.name.trim())
    .bind(payload.description)
    .bind(payload.unit.unwrap_or_else(|| "piece".to_string()))
    .bind(unit_price)
    .bind(stock)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/materials/:id
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterial>,
) -> Result<Json<Material>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = sqlx::query_as::<_, Material>(
        "SELECT * FROM materials WHERE id = $1 AND craftsman_id = $2",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .fetch_optional(&pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("Material not found"))?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name: must not be empty"));
        }
        row.name = name.trim().to_string();
    }
    if let Some(description) = payload.description {
        row.description = Some(description);
    }
    if let Some(unit) = payload.unit {
        row.unit = unit;
    }
    if let Some(price) = payload.unit_price {
        row.unit_price = validate_non_negative("unitPrice", price)?;
    }
    if let Some(stock) = payload.stock_quantity {
        row.stock_quantity = validate_non_negative("stockQuantity", stock)?;
    }

    let updated = sqlx::query_as::<_, Material>(
        "UPDATE materials \
         SET name = $3, description = $4, unit = $5, unit_price = $6, stock_quantity = $7, \
             updated_at = now() \
         WHERE id = $1 AND craftsman_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(&row.unit)
    .bind(row.unit_price)
    .bind(row.stock_quantity)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(updated))
}

/// DELETE /api/materials/:id
pub async fn delete(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let result = sqlx::query("DELETE FROM materials WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .execute(&pool)
        .await
        .map_err(internal)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Material not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_non_finite_amounts() {
        assert!(validate_non_negative("unitPrice", 12.5).is_ok());
        assert!(validate_non_negative("unitPrice", -0.01).is_err());
        assert!(validate_non_negative("unitPrice", f64::NAN).is_err());
    }
}
