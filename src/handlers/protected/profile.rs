use axum::{extract::Extension, Json};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::Craftsman;
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;

/// Profile updates never touch auth_user_id; the resolver is the only
/// writer of the principal binding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub assistant_phone_number: Option<String>,
    pub assistant_enabled: Option<bool>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("profile query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

/// GET /api/profile - The resolved craftsman row
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
) -> Result<Json<Craftsman>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = sqlx::query_as::<_, Craftsman>("SELECT * FROM craftsmen WHERE id = $1")
        .bind(ctx.craftsman_id)
        .fetch_optional(&pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(row))
}

/// PUT /api/profile
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<UpdateProfile>,
) -> Result<Json<Craftsman>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = sqlx::query_as::<_, Craftsman>("SELECT * FROM craftsmen WHERE id = $1")
        .bind(ctx.craftsman_id)
        .fetch_optional(&pool)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

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
    if let Some(number) = payload.assistant_phone_number {
        row.assistant_phone_number = Some(number);
    }
    if let Some(enabled) = payload.assistant_enabled {
        row.assistant_enabled = enabled;
    }

    let updated = sqlx::query_as::<_, Craftsman>(
        "UPDATE craftsmen \
         SET name = $2, email = $3, phone = $4, address = $5, \
             assistant_phone_number = $6, assistant_enabled = $7, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(ctx.craftsman_id)
    .bind(&row.name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(&row.address)
    .bind(&row.assistant_phone_number)
    .bind(row.assistant_enabled)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok(Json(updated))
}
