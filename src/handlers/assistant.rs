use axum::{http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Appointment, Craftsman};
use crate::database::stores::PgAppointmentStore;
use crate::error::ApiError;
use crate::handlers::protected::{parse_date, parse_datetime};
use crate::services::availability::{day_availability, SLOT_MINUTES};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    pub phone_number: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub phone_number: String,
    pub starts_at: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

fn internal(e: sqlx::Error) -> ApiError {
    tracing::error!("assistant query failed: {}", e);
    ApiError::internal_server_error("An error occurred while processing your request")
}

/// The voice platform cannot hold a user session, so webhook calls carry a
/// shared secret instead of a bearer token. Wrong and missing secrets are
/// the same failure, like the bearer path.
fn check_webhook_secret(headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = &config::config().assistant.webhook_secret;
    let provided = headers
        .get("x-assistant-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if expected.is_empty() || provided != expected {
        return Err(ApiError::unauthorized("Missing or invalid credentials"));
    }
    Ok(())
}

/// Locate the assistant-enabled craftsman behind the called number.
async fn craftsman_by_phone(pool: &sqlx::PgPool, phone: &str) -> Result<Craftsman, ApiError> {
    sqlx::query_as::<_, Craftsman>(
        "SELECT * FROM craftsmen WHERE assistant_phone_number = $1 AND assistant_enabled",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await
    .map_err(internal)?
    .ok_or_else(|| ApiError::not_found("No assistant configured for this number"))
}

/// POST /assistant/check-availability - Open slots for the phone assistant
pub async fn check_availability(
    headers: HeaderMap,
    Json(payload): Json<CheckAvailabilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_webhook_secret(&headers)?;
    let date = parse_date("date", &payload.date)?;

    let pool = DatabaseManager::pool().await?;
    let craftsman = craftsman_by_phone(&pool, &payload.phone_number).await?;

    let store = PgAppointmentStore::new(pool);
    let result = day_availability(&store, craftsman.id, date).await?;

    Ok(Json(result))
}

/// POST /assistant/book-appointment - Book a slot on behalf of a caller
///
/// The slot is re-checked against the day's bookings immediately before the
/// insert; a taken slot is a 409 so the assistant can offer alternatives.
pub async fn book_appointment(
    headers: HeaderMap,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_webhook_secret(&headers)?;
    if payload.customer_name.trim().is_empty() {
        return Err(ApiError::bad_request("customerName: must not be empty"));
    }
    let starts_at = parse_datetime("startsAt", &payload.starts_at)?;

    let pool = DatabaseManager::pool().await?;
    let craftsman = craftsman_by_phone(&pool, &payload.phone_number).await?;

    let store = PgAppointmentStore::new(pool.clone());
    let open = day_availability(&store, craftsman.id, starts_at.date()).await?;
    let slot_taken = !open.available_slots.iter().any(|s| s.start == starts_at);
    if slot_taken {
        return Err(ApiError::conflict("Requested slot is not available"));
    }

    let title = format!("Phone booking: {}", payload.customer_name.trim());
    let notes = match (&payload.customer_phone, &payload.notes) {
        (Some(phone), Some(notes)) => Some(format!("{} (callback: {})", notes, phone)),
        (Some(phone), None) => Some(format!("Callback: {}", phone)),
        (None, notes) => notes.clone(),
    };

    let row = sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments \
           (id, craftsman_id, customer_id, title, starts_at, duration_minutes, status, notes) \
         VALUES ($1, $2, NULL, $3, $4, $5, 'pending', $6) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(craftsman.id)
    .bind(&title)
    .bind(starts_at)
    .bind(SLOT_MINUTES as i32)
    .bind(&notes)
    .fetch_one(&pool)
    .await
    .map_err(internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment": row,
            "confirmedTime": row.starts_at,
            "confirmedUntil": row.starts_at + Duration::minutes(SLOT_MINUTES),
        })),
    ))
}
