use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Duration;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Appointment, AppointmentStatus};
use crate::database::stores::{AppointmentStore, PgAppointmentStore, PgCustomerStore};
use crate::error::ApiError;
use crate::middleware::auth::CraftsmanContext;
use crate::services::availability::day_availability;

use super::{ensure_customer_owned, parse_date, parse_datetime};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional ISO date; restricts the list to one calendar day.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointment {
    pub title: String,
    pub starts_at: String,
    pub duration_minutes: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    pub title: Option<String>,
    pub starts_at: Option<String>,
    pub duration_minutes: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub date: String,
}

/// GET /api/appointments - List the craftsman's appointments
pub async fn list(
    Extension(ctx): Extension<CraftsmanContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let rows = match query.date.as_deref() {
        Some(raw) => {
            let date = parse_date("date", raw)?;
            let from = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| ApiError::bad_request("date: invalid value"))?;
            let to = from + Duration::days(1);

            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments \
                 WHERE craftsman_id = $1 AND starts_at >= $2 AND starts_at < $3 \
                 ORDER BY starts_at",
            )
            .bind(ctx.craftsman_id)
            .bind(from)
            .bind(to)
            .fetch_all(&pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE craftsman_id = $1 ORDER BY starts_at",
            )
            .bind(ctx.craftsman_id)
            .fetch_all(&pool)
            .await
        }
    }
    .map_err(|e| {
        tracing::error!("appointment list failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(Json(rows))
}

/// GET /api/appointments/:id - Fetch one appointment
///
/// Absent and other-tenant rows are both 404; the difference must not leak.
pub async fn get(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let store = PgAppointmentStore::new(pool);

    let row = fetch_owned(&store, ctx.craftsman_id, id).await?;
    Ok(Json(row))
}

/// POST /api/appointments - Create an appointment
pub async fn create(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<CreateAppointment>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title: must not be empty"));
    }
    let starts_at = parse_datetime("startsAt", &payload.starts_at)?;
    let duration = validate_duration(payload.duration_minutes.unwrap_or(60))?;
    let status = validate_status(payload.status.as_deref().unwrap_or("scheduled"))?;

    let pool = DatabaseManager::pool().await?;

    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
    }

    let row = sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments \
           (id, craftsman_id, customer_id, title, starts_at, duration_minutes, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(ctx.craftsman_id)
    .bind(payload.customer_id)
    .bind(payload.title.trim())
    .bind(starts_at)
    .bind(duration)
    .bind(status.as_str())
    .bind(payload.notes)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("appointment insert failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/appointments/:id - Update an appointment (partial)
pub async fn update(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointment>,
) -> Result<Json<Appointment>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let store = PgAppointmentStore::new(pool.clone());

    let mut row = fetch_owned(&store, ctx.craftsman_id, id).await?;

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("title: must not be empty"));
        }
        row.title = title.trim().to_string();
    }
    if let Some(raw) = payload.starts_at {
        row.starts_at = parse_datetime("startsAt", &raw)?;
    }
    if let Some(duration) = payload.duration_minutes {
        row.duration_minutes = validate_duration(duration)?;
    }
    if let Some(status) = payload.status.as_deref() {
        row.status = validate_status(status)?.as_str().to_string();
    }
    if let Some(customer_id) = payload.customer_id {
        let customers = PgCustomerStore::new(pool.clone());
        ensure_customer_owned(&customers, ctx.craftsman_id, customer_id).await?;
        row.customer_id = Some(customer_id);
    }
    if let Some(notes) = payload.notes {
        row.notes = Some(notes);
    }

    let updated = sqlx::query_as::<_, Appointment>(
        "UPDATE appointments \
         SET customer_id = $3, title = $4, starts_at = $5, duration_minutes = $6, \
             status = $7, notes = $8, updated_at = now() \
         WHERE id = $1 AND craftsman_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(ctx.craftsman_id)
    .bind(row.customer_id)
    .bind(&row.title)
    .bind(row.starts_at)
    .bind(row.duration_minutes)
    .bind(&row.status)
    .bind(&row.notes)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("appointment update failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(Json(updated))
}

/// DELETE /api/appointments/:id - Delete an appointment
pub async fn delete(
    Extension(ctx): Extension<CraftsmanContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND craftsman_id = $2")
        .bind(id)
        .bind(ctx.craftsman_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("appointment delete failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Appointment not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/appointments/availability - Open slots for one calendar day
pub async fn availability(
    Extension(ctx): Extension<CraftsmanContext>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date("date", &payload.date)?;

    let pool = DatabaseManager::pool().await?;
    let store = PgAppointmentStore::new(pool);

    let result = day_availability(&store, ctx.craftsman_id, date)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(result))
}

fn validate_duration(minutes: i32) -> Result<i32, ApiError> {
    if minutes <= 0 {
        return Err(ApiError::bad_request("durationMinutes: must be positive"));
    }
    Ok(minutes)
}

fn validate_status(status: &str) -> Result<AppointmentStatus, ApiError> {
    AppointmentStatus::parse(status).ok_or_else(|| {
        ApiError::bad_request("status: expected one of pending, scheduled, confirmed, cancelled")
    })
}

/// Fetch one appointment scoped to the caller. Absent rows and rows owned
/// by another craftsman are the same 404; the difference must not leak.
async fn fetch_owned(
    store: &dyn AppointmentStore,
    craftsman_id: Uuid,
    id: Uuid,
) -> Result<Appointment, ApiError> {
    store
        .find_by_id(craftsman_id, id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::stores::StoreError;
    use async_trait::async_trait;
    use chrono::{NaiveDateTime, Utc};

    #[test]
    fn duration_must_be_positive() {
        assert!(validate_duration(60).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(-15).is_err());
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(validate_status("confirmed").is_ok());
        assert!(validate_status("finished").is_err());
    }

    struct MemoryAppointments {
        rows: Vec<Appointment>,
    }

    #[async_trait]
    impl AppointmentStore for MemoryAppointments {
        async fn appointments_between(
            &self,
            craftsman_id: Uuid,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> Result<Vec<Appointment>, StoreError> {
            Ok(self
                .rows
                .iter()
                .filter(|a| {
                    a.craftsman_id == craftsman_id && a.starts_at >= from && a.starts_at < to
                })
                .cloned()
                .collect())
        }

        async fn find_by_id(
            &self,
            craftsman_id: Uuid,
            id: Uuid,
        ) -> Result<Option<Appointment>, StoreError> {
            Ok(self
                .rows
                .iter()
                .find(|a| a.id == id && a.craftsman_id == craftsman_id)
                .cloned())
        }
    }

    fn appointment(craftsman_id: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            craftsman_id,
            customer_id: None,
            title: "Site visit".to_string(),
            starts_at: NaiveDateTime::parse_from_str("2026-09-01T10:00:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
            duration_minutes: 60,
            status: "scheduled".to_string(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn own_appointment_is_returned() {
        let craftsman = Uuid::new_v4();
        let apt = appointment(craftsman);
        let id = apt.id;
        let store = MemoryAppointments { rows: vec![apt] };

        let fetched = fetch_owned(&store, craftsman, id).await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn another_tenants_appointment_is_not_found() {
        let craftsman_a = Uuid::new_v4();
        let craftsman_b = Uuid::new_v4();
        let apt_of_a = appointment(craftsman_a);
        let id = apt_of_a.id;
        let store = MemoryAppointments {
            rows: vec![apt_of_a],
        };

        let err = fetch_owned(&store, craftsman_b, id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
