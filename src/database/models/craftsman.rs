use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The tenant record. Every domain row is scoped to exactly one craftsman,
/// and exactly one craftsman exists per authenticated principal
/// (auth_user_id is unique).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Craftsman {
    pub id: Uuid,
    pub auth_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub assistant_phone_number: Option<String>,
    pub assistant_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
