use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::stores::PgCraftsmanStore;
use crate::error::ApiError;
use crate::identity::{extract_bearer_token, HttpTokenVerifier, Principal, TokenVerifier};
use crate::services::resolver::resolve_or_create;

/// Resolved tenant context injected into every protected request.
#[derive(Clone, Debug)]
pub struct CraftsmanContext {
    pub craftsman_id: Uuid,
    pub principal: Principal,
}

/// Authorization gate for tenant-scoped routes.
///
/// Validates the bearer credential, resolves (or lazily creates) the
/// craftsman row, and injects the CraftsmanContext extension. Handlers
/// behind this middleware never read a client-supplied tenant id; the
/// resolved one is the only tenant identity in play.
pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Missing and invalid tokens are deliberately the same failure.
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid credentials"))?;

    let principal = HttpTokenVerifier
        .verify(token)
        .await
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid credentials"))?;

    let pool = DatabaseManager::pool().await?;
    let store = PgCraftsmanStore::new(pool);
    let craftsman_id = resolve_or_create(&store, &principal).await?;

    request.extensions_mut().insert(CraftsmanContext {
        craftsman_id,
        principal,
    });

    Ok(next.run(request).await)
}
