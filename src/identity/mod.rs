use async_trait::async_trait;
use axum::http::HeaderMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config;

/// The authenticated caller for the duration of one request. Never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Verifies an opaque bearer token against the identity provider.
///
/// Missing, malformed, expired and rejected tokens all collapse to None;
/// callers cannot distinguish them, so unauthenticated clients learn nothing
/// from the failure mode. Transient provider failures also collapse to None
/// (fail-closed, no retries).
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<Principal>;
}

/// Shape of the identity provider's user-info response.
#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: Option<String>,
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    let timeout = config::config().identity.request_timeout_secs;
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .unwrap_or_default()
});

/// Verifies tokens with a read-only call to the provider's user-info endpoint.
pub struct HttpTokenVerifier;

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Principal> {
        let identity = &config::config().identity;
        let url = format!("{}/auth/v1/user", identity.base_url.trim_end_matches('/'));

        let response = HTTP_CLIENT
            .get(&url)
            .bearer_auth(token)
            .header("apikey", &identity.api_key)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                debug!("identity provider unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("identity provider rejected token: {}", response.status());
            return None;
        }

        let user: UserInfo = response.json().await.ok()?;
        Some(Principal {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.and_then(|m| m.full_name),
        })
    }
}

/// Extract the bearer token from an Authorization header.
///
/// A missing header, a non-Bearer scheme and an empty token all yield None;
/// the distinction is deliberately not surfaced.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?;

    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
