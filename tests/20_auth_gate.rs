mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn protected_route_without_credentials_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/appointments", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("error").is_some(), "missing error field: {}", body);
    Ok(())
}

#[tokio::test]
async fn invalid_bearer_token_is_indistinguishable_from_missing() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/api/profile", server.base_url))
        .send()
        .await?;
    let invalid = client
        .get(format!("{}/api/profile", server.base_url))
        .bearer_auth("not-a-real-token")
        .send()
        .await?;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unauthenticated_create_performs_no_mutation() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/customers", server.base_url))
        .json(&serde_json::json!({ "name": "Intruder" }))
        .send()
        .await?;

    // Rejected at the gate, before any tenant resolution or write
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn assistant_webhook_without_secret_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/assistant/check-availability", server.base_url))
        .json(&serde_json::json!({ "phoneNumber": "+4915112345678", "date": "2026-09-01" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
