use axum::{middleware::from_fn, routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod config;
mod database;
mod error;
mod handlers;
mod identity;
mod middleware;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting Craftsman API in {:?} mode", config.environment);

    tracing_subscriber::fmt::init();

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CRAFTSMAN_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Craftsman API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Phone-assistant webhooks (shared-secret auth, no bearer)
        .merge(assistant_routes())
        // Tenant-scoped API behind the authorization gate
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn protected_routes() -> Router {
    use handlers::protected::{appointments, customers, invoices, materials, profile, quotes};

    Router::new()
        .route(
            "/api/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route("/api/appointments/availability", post(appointments::availability))
        .route(
            "/api/appointments/:id",
            get(appointments::get)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/:id",
            get(customers::get).put(customers::update).delete(customers::delete),
        )
        .route("/api/materials", get(materials::list).post(materials::create))
        .route(
            "/api/materials/:id",
            get(materials::get).put(materials::update).delete(materials::delete),
        )
        .route("/api/quotes", get(quotes::list).post(quotes::create))
        .route(
            "/api/quotes/:id",
            get(quotes::get).put(quotes::update).delete(quotes::delete),
        )
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/api/invoices/:id",
            get(invoices::get).put(invoices::update).delete(invoices::delete),
        )
        .route("/api/profile", get(profile::get).put(profile::update))
        .layer(from_fn(middleware::auth::auth_middleware))
}

fn assistant_routes() -> Router {
    use handlers::assistant;

    Router::new()
        .route("/assistant/check-availability", post(assistant::check_availability))
        .route("/assistant/book-appointment", post(assistant::book_appointment))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Craftsman API",
        "version": version,
        "description": "Business management API for craftsmen (Axum)",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "appointments": "/api/appointments[/:id], /api/appointments/availability (protected)",
            "customers": "/api/customers[/:id] (protected)",
            "materials": "/api/materials[/:id] (protected)",
            "quotes": "/api/quotes[/:id] (protected)",
            "invoices": "/api/invoices[/:id] (protected)",
            "profile": "/api/profile (protected)",
            "assistant": "/assistant/check-availability, /assistant/book-appointment (webhook secret)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "databaseError": e.to_string()
            })),
        ),
    }
}
