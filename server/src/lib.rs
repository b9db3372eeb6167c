//! Documentation of the public voter-registration backend.
//!
//!
//!
//! # General Infrastructure
//! - Frontend posts self-service sign-ups to this server
//! - Reference catalogs (departments, municipalities, neighborhoods,
//!   coordinators, leaders) are provisioned out-of-band and served read-only
//! - Registrations are deduplicated by national ID document with a single
//!   conflict-resolving insert, so racing submissions cannot duplicate a row
//! - Cloudflare Turnstile verifies a human filled the form before any write
//!
//!
//!
//! # Endpoints
//!
//! Catalog (read-only, ordered by display name):
//! - `GET /catalog/departments`
//! - `GET /catalog/municipalities?department_id=&department=`
//! - `GET /catalog/neighborhoods?municipality_id=`
//! - `GET /catalog/coordinators?search=`
//! - `GET /catalog/leaders?search=&coordinator_id=`
//!
//! Public:
//! - `GET /public/link/resolve?leader=&coord=`
//! - `POST /public/voters/register?mode=public|brigadista|leader_link`
//! - `GET /health`
//!
//!
//!
//! # Configuration
//!
//! Loaded once at startup into an immutable [`config::Config`]:
//! - `RUST_PORT` -- listen port, default 8000
//! - `DATABASE_URL` -- Postgres connection string, required
//! - `TURNSTILE_SECRET_KEY` -- captcha secret, env or `/run/secrets` file
//! - `CORS_ORIGINS` -- comma-separated allowed origins, `*` for any
//! - `CAPTCHA_TEST_BYPASS` -- set to `1` to skip captcha verification,
//!   explicit opt-in for test environments only
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod captcha;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{
    coordinators_handler, departments_handler, health_handler, leaders_handler,
    link_resolve_handler, municipalities_handler, neighborhoods_handler, register_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = cors_layer(&state.config);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/catalog/departments", get(departments_handler))
        .route("/catalog/municipalities", get(municipalities_handler))
        .route("/catalog/neighborhoods", get(neighborhoods_handler))
        .route("/catalog/coordinators", get(coordinators_handler))
        .route("/catalog/leaders", get(leaders_handler))
        .route("/public/link/resolve", get(link_resolve_handler))
        .route("/public/voters/register", post(register_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    println!("Server shutting down...");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
