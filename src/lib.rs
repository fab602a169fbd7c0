//! # Song Pengsawang API
//!
//! Backend for the Song Pengsawang marketing site: platform metrics, reel
//! content, and a contact form, backed by MongoDB.
//!
//! The database is optional. When `DATABASE_URL`/`DATABASE_NAME` are
//! missing or the server is unreachable at startup, the process still comes
//! up and read endpoints serve a built-in seed catalog, so a preview
//! deployment renders without any infrastructure. See [`store`] for the
//! two-state handle and [`seed`] for the catalog.
//!
//! # Endpoints
//! - `GET /` greeting
//! - `GET /health` backend + database status
//! - `GET /metrics` platform metrics, fallback on store failure
//! - `GET /reels?limit=N` reels, N capped at 50, same fallback
//! - `POST /contact` contact submission, store failures surface as 500
//! - `GET /test` database diagnostics
//!
//! # Configuration
//! - `PORT` listen port, default 8000
//! - `DATABASE_URL` MongoDB connection string, optional
//! - `DATABASE_NAME` database name, optional
//! - `RUST_LOG` tracing filter

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

use routes::{
    contact_handler, health_handler, metrics_handler, reels_handler, root_handler, test_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/reels", get(reels_handler))
        .route("/contact", post(contact_handler))
        .route("/test", get(test_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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
