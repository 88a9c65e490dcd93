use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rallysplit_api::middleware::require_auth;
use rallysplit_api::{AppState, AppStateInner, payments, sessions, users};
use rallysplit_core::Core;

mod reminders;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rallysplit=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("RALLYSPLIT_DB_PATH").unwrap_or_else(|_| "rallysplit.db".into());
    let host = std::env::var("RALLYSPLIT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RALLYSPLIT_PORT")
        .unwrap_or_else(|_| "3200".into())
        .parse()?;
    let sweep_interval: u64 = std::env::var("RALLYSPLIT_SWEEP_INTERVAL_SECS")
        .unwrap_or_else(|_| "600".into())
        .parse()?;

    // Init database + core
    let db = rallysplit_db::Database::open(&PathBuf::from(&db_path))?;
    let core = Core::new(Arc::new(db));

    // Overdue reminder loop runs beside the server for the life of the process
    let notifier = reminders::Notifier::from_env();
    tokio::spawn(reminders::run_reminder_loop(core.clone(), notifier, sweep_interval));

    let state: AppState = Arc::new(AppStateInner { core });

    // Routes: one per chat-transport intent
    let app = Router::new()
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{session_id}", get(sessions::get_session))
        .route("/sessions/{session_id}/join", post(sessions::join_session))
        .route("/sessions/{session_id}/leave", post(sessions::leave_session))
        .route("/sessions/{session_id}/messages", patch(sessions::patch_messages))
        .route("/sessions/{session_id}/settle", post(sessions::settle_session))
        .route("/sessions/{session_id}/payments", get(payments::payment_status))
        .route("/sessions/{session_id}/payments/claim", post(payments::claim_paid))
        .route("/payments/proof", post(payments::submit_proof))
        .route("/users/{user_id}", get(users::get_user))
        .route("/users/{user_id}/payout-qr", put(users::set_payout_qr))
        .layer(middleware::from_fn(require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Rallysplit server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
