use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderName, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use notifyx_api::auth::AppStateInner;
use notifyx_db::Database;
use notifyx_engine::TextSender;
use notifyx_gateway::GatewayClient;

/// Placeholder JWT secrets that MUST NOT reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifyx=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let environment = std::env::var("NOTIFYX_ENV").unwrap_or_else(|_| "production".into());
    let dev_mode = environment == "development";

    let jwt_secret =
        std::env::var("NOTIFYX_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    if !dev_mode && (jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str())) {
        eprintln!("FATAL: NOTIFYX_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("NOTIFYX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NOTIFYX_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("NOTIFYX_DB_PATH").unwrap_or_else(|_| "notifyx.db".into());
    let gateway_url =
        std::env::var("NOTIFYX_GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let gateway_key = std::env::var("NOTIFYX_GATEWAY_API_KEY").unwrap_or_default();

    // Init database — ":memory:" is the development fallback store
    let db = if db_path == ":memory:" {
        let db = Database::open_in_memory()?;
        db.seed_dev_data()?;
        db
    } else {
        Database::open(&PathBuf::from(&db_path))?
    };

    // Shared state
    let gateway = Arc::new(GatewayClient::new(gateway_url, gateway_key));
    let sender: Arc<dyn TextSender> = gateway.clone();
    let state = Arc::new(AppStateInner {
        db: Arc::new(db),
        gateway,
        sender,
        jwt_secret,
        dev_mode,
    });

    if dev_mode {
        info!("Development mode: tenant scoping on reads is disabled");
    }

    // CORS — permissive so external systems can post webhooks directly
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-webhook-secret"),
        ])
        .allow_credentials(false);

    let app = notifyx_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("NotifyX server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
