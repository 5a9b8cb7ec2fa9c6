use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::database::Database;
use crate::error::OpenHoursError;

pub struct WebServer {
    host: String,
    port: u16,
    db: Arc<Database>,
}

impl WebServer {
    pub fn new(host: String, port: u16, db: Database) -> Self {
        Self {
            host,
            port,
            db: Arc::new(db),
        }
    }

    pub async fn start(&self) -> Result<(), OpenHoursError> {
        let app = create_router(AppState::new(Arc::clone(&self.db)));

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| OpenHoursError::Error(format!("Invalid address: {}", e)))?;

        println!("OpenHours server starting on http://{}", addr);
        println!("   Database: {}", self.db.path().display());

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| OpenHoursError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Server ready to handle requests");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                log::info!("Shutdown signal received");
                println!("\nShutdown signal received - stopping server gracefully...");
            })
            .await
            .map_err(|e| OpenHoursError::Error(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");
        Ok(())
    }
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Open query
        .route("/api/open", get(api::open::get_open))

        // Schedule endpoints
        .route("/api/schedules", post(api::schedules::ingest_schedules))
        .route("/api/schedules/active", get(api::schedules::list_active))

        // Business endpoints
        .route("/api/businesses", get(api::businesses::list_businesses))
        .route("/api/businesses/{name}/history", get(api::businesses::get_history))

        .with_state(app_state)
}

async fn health_check() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::OK,
        Html("<h1>OpenHours Server</h1><p>Server is running</p>"),
    )
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            log::info!("Received SIGTERM");
        },
    }
}
