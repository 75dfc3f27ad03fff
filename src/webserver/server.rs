/// Axum webserver lifecycle: bind, serve, graceful shutdown
use axum::http::HeaderValue;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    config::WebserverConfig,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Start the webserver
///
/// Blocks until `shutdown` is notified.
pub async fn start_server(
    state: Arc<AppState>,
    config: &WebserverConfig,
    shutdown: Arc<Notify>,
) -> Result<(), String> {
    logger::debug(
        LogTag::Webserver,
        &format!("Starting webserver on {}:{}", config.host, config.port),
    );

    let app = build_app(state, config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another fundsu server (or another service) already listens on this port.\n\
             Stop it or set webserver.port / FUNDSU_WEBSERVER_PORT to a free port.",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024.",
            addr, config.port
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(
        LogTag::Webserver,
        &format!("Webserver listening on http://{}/api", addr),
    );

    let shutdown_signal = async move {
        shutdown.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");

    Ok(())
}

/// Router plus middleware
pub fn build_app(state: Arc<AppState>, config: &WebserverConfig) -> Router {
    routes::create_router(state).layer(cors_layer(&config.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                logger::warning(
                    LogTag::Webserver,
                    &format!("Ignoring invalid CORS origin '{}'", origin),
                );
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
