//! Embedded HTTP server — liveness text and the pairing QR code.
//!
//! Spawned as a background task by the gateway; shares nothing with the
//! chat flow except the QR image file the gateway maintains.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use lapak_core::config::HttpConfig;
use std::path::PathBuf;
use tracing::{error, info};

/// Shared state for the handlers: where the gateway drops the QR image.
#[derive(Clone)]
pub struct HttpState {
    pub qr_path: PathBuf,
}

/// `GET /` — static liveness text.
async fn index() -> &'static str {
    "Lapak WhatsApp bot running 🚀"
}

/// `GET /qr` — the current pairing QR image, or a placeholder while the
/// channel has not produced one (or the session is already paired).
async fn qr(State(state): State<HttpState>) -> Response {
    match tokio::fs::read(&state.qr_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            "QR belum tersedia, tunggu beberapa saat...",
        )
            .into_response(),
    }
}

/// Serve the HTTP surface until the process exits.
pub async fn serve(config: HttpConfig, qr_path: PathBuf) {
    let app = Router::new()
        .route("/", get(index))
        .route("/qr", get(qr))
        .with_state(HttpState { qr_path });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("http: failed to bind {addr}: {e}");
            return;
        }
    };

    info!("http server listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("http server error: {e}");
    }
}
