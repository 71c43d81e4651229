use axum::response::{IntoResponse, Json};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API entry points"),
    ),
    tag = "root"
)]
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the tessera API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
        "health": "/health",
    }))
}
