//! Receipt scanning routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::{AppState, middleware::AuthUser};

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/receipts/scan", post(scan_receipt))
}

/// POST `/receipts/scan` - Extract fields from a receipt image.
///
/// Best effort: every field of the result is optional, and a failed
/// scan returns an empty result rather than an error. Returns 503 when
/// no OCR service is configured.
async fn scan_receipt(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Bytes,
) -> impl IntoResponse {
    let Some(client) = &state.ocr_client else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "ocr_not_configured",
                "message": "Receipt scanning is not available"
            })),
        )
            .into_response();
    };

    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "empty_body",
                "message": "A receipt image is required"
            })),
        )
            .into_response();
    }

    let scan = client.scan(body.to_vec()).await;

    (
        StatusCode::OK,
        Json(json!({
            "amount": scan.amount,
            "date": scan.date,
            "currency": scan.currency
        })),
    )
        .into_response()
}
