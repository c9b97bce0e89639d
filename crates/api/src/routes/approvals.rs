//! Approval queue and decision routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::workflow_error_response;
use crate::routes::expenses::{expense_status_str, expense_to_response, record_to_response};
use crate::{AppState, middleware::AuthUser};
use expensa_core::workflow::Verdict;
use expensa_db::repositories::approval::ApprovalRepository;

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals/pending", get(list_pending_approvals))
        .route("/approvals/{record_id}", post(decide))
}

/// Request body for deciding an approval record.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// "approved" or "rejected".
    pub decision: String,
    /// Approver comment; required for rejections.
    pub comment: Option<String>,
}

/// GET `/approvals/pending` - The caller's undecided records.
///
/// `can_approve` is false while an earlier record in the sequence is
/// still undecided.
async fn list_pending_approvals(
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let repo = ApprovalRepository::new((*state.db).clone());

    match repo
        .list_pending_for(auth.company_id(), auth.user_id())
        .await
    {
        Ok(items) => {
            let data: Vec<serde_json::Value> = items
                .into_iter()
                .map(|item| {
                    json!({
                        "record": record_to_response(item.record),
                        "expense": expense_to_response(item.expense),
                        "can_approve": item.can_approve
                    })
                })
                .collect();

            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/approvals/{record_id}` - Record the caller's verdict.
async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(record_id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> impl IntoResponse {
    let verdict = match payload.decision.to_lowercase().as_str() {
        "approved" => Verdict::Approved,
        "rejected" => Verdict::Rejected,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_decision",
                    "message": format!("Decision must be 'approved' or 'rejected', got '{other}'")
                })),
            )
                .into_response();
        }
    };

    let repo = ApprovalRepository::new((*state.db).clone());

    match repo
        .record_decision(
            auth.company_id(),
            record_id,
            auth.user_id(),
            verdict,
            payload.comment,
        )
        .await
    {
        Ok(outcome) => {
            info!(
                record_id = %record_id,
                approver_id = %auth.user_id(),
                decision = %payload.decision,
                expense_status = expense_status_str(&outcome.expense.status),
                "Approval decision recorded"
            );

            (
                StatusCode::OK,
                Json(json!({
                    "record": record_to_response(outcome.record),
                    "expense": expense_to_response(outcome.expense)
                })),
            )
                .into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}
