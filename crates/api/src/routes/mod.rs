//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::auth::auth_middleware};
use expensa_core::workflow::{UserRole, WorkflowError};
use expensa_shared::AppError;

pub mod approval_rules;
pub mod approvals;
pub mod expenses;
pub mod health;
pub mod receipts;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(expenses::routes())
        .merge(approvals::routes())
        .merge(approval_rules::routes())
        .merge(users::routes())
        .merge(receipts::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Maps a workflow error onto an HTTP response. Internal details are
/// logged, not surfaced.
pub(crate) fn workflow_error_response(e: &WorkflowError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %e, "request failed");
        return (
            status,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "error": e.error_code().to_lowercase(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// Maps an application error onto an HTTP response, with the same
/// surfacing rules as [`workflow_error_response`].
pub(crate) fn app_error_response(e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %e, "request failed");
        return (
            status,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "error": e.error_code().to_lowercase(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// 403 response for endpoints restricted to company admins.
pub(crate) fn admin_required_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "admin_required",
            "message": "Admin role required for this operation"
        })),
    )
        .into_response()
}

/// Parses a role name from a request, mapping unknown names to a 400.
#[allow(clippy::result_large_err)]
pub(crate) fn parse_role(role: &str) -> Result<UserRole, Response> {
    UserRole::parse(role).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_role",
                "message": format!("Invalid role: {role}")
            })),
        )
            .into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", Some(UserRole::Admin))]
    #[case("Manager", Some(UserRole::Manager))]
    #[case("employee", Some(UserRole::Employee))]
    #[case("superuser", None)]
    #[case("", None)]
    fn test_parse_role(#[case] input: &str, #[case] expected: Option<UserRole>) {
        assert_eq!(parse_role(input).ok(), expected);
    }
}
