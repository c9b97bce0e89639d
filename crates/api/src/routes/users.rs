//! User management routes. Admin only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::{admin_required_response, parse_role, workflow_error_response};
use crate::{AppState, middleware::AuthUser};
use expensa_db::repositories::user::{CreateUserInput, UserRepository, UserWithRole};

/// Creates the user management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/{user_id}/role", patch(assign_role))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,
    /// Email address, unique across companies.
    pub email: String,
    /// Role (admin, manager, employee).
    pub role: String,
    /// Manager assignment; must belong to the same company.
    pub manager_id: Option<Uuid>,
}

/// Request body for changing a user's role.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// New role (admin, manager, employee).
    pub role: String,
    /// New manager assignment; cleared when omitted.
    pub manager_id: Option<Uuid>,
}

/// Response for a user with their role assignment.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Company-scoped employee number.
    pub employee_number: i32,
    /// Role.
    pub role: &'static str,
    /// Assigned manager.
    pub manager_id: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/users` - List company users. Admin only.
async fn list_users(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if !auth.is_admin() {
        return admin_required_response();
    }

    let repo = UserRepository::new((*state.db).clone());

    match repo.list_users(auth.company_id()).await {
        Ok(users) => {
            let data: Vec<UserResponse> = users.into_iter().map(user_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/users` - Create a user in the caller's company. Admin only.
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if !auth.is_admin() {
        return admin_required_response();
    }

    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_fields",
                "message": "Name and email are required"
            })),
        )
            .into_response();
    }

    let role = match parse_role(&payload.role) {
        Ok(role) => role,
        Err(response) => return response,
    };

    let repo = UserRepository::new((*state.db).clone());
    let input = CreateUserInput {
        name: payload.name,
        email: payload.email,
        role,
        manager_id: payload.manager_id,
    };

    match repo.create_user(auth.company_id(), input).await {
        Ok(user) => {
            info!(
                user_id = %user.user.id,
                company_id = %auth.company_id(),
                employee_number = user.user.employee_number,
                "User created"
            );

            (StatusCode::CREATED, Json(user_to_response(user))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// PATCH `/users/{user_id}/role` - Change a user's role and manager.
/// Admin only.
async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> impl IntoResponse {
    if !auth.is_admin() {
        return admin_required_response();
    }

    let role = match parse_role(&payload.role) {
        Ok(role) => role,
        Err(response) => return response,
    };

    let repo = UserRepository::new((*state.db).clone());

    match repo
        .assign_role(auth.company_id(), user_id, role, payload.manager_id)
        .await
    {
        Ok(user) => {
            info!(
                user_id = %user_id,
                role = %payload.role,
                manager_id = ?payload.manager_id,
                "Role assigned"
            );

            (StatusCode::OK, Json(user_to_response(user))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn user_to_response(user: UserWithRole) -> UserResponse {
    UserResponse {
        id: user.user.id,
        name: user.user.name,
        email: user.user.email,
        employee_number: user.user.employee_number,
        role: user.role.as_str(),
        manager_id: user.manager_id,
    }
}
