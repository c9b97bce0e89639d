//! Expense submission and status routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::{admin_required_response, app_error_response, workflow_error_response};
use crate::{AppState, middleware::AuthUser};
use expensa_db::entities::{approval_records, companies, expenses, sea_orm_active_enums};
use expensa_db::repositories::expense::{CreateExpenseInput, ExpenseRepository};
use expensa_shared::{AppError, AppResult};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(create_expense))
        .route("/expenses", get(list_company_expenses))
        .route("/expenses/mine", get(list_my_expenses))
        .route("/expenses/{expense_id}/status", get(get_expense_status))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Amount in the submitted currency.
    pub amount: Decimal,
    /// Currency of the submitted amount (ISO 4217).
    pub currency: String,
    /// Expense category.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Stored receipt path, if a receipt was uploaded.
    pub receipt_path: Option<String>,
}

/// Response for an expense.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Owner user ID.
    pub owner_id: Uuid,
    /// Amount in the company currency.
    pub amount: String,
    /// Company currency.
    pub currency: String,
    /// Amount as submitted.
    pub original_amount: String,
    /// Currency as submitted.
    pub original_currency: String,
    /// Rate applied at submission time.
    pub exchange_rate: String,
    /// Category.
    pub category: String,
    /// Description.
    pub description: String,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Lifecycle status.
    pub status: &'static str,
    /// Stored receipt path.
    pub receipt_path: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

/// One approval record in a status response.
#[derive(Debug, Serialize)]
pub struct ApprovalRecordResponse {
    /// Record ID.
    pub id: Uuid,
    /// The required approver.
    pub approver_id: Uuid,
    /// Position in the approval sequence.
    pub sequence_order: i16,
    /// Decision state.
    pub decision: &'static str,
    /// Approver comment.
    pub comment: Option<String>,
    /// When the decision was made.
    pub decided_at: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/expenses` - Submit an expense.
///
/// Converts the submitted amount into the company currency (falling
/// back to the submitted amount when the rate lookup fails) and creates
/// the approval chain atomically with the expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    if payload.amount <= Decimal::ZERO {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Amount must be positive"
            })),
        )
            .into_response();
    }
    if payload.description.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "description_required",
                "message": "Description is required"
            })),
        )
            .into_response();
    }

    let company = match load_company(&state, auth.company_id()).await {
        Ok(company) => company,
        Err(e) => return app_error_response(&e),
    };

    let conversion = state
        .rate_client
        .convert(payload.amount, &payload.currency, &company.currency)
        .await;

    let repo = ExpenseRepository::new((*state.db).clone());
    let input = CreateExpenseInput {
        amount: conversion.amount,
        currency: conversion.currency,
        original_amount: conversion.original_amount,
        original_currency: conversion.original_currency,
        exchange_rate: conversion.exchange_rate,
        category: payload.category,
        description: payload.description,
        expense_date: payload.expense_date,
        receipt_path: payload.receipt_path,
    };

    match repo
        .create_expense(auth.company_id(), auth.user_id(), input)
        .await
    {
        Ok(created) => {
            info!(
                expense_id = %created.expense.id,
                owner_id = %auth.user_id(),
                approvers = created.records.len(),
                "Expense submitted"
            );

            (
                StatusCode::CREATED,
                Json(json!({
                    "expense": expense_to_response(created.expense),
                    "approval_records": created
                        .records
                        .into_iter()
                        .map(record_to_response)
                        .collect::<Vec<_>>()
                })),
            )
                .into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/expenses/mine` - List the caller's expenses.
async fn list_my_expenses(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_for_owner(auth.user_id()).await {
        Ok(items) => {
            let data: Vec<ExpenseResponse> =
                items.into_iter().map(expense_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/expenses` - List every expense of the company. Admin only.
async fn list_company_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    if !auth.is_admin() {
        return admin_required_response();
    }

    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_for_company(auth.company_id()).await {
        Ok(items) => {
            let data: Vec<ExpenseResponse> =
                items.into_iter().map(expense_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/expenses/{expense_id}/status` - Expense with its approval
/// records.
async fn get_expense_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.get_expense(auth.company_id(), expense_id).await {
        Ok(found) => (
            StatusCode::OK,
            Json(json!({
                "expense": expense_to_response(found.expense),
                "approval_records": found
                    .records
                    .into_iter()
                    .map(record_to_response)
                    .collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => workflow_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads the caller's company record.
async fn load_company(state: &AppState, company_id: Uuid) -> AppResult<companies::Model> {
    companies::Entity::find_by_id(company_id)
        .one(&*state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Company {company_id}")))
}

pub(crate) fn expense_to_response(expense: expenses::Model) -> ExpenseResponse {
    ExpenseResponse {
        id: expense.id,
        owner_id: expense.owner_id,
        amount: expense.amount.to_string(),
        currency: expense.currency,
        original_amount: expense.original_amount.to_string(),
        original_currency: expense.original_currency,
        exchange_rate: expense.exchange_rate.to_string(),
        category: expense.category,
        description: expense.description,
        expense_date: expense.expense_date,
        status: expense_status_str(&expense.status),
        receipt_path: expense.receipt_path,
        created_at: expense.created_at.to_rfc3339(),
    }
}

pub(crate) fn record_to_response(record: approval_records::Model) -> ApprovalRecordResponse {
    ApprovalRecordResponse {
        id: record.id,
        approver_id: record.approver_id,
        sequence_order: record.sequence_order,
        decision: decision_str(&record.decision),
        comment: record.comment,
        decided_at: record.decided_at.map(|t| t.to_rfc3339()),
    }
}

pub(crate) const fn expense_status_str(
    status: &sea_orm_active_enums::ExpenseStatus,
) -> &'static str {
    match status {
        sea_orm_active_enums::ExpenseStatus::Pending => "pending",
        sea_orm_active_enums::ExpenseStatus::Approved => "approved",
        sea_orm_active_enums::ExpenseStatus::Rejected => "rejected",
    }
}

pub(crate) const fn decision_str(
    decision: &sea_orm_active_enums::ApprovalDecision,
) -> &'static str {
    match decision {
        sea_orm_active_enums::ApprovalDecision::Pending => "pending",
        sea_orm_active_enums::ApprovalDecision::Approved => "approved",
        sea_orm_active_enums::ApprovalDecision::Rejected => "rejected",
        sea_orm_active_enums::ApprovalDecision::Superseded => "superseded",
    }
}
