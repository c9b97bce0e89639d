//! Approval rules management routes.
//!
//! Rules only affect resolutions evaluated after the change; terminal
//! expenses are never revisited.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::{admin_required_response, parse_role, workflow_error_response};
use crate::{AppState, middleware::AuthUser};
use expensa_core::workflow::{HybridLogic, RuleKind};
use expensa_db::entities::{approval_rules, sea_orm_active_enums};
use expensa_db::repositories::approval_rule::{
    ApprovalRuleRepository, CreateRuleInput, UpdateRuleInput,
};

/// Creates the approval rules routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies/{company_id}/approval-rules",
            get(list_approval_rules),
        )
        .route(
            "/companies/{company_id}/approval-rules",
            post(create_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            get(get_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            patch(update_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            delete(delete_approval_rule),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an approval rule.
#[derive(Debug, Deserialize)]
pub struct CreateApprovalRuleRequest {
    /// Name of the approval rule.
    pub name: String,
    /// Rule type (percentage, specific_approver, hybrid).
    pub rule_type: String,
    /// Percentage threshold for percentage rules, 1..=100.
    pub required_percentage: Option<i32>,
    /// Designated role for specific_approver rules.
    pub specific_approver_role: Option<String>,
    /// Logic operator for hybrid rules (AND, OR).
    pub hybrid_logic: Option<String>,
    /// Percentage threshold for hybrid rules.
    pub hybrid_percentage: Option<i32>,
    /// Designated role for hybrid rules.
    pub hybrid_approver_role: Option<String>,
    /// Evaluation order; rules without one evaluate last.
    pub sequence_order: Option<i16>,
}

/// Request body for updating an approval rule.
#[derive(Debug, Deserialize)]
pub struct UpdateApprovalRuleRequest {
    /// New name.
    pub name: Option<String>,
    /// New rule type; replaces all type-specific parameters.
    pub rule_type: Option<String>,
    /// Percentage threshold for percentage rules.
    pub required_percentage: Option<i32>,
    /// Designated role for specific_approver rules.
    pub specific_approver_role: Option<String>,
    /// Logic operator for hybrid rules.
    pub hybrid_logic: Option<String>,
    /// Percentage threshold for hybrid rules.
    pub hybrid_percentage: Option<i32>,
    /// Designated role for hybrid rules.
    pub hybrid_approver_role: Option<String>,
    /// New evaluation order.
    pub sequence_order: Option<Option<i16>>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Response for an approval rule.
#[derive(Debug, Serialize)]
pub struct ApprovalRuleResponse {
    /// Rule ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Name.
    pub name: String,
    /// Rule type.
    pub rule_type: &'static str,
    /// Percentage threshold.
    pub required_percentage: Option<i32>,
    /// Designated role.
    pub specific_approver_role: Option<&'static str>,
    /// Logic operator.
    pub hybrid_logic: Option<&'static str>,
    /// Hybrid percentage threshold.
    pub hybrid_percentage: Option<i32>,
    /// Hybrid designated role.
    pub hybrid_approver_role: Option<&'static str>,
    /// Active status.
    pub is_active: bool,
    /// Evaluation order.
    pub sequence_order: Option<i16>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/companies/{company_id}/approval-rules` - List approval rules.
async fn list_approval_rules(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_company(&auth, company_id) {
        return response;
    }

    let repo = ApprovalRuleRepository::new((*state.db).clone());

    match repo.list_rules(company_id).await {
        Ok(rules) => {
            let items: Vec<ApprovalRuleResponse> =
                rules.into_iter().map(rule_to_response).collect();
            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/companies/{company_id}/approval-rules` - Create approval rule.
/// Admin only.
async fn create_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateApprovalRuleRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_admin(&auth, company_id) {
        return response;
    }

    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "name_required",
                "message": "Name is required"
            })),
        )
            .into_response();
    }

    let kind = match build_rule_kind(
        &payload.rule_type,
        payload.required_percentage,
        payload.specific_approver_role.as_deref(),
        payload.hybrid_logic.as_deref(),
        payload.hybrid_percentage,
        payload.hybrid_approver_role.as_deref(),
    ) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let repo = ApprovalRuleRepository::new((*state.db).clone());
    let input = CreateRuleInput {
        name: payload.name,
        kind,
        sequence_order: payload.sequence_order,
    };

    match repo.create_rule(company_id, input).await {
        Ok(rule) => {
            info!(
                company_id = %company_id,
                rule_id = %rule.id,
                "Approval rule created"
            );

            (StatusCode::CREATED, Json(rule_to_response(rule))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/companies/{company_id}/approval-rules/{rule_id}` - Get approval rule.
async fn get_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company(&auth, company_id) {
        return response;
    }

    let repo = ApprovalRuleRepository::new((*state.db).clone());

    match repo.get_rule(company_id, rule_id).await {
        Ok(rule) => (StatusCode::OK, Json(rule_to_response(rule))).into_response(),
        Err(e) => workflow_error_response(&e),
    }
}

/// PATCH `/companies/{company_id}/approval-rules/{rule_id}` - Update
/// approval rule. Admin only.
async fn update_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateApprovalRuleRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_admin(&auth, company_id) {
        return response;
    }

    let kind = match payload.rule_type.as_deref() {
        Some(rule_type) => match build_rule_kind(
            rule_type,
            payload.required_percentage,
            payload.specific_approver_role.as_deref(),
            payload.hybrid_logic.as_deref(),
            payload.hybrid_percentage,
            payload.hybrid_approver_role.as_deref(),
        ) {
            Ok(kind) => Some(kind),
            Err(response) => return response,
        },
        None => None,
    };

    let repo = ApprovalRuleRepository::new((*state.db).clone());
    let input = UpdateRuleInput {
        name: payload.name,
        kind,
        sequence_order: payload.sequence_order,
        is_active: payload.is_active,
    };

    match repo.update_rule(company_id, rule_id, input).await {
        Ok(rule) => {
            info!(
                company_id = %company_id,
                rule_id = %rule_id,
                "Approval rule updated"
            );

            (StatusCode::OK, Json(rule_to_response(rule))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// DELETE `/companies/{company_id}/approval-rules/{rule_id}` -
/// Deactivate approval rule. Admin only.
async fn delete_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_admin(&auth, company_id) {
        return response;
    }

    let repo = ApprovalRuleRepository::new((*state.db).clone());

    match repo.delete_rule(company_id, rule_id).await {
        Ok(()) => {
            info!(
                company_id = %company_id,
                rule_id = %rule_id,
                "Approval rule deactivated"
            );

            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

#[allow(clippy::result_large_err)]
fn check_company(auth: &AuthUser, company_id: Uuid) -> Result<(), axum::response::Response> {
    if auth.company_id() == company_id {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "You are not a member of this company"
            })),
        )
            .into_response())
    }
}

#[allow(clippy::result_large_err)]
fn check_company_admin(auth: &AuthUser, company_id: Uuid) -> Result<(), axum::response::Response> {
    check_company(auth, company_id)?;
    if auth.is_admin() {
        Ok(())
    } else {
        Err(admin_required_response())
    }
}

#[allow(clippy::result_large_err)]
fn build_rule_kind(
    rule_type: &str,
    required_percentage: Option<i32>,
    specific_approver_role: Option<&str>,
    hybrid_logic: Option<&str>,
    hybrid_percentage: Option<i32>,
    hybrid_approver_role: Option<&str>,
) -> Result<RuleKind, axum::response::Response> {
    match rule_type {
        "percentage" => {
            let required_percentage = required_percentage
                .ok_or_else(|| missing_parameter("required_percentage"))?;
            Ok(RuleKind::Percentage {
                required_percentage,
            })
        }
        "specific_approver" => {
            let role = specific_approver_role
                .ok_or_else(|| missing_parameter("specific_approver_role"))?;
            Ok(RuleKind::SpecificApprover {
                role: parse_role(role)?,
            })
        }
        "hybrid" => {
            let percentage =
                hybrid_percentage.ok_or_else(|| missing_parameter("hybrid_percentage"))?;
            let role =
                hybrid_approver_role.ok_or_else(|| missing_parameter("hybrid_approver_role"))?;
            let logic = hybrid_logic.ok_or_else(|| missing_parameter("hybrid_logic"))?;
            let logic = HybridLogic::parse(logic).ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_hybrid_logic",
                        "message": "hybrid_logic must be 'AND' or 'OR'"
                    })),
                )
                    .into_response()
            })?;
            Ok(RuleKind::Hybrid {
                percentage,
                role: parse_role(role)?,
                logic,
            })
        }
        other => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_rule_type",
                "message": format!(
                    "Rule type must be 'percentage', 'specific_approver' or 'hybrid', got '{other}'"
                )
            })),
        )
            .into_response()),
    }
}

fn missing_parameter(name: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "missing_parameter",
            "message": format!("Parameter '{name}' is required for this rule type")
        })),
    )
        .into_response()
}

fn rule_to_response(rule: approval_rules::Model) -> ApprovalRuleResponse {
    ApprovalRuleResponse {
        id: rule.id,
        company_id: rule.company_id,
        name: rule.name,
        rule_type: rule_type_str(&rule.rule_type),
        required_percentage: rule.required_percentage,
        specific_approver_role: rule.specific_approver_role.as_ref().map(role_str),
        hybrid_logic: rule.hybrid_logic.as_ref().map(logic_str),
        hybrid_percentage: rule.hybrid_percentage,
        hybrid_approver_role: rule.hybrid_approver_role.as_ref().map(role_str),
        is_active: rule.is_active,
        sequence_order: rule.sequence_order,
        created_at: rule.created_at.to_rfc3339(),
        updated_at: rule.updated_at.to_rfc3339(),
    }
}

const fn rule_type_str(rule_type: &sea_orm_active_enums::RuleType) -> &'static str {
    match rule_type {
        sea_orm_active_enums::RuleType::Percentage => "percentage",
        sea_orm_active_enums::RuleType::SpecificApprover => "specific_approver",
        sea_orm_active_enums::RuleType::Hybrid => "hybrid",
    }
}

pub(crate) const fn role_str(role: &sea_orm_active_enums::UserRole) -> &'static str {
    match role {
        sea_orm_active_enums::UserRole::Admin => "admin",
        sea_orm_active_enums::UserRole::Manager => "manager",
        sea_orm_active_enums::UserRole::Employee => "employee",
    }
}

const fn logic_str(logic: &sea_orm_active_enums::HybridLogic) -> &'static str {
    match logic {
        sea_orm_active_enums::HybridLogic::And => "AND",
        sea_orm_active_enums::HybridLogic::Or => "OR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expensa_core::workflow::UserRole;
    use rstest::rstest;

    #[test]
    fn test_build_percentage_rule_kind() {
        let kind = build_rule_kind("percentage", Some(60), None, None, None, None).unwrap();
        assert!(matches!(
            kind,
            RuleKind::Percentage {
                required_percentage: 60
            }
        ));
    }

    #[test]
    fn test_build_specific_approver_rule_kind() {
        let kind =
            build_rule_kind("specific_approver", None, Some("admin"), None, None, None).unwrap();
        assert!(matches!(
            kind,
            RuleKind::SpecificApprover {
                role: UserRole::Admin
            }
        ));
    }

    #[test]
    fn test_build_hybrid_rule_kind() {
        let kind = build_rule_kind(
            "hybrid",
            None,
            None,
            Some("OR"),
            Some(50),
            Some("manager"),
        )
        .unwrap();
        assert!(matches!(
            kind,
            RuleKind::Hybrid {
                percentage: 50,
                role: UserRole::Manager,
                logic: HybridLogic::Or
            }
        ));
    }

    #[rstest]
    #[case("amount_threshold", None, None, None, None, None)]
    #[case("percentage", None, None, None, None, None)]
    #[case("specific_approver", None, None, None, None, None)]
    #[case("specific_approver", None, Some("superuser"), None, None, None)]
    #[case("hybrid", None, None, Some("AND"), Some(50), None)]
    #[case("hybrid", None, None, Some("XOR"), Some(50), Some("admin"))]
    fn test_build_rule_kind_rejects_invalid_input(
        #[case] rule_type: &str,
        #[case] required_percentage: Option<i32>,
        #[case] specific_approver_role: Option<&str>,
        #[case] hybrid_logic: Option<&str>,
        #[case] hybrid_percentage: Option<i32>,
        #[case] hybrid_approver_role: Option<&str>,
    ) {
        assert!(
            build_rule_kind(
                rule_type,
                required_percentage,
                specific_approver_role,
                hybrid_logic,
                hybrid_percentage,
                hybrid_approver_role,
            )
            .is_err()
        );
    }
}
