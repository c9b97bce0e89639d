//! Database enum types mapped to Postgres enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role within a company.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Company administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Manager of one or more employees.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Regular employee.
    #[sea_orm(string_value = "employee")]
    Employee,
}

/// Expense lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting approval decisions.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Terminal: approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Terminal: rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Decision state of an approval record.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_decision")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Awaiting the approver.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Terminal: approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Terminal: rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Terminal: closed without a decision because the expense resolved.
    #[sea_orm(string_value = "superseded")]
    Superseded,
}

/// Approval rule type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rule_type")]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Percentage-of-approvers rule.
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// Designated-role rule.
    #[sea_orm(string_value = "specific_approver")]
    SpecificApprover,
    /// Percentage + designated role combined.
    #[sea_orm(string_value = "hybrid")]
    Hybrid,
}

/// Logic operator of a hybrid rule.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "hybrid_logic")]
#[serde(rename_all = "UPPERCASE")]
pub enum HybridLogic {
    /// Both conditions must hold.
    #[sea_orm(string_value = "AND")]
    And,
    /// Either condition suffices.
    #[sea_orm(string_value = "OR")]
    Or,
}
