//! Workflow error types for the expense approval lifecycle.

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::ExpenseStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Approval record not found.
    #[error("Approval record {0} not found")]
    RecordNotFound(Uuid),

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    RuleNotFound(Uuid),

    /// User not found in the caller's company.
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// The record already carries a terminal decision.
    #[error("Approval record {record_id} has already been decided")]
    AlreadyDecided {
        /// The record that was re-submitted.
        record_id: Uuid,
    },

    /// Earlier records in the sequence have not reached a terminal decision.
    #[error("Approval record {record_id} at step {sequence_order} is not yet actionable")]
    NotActionable {
        /// The record the approver tried to decide.
        record_id: Uuid,
        /// Its position in the approval sequence.
        sequence_order: i16,
    },

    /// The parent expense already reached a terminal status.
    #[error("Expense {expense_id} is already {status}")]
    ExpenseAlreadyResolved {
        /// The resolved expense.
        expense_id: Uuid,
        /// Its terminal status.
        status: ExpenseStatus,
    },

    /// The caller is not the record's designated approver.
    #[error("User {user_id} is not the designated approver for this record")]
    WrongApprover {
        /// The user who attempted the decision.
        user_id: Uuid,
    },

    /// A rejection was submitted without a comment.
    #[error("A comment is required when rejecting an expense")]
    CommentRequired,

    /// Percentage parameter outside [1, 100].
    #[error("Required percentage must be between 1 and 100, got {value}")]
    InvalidPercentage {
        /// The out-of-range value.
        value: i32,
    },

    /// Unknown role name in a rule parameter or role assignment.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// A stored rule is missing its type-specific parameters.
    #[error("Approval rule {rule_id} has invalid parameters: {detail}")]
    InvalidRuleParameters {
        /// The malformed rule.
        rule_id: Uuid,
        /// What is missing or malformed.
        detail: String,
    },

    /// Manager assignment would create a reporting cycle.
    #[error("Manager assignment for user {user_id} would create a cycle")]
    ManagerCycle {
        /// The user whose assignment was rejected.
        user_id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::CommentRequired
            | Self::InvalidPercentage { .. }
            | Self::InvalidRole(_)
            | Self::InvalidRuleParameters { .. }
            | Self::ManagerCycle { .. } => 400,

            Self::WrongApprover { .. } => 403,

            Self::RecordNotFound(_)
            | Self::ExpenseNotFound(_)
            | Self::RuleNotFound(_)
            | Self::UserNotFound(_) => 404,

            Self::AlreadyDecided { .. }
            | Self::NotActionable { .. }
            | Self::ExpenseAlreadyResolved { .. } => 409,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::NotActionable { .. } => "NOT_ACTIONABLE",
            Self::ExpenseAlreadyResolved { .. } => "EXPENSE_ALREADY_RESOLVED",
            Self::WrongApprover { .. } => "WRONG_APPROVER",
            Self::CommentRequired => "COMMENT_REQUIRED",
            Self::InvalidPercentage { .. } => "INVALID_PERCENTAGE",
            Self::InvalidRole(_) => "INVALID_ROLE",
            Self::InvalidRuleParameters { .. } => "INVALID_RULE_PARAMETERS",
            Self::ManagerCycle { .. } => "MANAGER_CYCLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_errors_are_409() {
        let err = WorkflowError::AlreadyDecided {
            record_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "ALREADY_DECIDED");

        let err = WorkflowError::NotActionable {
            record_id: Uuid::nil(),
            sequence_order: 2,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "NOT_ACTIONABLE");

        let err = WorkflowError::ExpenseAlreadyResolved {
            expense_id: Uuid::nil(),
            status: ExpenseStatus::Approved,
        };
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("approved"));
    }

    #[test]
    fn test_wrong_approver_is_403() {
        let err = WorkflowError::WrongApprover {
            user_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "WRONG_APPROVER");
    }

    #[test]
    fn test_not_found_errors_are_404() {
        assert_eq!(WorkflowError::RecordNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(
            WorkflowError::ExpenseNotFound(Uuid::nil()).status_code(),
            404
        );
        assert_eq!(WorkflowError::RuleNotFound(Uuid::nil()).status_code(), 404);
    }

    #[test]
    fn test_validation_errors_are_400() {
        assert_eq!(WorkflowError::CommentRequired.status_code(), 400);
        assert_eq!(
            WorkflowError::InvalidPercentage { value: 0 }.status_code(),
            400
        );
        assert_eq!(
            WorkflowError::InvalidRole("owner".into()).status_code(),
            400
        );
    }

    #[test]
    fn test_database_error_is_500() {
        let err = WorkflowError::Database("connection lost".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
