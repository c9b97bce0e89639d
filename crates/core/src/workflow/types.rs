//! Workflow domain types for the expense approval lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Expense status in the approval workflow.
///
/// Expenses are created as `Pending` and transition exactly once to
/// either `Approved` or `Rejected`. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Expense is awaiting approval decisions.
    Pending,
    /// Expense has been approved (immutable).
    Approved,
    /// Expense has been rejected (immutable).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the expense can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision state of a single approval record.
///
/// Records start `Pending` and are mutated exactly once: either by their
/// designated approver (`Approved`/`Rejected`) or force-closed by the
/// resolution evaluator (`Superseded`) when a sibling rejection resolves
/// the expense first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Awaiting the approver's decision.
    Pending,
    /// Approver approved.
    Approved,
    /// Approver rejected.
    Rejected,
    /// Closed without a decision because the expense resolved first.
    Superseded,
}

impl Decision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "superseded" => Some(Self::Superseded),
            _ => None,
        }
    }

    /// Returns true once the record can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The decision an approver submits. `Superseded` is never submitted
/// directly, so it is not a valid verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Approve the record.
    Approved,
    /// Reject the record (requires a comment).
    Rejected,
}

impl Verdict {
    /// The record decision this verdict results in.
    #[must_use]
    pub const fn as_decision(&self) -> Decision {
        match self {
            Self::Approved => Decision::Approved,
            Self::Rejected => Decision::Rejected,
        }
    }
}

/// User role in the company hierarchy.
///
/// Roles are ordered from lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Submits expenses.
    Employee = 0,
    /// Approves their reports' expenses.
    Manager = 1,
    /// Full access: configures rules, roles, and approves as cohort.
    Admin = 2,
}

impl UserRole {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_status_round_trip() {
        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("draft"), None);
    }

    #[test]
    fn test_expense_status_terminality() {
        assert!(!ExpenseStatus::Pending.is_terminal());
        assert!(ExpenseStatus::Approved.is_terminal());
        assert!(ExpenseStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_decision_round_trip() {
        for decision in [
            Decision::Pending,
            Decision::Approved,
            Decision::Rejected,
            Decision::Superseded,
        ] {
            assert_eq!(Decision::parse(decision.as_str()), Some(decision));
        }
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn test_decision_terminality() {
        assert!(!Decision::Pending.is_terminal());
        assert!(Decision::Approved.is_terminal());
        assert!(Decision::Rejected.is_terminal());
        assert!(Decision::Superseded.is_terminal());
    }

    #[test]
    fn test_verdict_as_decision() {
        assert_eq!(Verdict::Approved.as_decision(), Decision::Approved);
        assert_eq!(Verdict::Rejected.as_decision(), Decision::Rejected);
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(UserRole::parse("Employee"), Some(UserRole::Employee));
        assert_eq!(UserRole::parse("MANAGER"), Some(UserRole::Manager));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("owner"), None);
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Employee < UserRole::Manager);
        assert!(UserRole::Manager < UserRole::Admin);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ExpenseStatus::Pending), "pending");
        assert_eq!(format!("{}", Decision::Superseded), "superseded");
        assert_eq!(format!("{}", UserRole::Manager), "manager");
    }
}
