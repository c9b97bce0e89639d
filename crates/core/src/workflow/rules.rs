//! Approval rule domain types and validation.
//!
//! Rules are configured per company by admins and consulted by the
//! resolution evaluator after every recorded decision. A rule's
//! parameters are validated on write and re-checked on read; a stored
//! rule with missing or out-of-range parameters is never used silently.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::UserRole;

/// Logic operator combining the two conditions of a hybrid rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HybridLogic {
    /// Both the percentage and the specific-approver condition must hold.
    And,
    /// Either condition suffices.
    Or,
}

impl HybridLogic {
    /// Parses a logic operator from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    /// Returns the string representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for HybridLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type-specific parameters of an approval rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Auto-approve once this share of records has approved.
    Percentage {
        /// Required percentage, integer in [1, 100].
        required_percentage: i32,
    },
    /// Auto-approve once any approver holding this role approves.
    SpecificApprover {
        /// The designated role.
        role: UserRole,
    },
    /// Percentage and specific-approver conditions combined.
    Hybrid {
        /// Required percentage, integer in [1, 100].
        percentage: i32,
        /// The designated role.
        role: UserRole,
        /// How the two conditions combine.
        logic: HybridLogic,
    },
}

impl RuleKind {
    /// Returns the rule type name as stored in the database.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::SpecificApprover { .. } => "specific_approver",
            Self::Hybrid { .. } => "hybrid",
        }
    }
}

/// A company-wide approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: Uuid,
    /// Human-readable name for the rule.
    pub name: String,
    /// Type-specific parameters.
    pub kind: RuleKind,
    /// Position in an ordered multi-rule chain (nulls sort last).
    pub sequence_order: Option<i16>,
}

impl ApprovalRule {
    /// Validates the rule's type-specific parameters.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidPercentage` if a percentage
    /// parameter lies outside [1, 100].
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self.kind {
            RuleKind::Percentage {
                required_percentage,
            } => validate_percentage(required_percentage),
            RuleKind::SpecificApprover { .. } => Ok(()),
            RuleKind::Hybrid { percentage, .. } => validate_percentage(percentage),
        }
    }
}

/// Checks that a percentage parameter lies in [1, 100].
///
/// # Errors
///
/// Returns `WorkflowError::InvalidPercentage` otherwise.
pub fn validate_percentage(value: i32) -> Result<(), WorkflowError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidPercentage { value })
    }
}

/// Sorts rules for evaluation: `sequence_order` ascending, nulls last.
pub fn sort_by_sequence(rules: &mut [ApprovalRule]) {
    rules.sort_by_key(|r| (r.sequence_order.is_none(), r.sequence_order));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rule(kind: RuleKind, sequence_order: Option<i16>) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            name: "Test rule".to_string(),
            kind,
            sequence_order,
        }
    }

    #[test]
    fn test_hybrid_logic_parse() {
        assert_eq!(HybridLogic::parse("AND"), Some(HybridLogic::And));
        assert_eq!(HybridLogic::parse("or"), Some(HybridLogic::Or));
        assert_eq!(HybridLogic::parse("xor"), None);
    }

    #[rstest]
    #[case(1, true)]
    #[case(100, true)]
    #[case(50, true)]
    #[case(0, false)]
    #[case(101, false)]
    #[case(-5, false)]
    fn test_percentage_bounds(#[case] value: i32, #[case] valid: bool) {
        assert_eq!(validate_percentage(value).is_ok(), valid);
    }

    #[test]
    fn test_validate_percentage_rule() {
        let ok = rule(
            RuleKind::Percentage {
                required_percentage: 50,
            },
            None,
        );
        assert!(ok.validate().is_ok());

        let bad = rule(
            RuleKind::Percentage {
                required_percentage: 150,
            },
            None,
        );
        assert!(matches!(
            bad.validate(),
            Err(WorkflowError::InvalidPercentage { value: 150 })
        ));
    }

    #[test]
    fn test_validate_hybrid_rule() {
        let ok = rule(
            RuleKind::Hybrid {
                percentage: 60,
                role: UserRole::Admin,
                logic: HybridLogic::Or,
            },
            None,
        );
        assert!(ok.validate().is_ok());

        let bad = rule(
            RuleKind::Hybrid {
                percentage: 0,
                role: UserRole::Admin,
                logic: HybridLogic::And,
            },
            None,
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_sort_by_sequence_nulls_last() {
        let mut rules = vec![
            rule(
                RuleKind::SpecificApprover {
                    role: UserRole::Admin,
                },
                None,
            ),
            rule(
                RuleKind::Percentage {
                    required_percentage: 50,
                },
                Some(2),
            ),
            rule(
                RuleKind::Percentage {
                    required_percentage: 75,
                },
                Some(1),
            ),
        ];
        sort_by_sequence(&mut rules);

        assert_eq!(rules[0].sequence_order, Some(1));
        assert_eq!(rules[1].sequence_order, Some(2));
        assert_eq!(rules[2].sequence_order, None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(
            RuleKind::Percentage {
                required_percentage: 50
            }
            .type_name(),
            "percentage"
        );
        assert_eq!(
            RuleKind::SpecificApprover {
                role: UserRole::Admin
            }
            .type_name(),
            "specific_approver"
        );
        assert_eq!(
            RuleKind::Hybrid {
                percentage: 60,
                role: UserRole::Admin,
                logic: HybridLogic::Or
            }
            .type_name(),
            "hybrid"
        );
    }
}
