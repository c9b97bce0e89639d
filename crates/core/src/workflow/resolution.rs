//! Expense status derivation after each recorded decision.
//!
//! The evaluator is pure and idempotent: evaluating the same record set
//! twice yields the same outcome, and the repository skips evaluation
//! entirely once the expense is terminal. Precedence:
//!
//! 1. Any rejected record resolves the expense to rejected; remaining
//!    pending records are force-closed as superseded.
//! 2. An active percentage rule auto-approves once the approved share
//!    meets the threshold.
//! 3. An active specific-approver rule auto-approves once any approver
//!    holding the designated role has approved.
//! 4. An active hybrid rule combines both conditions with AND/OR.
//! 5. Otherwise the expense approves only when every record is approved.
//!
//! Percentage comparison is exact integer arithmetic, never floats.

use uuid::Uuid;

use crate::workflow::decision::RecordState;
use crate::workflow::rules::{ApprovalRule, HybridLogic, RuleKind};
use crate::workflow::types::{Decision, ExpenseStatus, UserRole};

/// The evaluator's verdict on an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// The status the expense should now carry.
    pub status: ExpenseStatus,
    /// Records to force-close as superseded (non-empty only on rejection).
    pub superseded: Vec<Uuid>,
}

impl ResolutionOutcome {
    fn pending() -> Self {
        Self {
            status: ExpenseStatus::Pending,
            superseded: Vec::new(),
        }
    }

    fn approved() -> Self {
        Self {
            status: ExpenseStatus::Approved,
            superseded: Vec::new(),
        }
    }
}

/// Stateless evaluator deriving an expense's status from its records.
pub struct ResolutionEvaluator;

impl ResolutionEvaluator {
    /// Evaluates an expense's records against the company's active rules.
    ///
    /// `rules` must already be validated and ordered (registry order);
    /// `records` must contain every approval record of the expense. An
    /// expense with no records stays pending: an empty chain is a
    /// company misconfiguration, never an auto-approval.
    #[must_use]
    pub fn evaluate(records: &[RecordState], rules: &[ApprovalRule]) -> ResolutionOutcome {
        if records.is_empty() {
            return ResolutionOutcome::pending();
        }

        // Rejection wins over every rule.
        if records.iter().any(|r| r.decision == Decision::Rejected) {
            let superseded = records
                .iter()
                .filter(|r| r.decision == Decision::Pending)
                .map(|r| r.id)
                .collect();
            return ResolutionOutcome {
                status: ExpenseStatus::Rejected,
                superseded,
            };
        }

        let total = records.len();
        let approved = records
            .iter()
            .filter(|r| r.decision == Decision::Approved)
            .count();

        for rule in rules {
            if Self::rule_satisfied(&rule.kind, records, approved, total) {
                return ResolutionOutcome::approved();
            }
        }

        // Default policy: every required record must approve.
        if approved == total {
            return ResolutionOutcome::approved();
        }

        ResolutionOutcome::pending()
    }

    fn rule_satisfied(
        kind: &RuleKind,
        records: &[RecordState],
        approved: usize,
        total: usize,
    ) -> bool {
        match kind {
            RuleKind::Percentage {
                required_percentage,
            } => Self::percentage_met(approved, total, *required_percentage),
            RuleKind::SpecificApprover { role } => Self::role_approved(records, *role),
            RuleKind::Hybrid {
                percentage,
                role,
                logic,
            } => {
                let pct = Self::percentage_met(approved, total, *percentage);
                let specific = Self::role_approved(records, *role);
                match logic {
                    HybridLogic::And => pct && specific,
                    HybridLogic::Or => pct || specific,
                }
            }
        }
    }

    /// Exact rational comparison: `approved / total >= required / 100`.
    fn percentage_met(approved: usize, total: usize, required_percentage: i32) -> bool {
        if total == 0 || required_percentage <= 0 {
            return false;
        }
        let approved = approved as u64;
        let total = total as u64;
        #[allow(clippy::cast_sign_loss)]
        let required = required_percentage as u64;
        approved * 100 >= required * total
    }

    fn role_approved(records: &[RecordState], role: UserRole) -> bool {
        records
            .iter()
            .any(|r| r.approver_role == role && r.decision == Decision::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::rules::HybridLogic;

    fn record(role: UserRole, sequence: i16, decision: Decision) -> RecordState {
        RecordState {
            id: Uuid::new_v4(),
            expense_id: Uuid::nil(),
            approver_id: Uuid::new_v4(),
            approver_role: role,
            sequence_order: sequence,
            decision,
        }
    }

    fn percentage_rule(required: i32) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            name: "Majority".to_string(),
            kind: RuleKind::Percentage {
                required_percentage: required,
            },
            sequence_order: None,
        }
    }

    fn specific_rule(role: UserRole) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            name: "Designated approver".to_string(),
            kind: RuleKind::SpecificApprover { role },
            sequence_order: None,
        }
    }

    fn hybrid_rule(percentage: i32, role: UserRole, logic: HybridLogic) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            name: "Hybrid".to_string(),
            kind: RuleKind::Hybrid {
                percentage,
                role,
                logic,
            },
            sequence_order: None,
        }
    }

    #[test]
    fn test_empty_chain_stays_pending() {
        let outcome = ResolutionEvaluator::evaluate(&[], &[]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_rejection_wins_and_supersedes_pending() {
        let records = vec![
            record(UserRole::Manager, 1, Decision::Rejected),
            record(UserRole::Admin, 2, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(50)]);

        assert_eq!(outcome.status, ExpenseStatus::Rejected);
        assert_eq!(outcome.superseded.len(), 2);
        assert!(outcome.superseded.contains(&records[1].id));
        assert!(outcome.superseded.contains(&records[2].id));
    }

    #[test]
    fn test_rejection_wins_even_when_percentage_met() {
        // 2 of 3 approved (66% >= 50%) but one rejection resolves it.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Rejected),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(50)]);
        assert_eq!(outcome.status, ExpenseStatus::Rejected);
    }

    #[test]
    fn test_percentage_rule_half_of_four() {
        // 50% rule, 4 records: any 2 approvals auto-approve.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(50)]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
        assert!(outcome.superseded.is_empty());
    }

    #[test]
    fn test_percentage_rule_below_threshold_stays_pending() {
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(50)]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_percentage_exact_boundary() {
        // 1 of 3 at 33%: 1*100 >= 33*3 (100 >= 99) holds.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(33)]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);

        // At 34%: 100 >= 102 fails.
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(34)]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_specific_approver_rule() {
        // Admin approval auto-approves even with the manager still pending.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Approved),
        ];
        let outcome =
            ResolutionEvaluator::evaluate(&records, &[specific_rule(UserRole::Admin)]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_specific_approver_role_not_yet_approved() {
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome =
            ResolutionEvaluator::evaluate(&records, &[specific_rule(UserRole::Admin)]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_hybrid_or_satisfied_by_role() {
        let records = vec![
            record(UserRole::Manager, 1, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let rule = hybrid_rule(90, UserRole::Admin, HybridLogic::Or);
        let outcome = ResolutionEvaluator::evaluate(&records, &[rule]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_hybrid_and_requires_both() {
        // Admin approved but only 1 of 3 (33%) against a 60% threshold.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Pending),
            record(UserRole::Admin, 2, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let rule = hybrid_rule(60, UserRole::Admin, HybridLogic::And);
        let outcome = ResolutionEvaluator::evaluate(&records, &[rule.clone()]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);

        // Second approval pushes the share to 66% and satisfies AND.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&records, &[rule]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_default_all_must_approve() {
        let partial = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let outcome = ResolutionEvaluator::evaluate(&partial, &[]);
        assert_eq!(outcome.status, ExpenseStatus::Pending);

        let complete = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Approved),
        ];
        let outcome = ResolutionEvaluator::evaluate(&complete, &[]);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Approved),
        ];
        let rules = [percentage_rule(50)];
        let first = ResolutionEvaluator::evaluate(&records, &rules);
        let second = ResolutionEvaluator::evaluate(&records, &rules);
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_satisfied_rule_in_registry_order_wins() {
        // Both rules would eventually approve; the outcome is the same
        // either way, which is what re-entrancy requires.
        let records = vec![
            record(UserRole::Manager, 1, Decision::Approved),
            record(UserRole::Admin, 2, Decision::Pending),
        ];
        let rules = [percentage_rule(50), specific_rule(UserRole::Admin)];
        let outcome = ResolutionEvaluator::evaluate(&records, &rules);
        assert_eq!(outcome.status, ExpenseStatus::Approved);
    }
}
