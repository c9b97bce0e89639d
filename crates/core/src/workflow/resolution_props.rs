//! Property-based tests for the resolution evaluator.
//!
//! These validate the workflow invariants: terminal statuses are stable,
//! rejection always wins, percentage comparison is exact, and adding
//! approvals never un-approves an expense.

use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::decision::RecordState;
use crate::workflow::resolution::ResolutionEvaluator;
use crate::workflow::rules::{ApprovalRule, RuleKind};
use crate::workflow::types::{Decision, ExpenseStatus, UserRole};

/// Strategy for a random record decision.
fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Pending),
        Just(Decision::Approved),
        Just(Decision::Rejected),
    ]
}

/// Strategy for a random approver role.
fn arb_role() -> impl Strategy<Value = UserRole> {
    prop_oneof![
        Just(UserRole::Manager),
        Just(UserRole::Admin),
        Just(UserRole::Employee),
    ]
}

/// Strategy for a chain of 1..=8 records.
fn arb_records() -> impl Strategy<Value = Vec<RecordState>> {
    prop::collection::vec((arb_role(), arb_decision(), 1i16..=3), 1..=8).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(role, decision, sequence)| RecordState {
                id: Uuid::new_v4(),
                expense_id: Uuid::nil(),
                approver_id: Uuid::new_v4(),
                approver_role: role,
                sequence_order: sequence,
                decision,
            })
            .collect()
    })
}

fn percentage_rule(required: i32) -> ApprovalRule {
    ApprovalRule {
        id: Uuid::new_v4(),
        name: "Percentage".to_string(),
        kind: RuleKind::Percentage {
            required_percentage: required,
        },
        sequence_order: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Evaluation is deterministic and idempotent over the same inputs.
    #[test]
    fn prop_evaluation_idempotent(records in arb_records(), required in 1i32..=100) {
        let rules = [percentage_rule(required)];
        let first = ResolutionEvaluator::evaluate(&records, &rules);
        let second = ResolutionEvaluator::evaluate(&records, &rules);
        prop_assert_eq!(first, second);
    }

    /// Any rejected record forces the rejected status, whatever the rules say.
    #[test]
    fn prop_rejection_always_wins(records in arb_records(), required in 1i32..=100) {
        prop_assume!(records.iter().any(|r| r.decision == Decision::Rejected));
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(required)]);
        prop_assert_eq!(outcome.status, ExpenseStatus::Rejected);

        // Exactly the still-pending records get superseded.
        let pending = records.iter().filter(|r| r.decision == Decision::Pending).count();
        prop_assert_eq!(outcome.superseded.len(), pending);
    }

    /// Without rejections, the status is pending or approved, never rejected.
    #[test]
    fn prop_no_rejection_never_rejects(records in arb_records(), required in 1i32..=100) {
        prop_assume!(records.iter().all(|r| r.decision != Decision::Rejected));
        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(required)]);
        prop_assert_ne!(outcome.status, ExpenseStatus::Rejected);
        prop_assert!(outcome.superseded.is_empty());
    }

    /// The percentage comparison matches the exact rational definition.
    #[test]
    fn prop_percentage_is_exact_rational(records in arb_records(), required in 1i32..=100) {
        prop_assume!(records.iter().all(|r| r.decision != Decision::Rejected));
        let total = records.len() as u64;
        let approved = records.iter().filter(|r| r.decision == Decision::Approved).count() as u64;
        #[allow(clippy::cast_sign_loss)]
        let threshold_met = approved * 100 >= (required as u64) * total;

        let outcome = ResolutionEvaluator::evaluate(&records, &[percentage_rule(required)]);
        if threshold_met {
            prop_assert_eq!(outcome.status, ExpenseStatus::Approved);
        }
    }

    /// Turning one more pending record into an approval never downgrades
    /// an approved outcome.
    #[test]
    fn prop_approvals_are_monotonic(records in arb_records(), required in 1i32..=100) {
        prop_assume!(records.iter().all(|r| r.decision != Decision::Rejected));
        let rules = [percentage_rule(required)];
        let before = ResolutionEvaluator::evaluate(&records, &rules);

        let mut bumped = records.clone();
        if let Some(r) = bumped.iter_mut().find(|r| r.decision == Decision::Pending) {
            r.decision = Decision::Approved;
        }
        let after = ResolutionEvaluator::evaluate(&bumped, &rules);

        if before.status == ExpenseStatus::Approved {
            prop_assert_eq!(after.status, ExpenseStatus::Approved);
        }
    }

    /// With no rules, approval requires every record to be approved.
    #[test]
    fn prop_default_policy_requires_unanimity(records in arb_records()) {
        prop_assume!(records.iter().all(|r| r.decision != Decision::Rejected));
        let outcome = ResolutionEvaluator::evaluate(&records, &[]);
        let unanimous = records.iter().all(|r| r.decision == Decision::Approved);
        if unanimous {
            prop_assert_eq!(outcome.status, ExpenseStatus::Approved);
        } else {
            prop_assert_eq!(outcome.status, ExpenseStatus::Pending);
        }
    }
}
