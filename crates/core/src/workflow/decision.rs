//! Per-record decision preconditions and effects.
//!
//! A record is mutated exactly once, by its designated approver, and only
//! while the parent expense is still pending. The repository applies the
//! resulting `DecisionAction` with a compare-and-set on the record's
//! `pending` decision inside a database transaction, then re-runs the
//! resolution evaluator before committing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Decision, ExpenseStatus, UserRole, Verdict};

/// The state of one approval record as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordState {
    /// Record identifier.
    pub id: Uuid,
    /// The parent expense.
    pub expense_id: Uuid,
    /// The designated approver.
    pub approver_id: Uuid,
    /// The approver's role, needed for specific-approver rules.
    pub approver_role: UserRole,
    /// Position in the approval sequence.
    pub sequence_order: i16,
    /// Current decision.
    pub decision: Decision,
}

/// The validated mutation to apply to an approval record.
#[derive(Debug, Clone)]
pub struct DecisionAction {
    /// The record being decided.
    pub record_id: Uuid,
    /// The new terminal decision.
    pub new_decision: Decision,
    /// Optional approver comment (required for rejections).
    pub comment: Option<String>,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

/// Stateless service validating a single approver's decision.
pub struct DecisionService;

impl DecisionService {
    /// Validates a decision against a record and its siblings.
    ///
    /// `siblings` must contain every approval record of the same expense,
    /// including `record` itself.
    ///
    /// # Errors
    ///
    /// - `ExpenseAlreadyResolved` if the expense left `pending`
    /// - `WrongApprover` if the caller is not the record's approver
    /// - `AlreadyDecided` if the record is already terminal
    /// - `CommentRequired` for a rejection without a comment
    /// - `NotActionable` if a lower-sequence record is still pending
    pub fn record_decision(
        expense_status: ExpenseStatus,
        record: &RecordState,
        siblings: &[RecordState],
        approver_id: Uuid,
        verdict: Verdict,
        comment: Option<String>,
    ) -> Result<DecisionAction, WorkflowError> {
        if expense_status.is_terminal() {
            return Err(WorkflowError::ExpenseAlreadyResolved {
                expense_id: record.expense_id,
                status: expense_status,
            });
        }

        if record.approver_id != approver_id {
            return Err(WorkflowError::WrongApprover {
                user_id: approver_id,
            });
        }

        if record.decision.is_terminal() {
            return Err(WorkflowError::AlreadyDecided {
                record_id: record.id,
            });
        }

        if verdict == Verdict::Rejected
            && comment.as_deref().is_none_or(|c| c.trim().is_empty())
        {
            return Err(WorkflowError::CommentRequired);
        }

        if !Self::is_actionable(record, siblings) {
            return Err(WorkflowError::NotActionable {
                record_id: record.id,
                sequence_order: record.sequence_order,
            });
        }

        Ok(DecisionAction {
            record_id: record.id,
            new_decision: verdict.as_decision(),
            comment,
            decided_at: Utc::now(),
        })
    }

    /// Returns true if every record at a strictly lower sequence position
    /// is terminal (sequence gating).
    #[must_use]
    pub fn is_actionable(record: &RecordState, siblings: &[RecordState]) -> bool {
        siblings
            .iter()
            .filter(|s| s.sequence_order < record.sequence_order)
            .all(|s| s.decision.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(approver: Uuid, sequence: i16, decision: Decision) -> RecordState {
        RecordState {
            id: Uuid::new_v4(),
            expense_id: Uuid::nil(),
            approver_id: approver,
            approver_role: UserRole::Manager,
            sequence_order: sequence,
            decision,
        }
    }

    #[test]
    fn test_approve_pending_record() {
        let approver = Uuid::new_v4();
        let rec = record(approver, 1, Decision::Pending);
        let siblings = [rec];

        let action = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &rec,
            &siblings,
            approver,
            Verdict::Approved,
            None,
        )
        .expect("decision should be accepted");

        assert_eq!(action.new_decision, Decision::Approved);
        assert_eq!(action.record_id, rec.id);
    }

    #[test]
    fn test_wrong_approver_forbidden() {
        let rec = record(Uuid::new_v4(), 1, Decision::Pending);
        let intruder = Uuid::new_v4();

        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &rec,
            &[rec],
            intruder,
            Verdict::Approved,
            None,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::WrongApprover { user_id }) if user_id == intruder
        ));
    }

    #[test]
    fn test_already_decided_rejected() {
        let approver = Uuid::new_v4();
        let rec = record(approver, 1, Decision::Approved);

        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &rec,
            &[rec],
            approver,
            Verdict::Approved,
            None,
        );
        assert!(matches!(result, Err(WorkflowError::AlreadyDecided { .. })));
    }

    #[test]
    fn test_superseded_record_counts_as_decided() {
        let approver = Uuid::new_v4();
        let rec = record(approver, 2, Decision::Superseded);

        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &rec,
            &[rec],
            approver,
            Verdict::Approved,
            None,
        );
        assert!(matches!(result, Err(WorkflowError::AlreadyDecided { .. })));
    }

    #[test]
    fn test_sequence_gating_blocks_later_step() {
        let manager = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let manager_rec = record(manager, 1, Decision::Pending);
        let admin_rec = record(admin, 2, Decision::Pending);
        let siblings = [manager_rec, admin_rec];

        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &admin_rec,
            &siblings,
            admin,
            Verdict::Approved,
            None,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::NotActionable {
                sequence_order: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_later_step_actionable_after_earlier_terminal() {
        let manager = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let manager_rec = record(manager, 1, Decision::Approved);
        let admin_rec = record(admin, 2, Decision::Pending);
        let siblings = [manager_rec, admin_rec];

        assert!(DecisionService::is_actionable(&admin_rec, &siblings));
        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &admin_rec,
            &siblings,
            admin,
            Verdict::Approved,
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejection_requires_comment() {
        let approver = Uuid::new_v4();
        let rec = record(approver, 1, Decision::Pending);

        for comment in [None, Some(String::new()), Some("   ".to_string())] {
            let result = DecisionService::record_decision(
                ExpenseStatus::Pending,
                &rec,
                &[rec],
                approver,
                Verdict::Rejected,
                comment,
            );
            assert!(matches!(result, Err(WorkflowError::CommentRequired)));
        }

        let result = DecisionService::record_decision(
            ExpenseStatus::Pending,
            &rec,
            &[rec],
            approver,
            Verdict::Rejected,
            Some("Missing receipt".to_string()),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_terminal_expense_refuses_decisions() {
        let approver = Uuid::new_v4();
        let rec = record(approver, 1, Decision::Pending);

        for status in [ExpenseStatus::Approved, ExpenseStatus::Rejected] {
            let result = DecisionService::record_decision(
                status,
                &rec,
                &[rec],
                approver,
                Verdict::Approved,
                None,
            );
            assert!(matches!(
                result,
                Err(WorkflowError::ExpenseAlreadyResolved { .. })
            ));
        }
    }

    #[test]
    fn test_first_step_always_actionable() {
        let rec = record(Uuid::new_v4(), 1, Decision::Pending);
        let later = record(Uuid::new_v4(), 2, Decision::Pending);
        assert!(DecisionService::is_actionable(&rec, &[rec, later]));
    }
}
