//! Approval repository: pending queues and decision recording.
//!
//! Recording a decision runs inside one database transaction: validate
//! with the core decision service, apply the record mutation with a
//! compare-and-set on its `pending` decision, re-derive the expense
//! status with the resolution evaluator, and persist the outcome.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use expensa_core::workflow::{
    sort_by_sequence, ApprovalRule, Decision, DecisionService, ExpenseStatus, RecordState,
    ResolutionEvaluator, UserRole, Verdict, WorkflowError,
};

use crate::entities::{
    approval_records, approval_rules,
    expenses::{self, Model as ExpenseModel},
    sea_orm_active_enums::{ApprovalDecision, ExpenseStatus as DbExpenseStatus},
    user_roles,
};

use super::approval_rule::model_to_rule;
use super::user::db_role_to_core;

/// A pending approval record with its expense, from an approver's
/// point of view.
#[derive(Debug, Clone)]
pub struct PendingApproval {
    /// The undecided approval record.
    pub record: approval_records::Model,
    /// The expense awaiting the decision.
    pub expense: ExpenseModel,
    /// False while an earlier record in the sequence is undecided.
    pub can_approve: bool,
}

/// Result of a recorded decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// The decided record.
    pub record: approval_records::Model,
    /// The expense after re-resolution.
    pub expense: ExpenseModel,
}

/// Repository for approval decisions.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the caller's undecided approval records on still-pending
    /// expenses, newest expense first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending_for(
        &self,
        company_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        let rows = approval_records::Entity::find()
            .filter(approval_records::Column::ApproverId.eq(approver_id))
            .filter(approval_records::Column::Decision.eq(ApprovalDecision::Pending))
            .find_also_related(expenses::Entity)
            .order_by_desc(approval_records::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (record, expense) in rows {
            let Some(expense) = expense else {
                continue;
            };
            if expense.company_id != company_id
                || expense.status != DbExpenseStatus::Pending
            {
                continue;
            }
            candidates.push((record, expense));
        }

        // One batched sibling load for every candidate expense.
        let expense_ids: Vec<Uuid> = candidates.iter().map(|(r, _)| r.expense_id).collect();
        let sibling_sets = load_record_state_sets(&self.db, &expense_ids).await?;

        let mut result = Vec::with_capacity(candidates.len());
        for (record, expense) in candidates {
            let siblings = sibling_sets
                .get(&record.expense_id)
                .map_or(&[][..], Vec::as_slice);
            let state = siblings
                .iter()
                .find(|s| s.id == record.id)
                .copied()
                .ok_or(WorkflowError::RecordNotFound(record.id))?;
            let can_approve = DecisionService::is_actionable(&state, siblings);

            result.push(PendingApproval {
                record,
                expense,
                can_approve,
            });
        }

        Ok(result)
    }

    /// Records an approver's verdict on one approval record and
    /// re-resolves the expense.
    ///
    /// # Errors
    ///
    /// Returns the core precondition errors (`WrongApprover`,
    /// `AlreadyDecided`, `NotActionable`, `ExpenseAlreadyResolved`,
    /// `CommentRequired`), `RecordNotFound`/`ExpenseNotFound` for
    /// lookups, or a database error.
    pub async fn record_decision(
        &self,
        company_id: Uuid,
        record_id: Uuid,
        approver_id: Uuid,
        verdict: Verdict,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let record = approval_records::Entity::find_by_id(record_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::RecordNotFound(record_id))?;

        // Lock the expense row for the rest of the transaction. Concurrent
        // decisions on the same expense serialize here, so each evaluation
        // sees every decision committed before it.
        let expense = expenses::Entity::find_by_id(record.expense_id)
            .filter(expenses::Column::CompanyId.eq(company_id))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(record.expense_id))?;

        let siblings = load_record_states(&txn, record.expense_id).await?;
        let state = siblings
            .iter()
            .find(|s| s.id == record_id)
            .copied()
            .ok_or(WorkflowError::RecordNotFound(record_id))?;

        let action = DecisionService::record_decision(
            db_status_to_core(&expense.status),
            &state,
            &siblings,
            approver_id,
            verdict,
            comment,
        )?;

        // Compare-and-set on the pending decision; a concurrent decision
        // on the same record loses here instead of overwriting.
        let now = Utc::now().into();
        let applied = approval_records::Entity::update_many()
            .set(approval_records::ActiveModel {
                decision: Set(core_decision_to_db(action.new_decision)),
                comment: Set(action.comment.clone()),
                decided_at: Set(Some(action.decided_at.into())),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(approval_records::Column::Id.eq(record_id))
            .filter(approval_records::Column::Decision.eq(ApprovalDecision::Pending))
            .exec(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        if applied.rows_affected != 1 {
            return Err(WorkflowError::AlreadyDecided { record_id });
        }

        let mut updated_states = siblings;
        for s in &mut updated_states {
            if s.id == record_id {
                s.decision = action.new_decision;
            }
        }

        let rules = load_active_rules(&txn, company_id).await?;
        let outcome = ResolutionEvaluator::evaluate(&updated_states, &rules);

        if outcome.status.is_terminal() {
            let mut active: expenses::ActiveModel = expense.into();
            active.status = Set(core_status_to_db(outcome.status));
            active.updated_at = Set(now);
            active
                .update(&txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;

            if !outcome.superseded.is_empty() {
                approval_records::Entity::update_many()
                    .set(approval_records::ActiveModel {
                        decision: Set(ApprovalDecision::Superseded),
                        updated_at: Set(now),
                        ..Default::default()
                    })
                    .filter(approval_records::Column::Id.is_in(outcome.superseded.clone()))
                    .filter(approval_records::Column::Decision.eq(ApprovalDecision::Pending))
                    .exec(&txn)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?;
            }
        }

        let record = approval_records::Entity::find_by_id(record_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::RecordNotFound(record_id))?;
        let expense = expenses::Entity::find_by_id(record.expense_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(record.expense_id))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(DecisionOutcome { record, expense })
    }
}

/// Loads every approval record of an expense as core record states,
/// with the approver's current role attached.
async fn load_record_states<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> Result<Vec<RecordState>, WorkflowError> {
    let mut sets = load_record_state_sets(conn, &[expense_id]).await?;
    Ok(sets.remove(&expense_id).unwrap_or_default())
}

/// Loads the approval records of a set of expenses in two queries
/// (records, then approver roles), grouped by expense.
async fn load_record_state_sets<C: ConnectionTrait>(
    conn: &C,
    expense_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<RecordState>>, WorkflowError> {
    if expense_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let records = approval_records::Entity::find()
        .filter(approval_records::Column::ExpenseId.is_in(expense_ids.iter().copied()))
        .order_by_asc(approval_records::Column::SequenceOrder)
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    let approver_ids: Vec<Uuid> = records.iter().map(|r| r.approver_id).collect();
    let role_rows = user_roles::Entity::find()
        .filter(user_roles::Column::UserId.is_in(approver_ids))
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    let mut sets: HashMap<Uuid, Vec<RecordState>> = HashMap::new();
    for r in &records {
        let role = role_rows
            .iter()
            .find(|row| row.user_id == r.approver_id)
            .map_or(UserRole::Employee, |row| db_role_to_core(&row.role));
        sets.entry(r.expense_id).or_default().push(RecordState {
            id: r.id,
            expense_id: r.expense_id,
            approver_id: r.approver_id,
            approver_role: role,
            sequence_order: r.sequence_order,
            decision: db_decision_to_core(&r.decision),
        });
    }
    Ok(sets)
}

/// Loads the active rules of a company in evaluation order, skipping
/// rows with invalid parameters.
async fn load_active_rules<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<Vec<ApprovalRule>, WorkflowError> {
    let rows = approval_rules::Entity::find()
        .filter(approval_rules::Column::CompanyId.eq(company_id))
        .filter(approval_rules::Column::IsActive.eq(true))
        .all(conn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

    let mut rules = Vec::with_capacity(rows.len());
    for row in rows {
        match model_to_rule(&row) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    rule_id = %row.id,
                    company_id = %company_id,
                    error = %e,
                    "skipping approval rule with invalid parameters"
                );
            }
        }
    }
    sort_by_sequence(&mut rules);
    Ok(rules)
}

pub(crate) fn db_status_to_core(status: &DbExpenseStatus) -> ExpenseStatus {
    match status {
        DbExpenseStatus::Pending => ExpenseStatus::Pending,
        DbExpenseStatus::Approved => ExpenseStatus::Approved,
        DbExpenseStatus::Rejected => ExpenseStatus::Rejected,
    }
}

pub(crate) fn core_status_to_db(status: ExpenseStatus) -> DbExpenseStatus {
    match status {
        ExpenseStatus::Pending => DbExpenseStatus::Pending,
        ExpenseStatus::Approved => DbExpenseStatus::Approved,
        ExpenseStatus::Rejected => DbExpenseStatus::Rejected,
    }
}

pub(crate) fn db_decision_to_core(decision: &ApprovalDecision) -> Decision {
    match decision {
        ApprovalDecision::Pending => Decision::Pending,
        ApprovalDecision::Approved => Decision::Approved,
        ApprovalDecision::Rejected => Decision::Rejected,
        ApprovalDecision::Superseded => Decision::Superseded,
    }
}

pub(crate) fn core_decision_to_db(decision: Decision) -> ApprovalDecision {
    match decision {
        Decision::Pending => ApprovalDecision::Pending,
        Decision::Approved => ApprovalDecision::Approved,
        Decision::Rejected => ApprovalDecision::Rejected,
        Decision::Superseded => ApprovalDecision::Superseded,
    }
}
