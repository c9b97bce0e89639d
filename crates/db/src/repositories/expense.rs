//! Expense repository: submission and status reads.
//!
//! Submitting an expense resolves its approval chain once and persists
//! the expense row and every approval record in a single database
//! transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use expensa_core::workflow::{ChainBuilder, WorkflowError};

use crate::entities::{
    approval_records,
    expenses::{self, Model as ExpenseModel},
    sea_orm_active_enums::{ApprovalDecision, ExpenseStatus as DbExpenseStatus},
    user_roles, users,
};

/// Input for submitting an expense. Amounts are already converted to
/// the company currency; the original submission is kept alongside.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Amount in the company currency.
    pub amount: Decimal,
    /// Company currency code.
    pub currency: String,
    /// Amount as submitted.
    pub original_amount: Decimal,
    /// Currency as submitted.
    pub original_currency: String,
    /// Rate applied at submission time.
    pub exchange_rate: Decimal,
    /// Expense category.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Stored receipt path, if any.
    pub receipt_path: Option<String>,
}

/// An expense together with its approval records, ordered by sequence.
#[derive(Debug, Clone)]
pub struct ExpenseWithRecords {
    /// The expense row.
    pub expense: ExpenseModel,
    /// Its approval records, ordered by sequence.
    pub records: Vec<approval_records::Model>,
}

/// Repository for expense submission and reads.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits an expense and creates its approval records atomically.
    ///
    /// The chain is the owner's manager (sequence 1) followed by every
    /// company admin (sequence 2). The owner never approves their own
    /// expense, so they are excluded from both positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_expense(
        &self,
        company_id: Uuid,
        owner_id: Uuid,
        input: CreateExpenseInput,
    ) -> Result<ExpenseWithRecords, WorkflowError> {
        let manager = self.manager_of(owner_id).await?.filter(|m| *m != owner_id);
        let admins: Vec<Uuid> = self
            .company_admins(company_id)
            .await?
            .into_iter()
            .filter(|a| *a != owner_id)
            .collect();

        let plan = ChainBuilder::build(manager, &admins);
        if plan.is_unassigned() {
            // The expense stays pending until an admin exists; it is
            // never auto-approved.
            tracing::warn!(
                company_id = %company_id,
                owner_id = %owner_id,
                "expense submitted with no resolvable approver"
            );
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            owner_id: Set(owner_id),
            amount: Set(input.amount),
            currency: Set(input.currency),
            original_amount: Set(input.original_amount),
            original_currency: Set(input.original_currency),
            exchange_rate: Set(input.exchange_rate),
            category: Set(input.category),
            description: Set(input.description),
            expense_date: Set(input.expense_date),
            status: Set(DbExpenseStatus::Pending),
            receipt_path: Set(input.receipt_path),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut records = Vec::with_capacity(plan.records.len());
        for planned in &plan.records {
            let record = approval_records::ActiveModel {
                id: Set(Uuid::new_v4()),
                expense_id: Set(expense.id),
                approver_id: Set(planned.approver_id),
                sequence_order: Set(planned.sequence_order),
                decision: Set(ApprovalDecision::Pending),
                comment: Set(None),
                decided_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
            records.push(record);
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(ExpenseWithRecords { expense, records })
    }

    /// Fetches an expense with its approval records, scoped to the
    /// company.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` or a database error.
    pub async fn get_expense(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
    ) -> Result<ExpenseWithRecords, WorkflowError> {
        let expense = expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))?;

        let records = approval_records::Entity::find()
            .filter(approval_records::Column::ExpenseId.eq(expense_id))
            .order_by_asc(approval_records::Column::SequenceOrder)
            .order_by_asc(approval_records::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(ExpenseWithRecords { expense, records })
    }

    /// Lists a user's own expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<ExpenseModel>, WorkflowError> {
        expenses::Entity::find()
            .filter(expenses::Column::OwnerId.eq(owner_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Lists every expense of a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ExpenseModel>, WorkflowError> {
        expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    async fn manager_of(&self, user_id: Uuid) -> Result<Option<Uuid>, WorkflowError> {
        let role_row = user_roles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(role_row.and_then(|r| r.manager_id))
    }

    /// Company admins in employee-number order so chains are
    /// deterministic.
    async fn company_admins(&self, company_id: Uuid) -> Result<Vec<Uuid>, WorkflowError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .find_also_related(user_roles::Entity)
            .order_by_asc(users::Column::EmployeeNumber)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(user, role_row)| {
                role_row
                    .filter(|r| r.role == crate::entities::sea_orm_active_enums::UserRole::Admin)
                    .map(|_| user.id)
            })
            .collect())
    }
}
