//! Approval rule repository: CRUD plus conversion into the engine's
//! rule model.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use expensa_core::workflow::{sort_by_sequence, ApprovalRule, HybridLogic, RuleKind, WorkflowError};

use crate::entities::{
    approval_rules::{self, Model as RuleModel},
    sea_orm_active_enums,
};

use super::user::{core_role_to_db, db_role_to_core};

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    /// Human-readable rule name.
    pub name: String,
    /// Type-specific parameters.
    pub kind: RuleKind,
    /// Position in an ordered multi-rule chain.
    pub sequence_order: Option<i16>,
}

/// Input for updating an approval rule. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRuleInput {
    /// New rule name.
    pub name: Option<String>,
    /// New type-specific parameters, replacing the old ones entirely.
    pub kind: Option<RuleKind>,
    /// New sequence position (`Some(None)` clears it).
    pub sequence_order: Option<Option<i16>>,
    /// Activate or deactivate the rule.
    pub is_active: Option<bool>,
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval rule for a company.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPercentage` when a percentage parameter is out
    /// of range, or a database error.
    pub async fn create_rule(
        &self,
        company_id: Uuid,
        input: CreateRuleInput,
    ) -> Result<RuleModel, WorkflowError> {
        let rule_id = Uuid::new_v4();
        let candidate = ApprovalRule {
            id: rule_id,
            name: input.name.clone(),
            kind: input.kind,
            sequence_order: input.sequence_order,
        };
        candidate.validate()?;

        let now = Utc::now().into();
        let mut active = approval_rules::ActiveModel {
            id: Set(rule_id),
            company_id: Set(company_id),
            name: Set(input.name),
            rule_type: Set(kind_to_db_type(&input.kind)),
            required_percentage: Set(None),
            specific_approver_role: Set(None),
            hybrid_logic: Set(None),
            hybrid_percentage: Set(None),
            hybrid_approver_role: Set(None),
            is_active: Set(true),
            sequence_order: Set(input.sequence_order),
            created_at: Set(now),
            updated_at: Set(now),
        };
        apply_kind(&mut active, &input.kind);

        active
            .insert(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Lists all rules of a company, active and inactive, ordered by
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_rules(&self, company_id: Uuid) -> Result<Vec<RuleModel>, WorkflowError> {
        approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .order_by_asc(approval_rules::Column::SequenceOrder)
            .order_by_asc(approval_rules::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Gets a rule by id, scoped to the company.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` or a database error.
    pub async fn get_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<RuleModel, WorkflowError> {
        approval_rules::Entity::find_by_id(rule_id)
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::RuleNotFound(rule_id))
    }

    /// Updates a rule. Changing the kind replaces all type-specific
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound`, `InvalidPercentage`, or a database
    /// error.
    pub async fn update_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        input: UpdateRuleInput,
    ) -> Result<RuleModel, WorkflowError> {
        let existing = self.get_rule(company_id, rule_id).await?;

        if let Some(kind) = &input.kind {
            let candidate = ApprovalRule {
                id: rule_id,
                name: input.name.clone().unwrap_or_else(|| existing.name.clone()),
                kind: *kind,
                sequence_order: input.sequence_order.unwrap_or(existing.sequence_order),
            };
            candidate.validate()?;
        }

        let mut active: approval_rules::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(kind) = &input.kind {
            active.rule_type = Set(kind_to_db_type(kind));
            active.required_percentage = Set(None);
            active.specific_approver_role = Set(None);
            active.hybrid_logic = Set(None);
            active.hybrid_percentage = Set(None);
            active.hybrid_approver_role = Set(None);
            apply_kind(&mut active, kind);
        }
        if let Some(sequence_order) = input.sequence_order {
            active.sequence_order = Set(sequence_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Soft deletes a rule by setting `is_active` to false.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` or a database error.
    pub async fn delete_rule(&self, company_id: Uuid, rule_id: Uuid) -> Result<(), WorkflowError> {
        let existing = self.get_rule(company_id, rule_id).await?;

        let mut active: approval_rules::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(())
    }

    /// Loads the active rules of a company as engine rules, in
    /// evaluation order. Rows whose stored parameters no longer match
    /// their type are skipped with a warning rather than failing the
    /// whole evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active_rules(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ApprovalRule>, WorkflowError> {
        let rows = approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .filter(approval_rules::Column::IsActive.eq(true))
            .all(&self.db)
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
}

/// Converts a stored rule row into the engine's rule model.
pub(crate) fn model_to_rule(row: &RuleModel) -> Result<ApprovalRule, WorkflowError> {
    let kind = match row.rule_type {
        sea_orm_active_enums::RuleType::Percentage => RuleKind::Percentage {
            required_percentage: row.required_percentage.ok_or_else(|| {
                WorkflowError::InvalidRuleParameters {
                    rule_id: row.id,
                    detail: "percentage rule without required_percentage".into(),
                }
            })?,
        },
        sea_orm_active_enums::RuleType::SpecificApprover => RuleKind::SpecificApprover {
            role: row
                .specific_approver_role
                .as_ref()
                .map(db_role_to_core)
                .ok_or_else(|| WorkflowError::InvalidRuleParameters {
                    rule_id: row.id,
                    detail: "specific_approver rule without a role".into(),
                })?,
        },
        sea_orm_active_enums::RuleType::Hybrid => {
            let percentage =
                row.hybrid_percentage
                    .ok_or_else(|| WorkflowError::InvalidRuleParameters {
                        rule_id: row.id,
                        detail: "hybrid rule without a percentage".into(),
                    })?;
            let role = row
                .hybrid_approver_role
                .as_ref()
                .map(db_role_to_core)
                .ok_or_else(|| WorkflowError::InvalidRuleParameters {
                    rule_id: row.id,
                    detail: "hybrid rule without a role".into(),
                })?;
            let logic = match row.hybrid_logic.as_ref().ok_or_else(|| {
                WorkflowError::InvalidRuleParameters {
                    rule_id: row.id,
                    detail: "hybrid rule without a logic operator".into(),
                }
            })? {
                sea_orm_active_enums::HybridLogic::And => HybridLogic::And,
                sea_orm_active_enums::HybridLogic::Or => HybridLogic::Or,
            };
            RuleKind::Hybrid {
                percentage,
                role,
                logic,
            }
        }
    };

    let rule = ApprovalRule {
        id: row.id,
        name: row.name.clone(),
        kind,
        sequence_order: row.sequence_order,
    };
    rule.validate()?;
    Ok(rule)
}

fn kind_to_db_type(kind: &RuleKind) -> sea_orm_active_enums::RuleType {
    match kind {
        RuleKind::Percentage { .. } => sea_orm_active_enums::RuleType::Percentage,
        RuleKind::SpecificApprover { .. } => sea_orm_active_enums::RuleType::SpecificApprover,
        RuleKind::Hybrid { .. } => sea_orm_active_enums::RuleType::Hybrid,
    }
}

fn apply_kind(active: &mut approval_rules::ActiveModel, kind: &RuleKind) {
    match kind {
        RuleKind::Percentage {
            required_percentage,
        } => {
            active.required_percentage = Set(Some(*required_percentage));
        }
        RuleKind::SpecificApprover { role } => {
            active.specific_approver_role = Set(Some(core_role_to_db(*role)));
        }
        RuleKind::Hybrid {
            percentage,
            role,
            logic,
        } => {
            active.hybrid_percentage = Set(Some(*percentage));
            active.hybrid_approver_role = Set(Some(core_role_to_db(*role)));
            active.hybrid_logic = Set(Some(match logic {
                HybridLogic::And => sea_orm_active_enums::HybridLogic::And,
                HybridLogic::Or => sea_orm_active_enums::HybridLogic::Or,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expensa_core::workflow::UserRole;

    fn base_row(rule_type: sea_orm_active_enums::RuleType) -> RuleModel {
        RuleModel {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: "rule".into(),
            rule_type,
            required_percentage: None,
            specific_approver_role: None,
            hybrid_logic: None,
            hybrid_percentage: None,
            hybrid_approver_role: None,
            is_active: true,
            sequence_order: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_model_to_rule_percentage() {
        let mut row = base_row(sea_orm_active_enums::RuleType::Percentage);
        row.required_percentage = Some(60);

        let rule = model_to_rule(&row).unwrap();
        assert!(matches!(
            rule.kind,
            RuleKind::Percentage {
                required_percentage: 60
            }
        ));
    }

    #[test]
    fn test_model_to_rule_percentage_missing_parameter() {
        let row = base_row(sea_orm_active_enums::RuleType::Percentage);
        let err = model_to_rule(&row).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRuleParameters { .. }));
    }

    #[test]
    fn test_model_to_rule_specific_approver() {
        let mut row = base_row(sea_orm_active_enums::RuleType::SpecificApprover);
        row.specific_approver_role = Some(sea_orm_active_enums::UserRole::Admin);

        let rule = model_to_rule(&row).unwrap();
        assert!(matches!(
            rule.kind,
            RuleKind::SpecificApprover {
                role: UserRole::Admin
            }
        ));
    }

    #[test]
    fn test_model_to_rule_hybrid() {
        let mut row = base_row(sea_orm_active_enums::RuleType::Hybrid);
        row.hybrid_percentage = Some(50);
        row.hybrid_approver_role = Some(sea_orm_active_enums::UserRole::Manager);
        row.hybrid_logic = Some(sea_orm_active_enums::HybridLogic::Or);

        let rule = model_to_rule(&row).unwrap();
        assert!(matches!(
            rule.kind,
            RuleKind::Hybrid {
                percentage: 50,
                role: UserRole::Manager,
                logic: HybridLogic::Or
            }
        ));
    }

    #[test]
    fn test_model_to_rule_hybrid_missing_logic() {
        let mut row = base_row(sea_orm_active_enums::RuleType::Hybrid);
        row.hybrid_percentage = Some(50);
        row.hybrid_approver_role = Some(sea_orm_active_enums::UserRole::Manager);

        let err = model_to_rule(&row).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRuleParameters { .. }));
    }

    #[test]
    fn test_model_to_rule_rejects_out_of_range_percentage() {
        let mut row = base_row(sea_orm_active_enums::RuleType::Percentage);
        row.required_percentage = Some(150);

        let err = model_to_rule(&row).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidPercentage { value: 150 }
        ));
    }
}
