//! `SeaORM` Entity for the approval_rules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{HybridLogic, RuleType, UserRole};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub rule_type: RuleType,
    /// Percentage threshold, 1..=100. Set for percentage rules.
    pub required_percentage: Option<i32>,
    /// Designated role. Set for specific_approver rules.
    pub specific_approver_role: Option<UserRole>,
    /// Operator combining the two hybrid conditions. Set for hybrid rules.
    pub hybrid_logic: Option<HybridLogic>,
    pub hybrid_percentage: Option<i32>,
    pub hybrid_approver_role: Option<UserRole>,
    pub is_active: bool,
    /// Evaluation order; rules without one evaluate last.
    pub sequence_order: Option<i16>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
