//! Approval chain construction at expense submission time.
//!
//! The chain is resolved once, when the expense is created: the owner's
//! assigned manager (if any) approves first, then every company admin as
//! an unordered cohort. The repository persists the plan atomically with
//! the expense insert.

use uuid::Uuid;

/// Sequence position of the manager's record.
pub const MANAGER_STEP: i16 = 1;

/// Sequence position of the admin cohort.
///
/// Admins always sit at step 2, even when the owner has no manager;
/// one fixed convention keeps gating checks uniform across expenses.
pub const ADMIN_STEP: i16 = 2;

/// A single approval record to be created for an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedApproval {
    /// The required approver.
    pub approver_id: Uuid,
    /// Position in the approval sequence.
    pub sequence_order: i16,
}

/// The complete set of approval records required to resolve one expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPlan {
    /// Planned records, ordered by sequence position.
    pub records: Vec<PlannedApproval>,
}

impl ChainPlan {
    /// Returns true if no approver could be resolved.
    ///
    /// Such an expense stays pending and is flagged as a company
    /// misconfiguration; it is never auto-approved.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stateless builder resolving the required approver set.
pub struct ChainBuilder;

impl ChainBuilder {
    /// Builds the approval chain for an expense.
    ///
    /// The owner's manager (if assigned) gets sequence 1; every company
    /// admin gets sequence 2. A manager who is also an admin gets a
    /// single record at sequence 1. Duplicate admin ids are collapsed.
    #[must_use]
    pub fn build(manager: Option<Uuid>, admins: &[Uuid]) -> ChainPlan {
        let mut records = Vec::with_capacity(admins.len() + 1);

        if let Some(manager_id) = manager {
            records.push(PlannedApproval {
                approver_id: manager_id,
                sequence_order: MANAGER_STEP,
            });
        }

        for &admin_id in admins {
            let already_planned = records.iter().any(|r| r.approver_id == admin_id);
            if !already_planned {
                records.push(PlannedApproval {
                    approver_id: admin_id,
                    sequence_order: ADMIN_STEP,
                });
            }
        }

        ChainPlan { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_then_admins() {
        let manager = Uuid::new_v4();
        let admin_a = Uuid::new_v4();
        let admin_b = Uuid::new_v4();

        let plan = ChainBuilder::build(Some(manager), &[admin_a, admin_b]);

        assert_eq!(plan.records.len(), 3);
        assert_eq!(
            plan.records[0],
            PlannedApproval {
                approver_id: manager,
                sequence_order: MANAGER_STEP
            }
        );
        assert!(
            plan.records[1..]
                .iter()
                .all(|r| r.sequence_order == ADMIN_STEP)
        );
    }

    #[test]
    fn test_no_manager_admins_keep_step_two() {
        let admin = Uuid::new_v4();
        let plan = ChainBuilder::build(None, &[admin]);

        assert_eq!(plan.records.len(), 1);
        assert_eq!(plan.records[0].sequence_order, ADMIN_STEP);
        assert!(!plan.is_unassigned());
    }

    #[test]
    fn test_manager_who_is_admin_gets_single_record() {
        let manager = Uuid::new_v4();
        let other_admin = Uuid::new_v4();

        let plan = ChainBuilder::build(Some(manager), &[manager, other_admin]);

        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.records[0].approver_id, manager);
        assert_eq!(plan.records[0].sequence_order, MANAGER_STEP);
        assert_eq!(plan.records[1].approver_id, other_admin);
    }

    #[test]
    fn test_duplicate_admins_collapsed() {
        let admin = Uuid::new_v4();
        let plan = ChainBuilder::build(None, &[admin, admin]);
        assert_eq!(plan.records.len(), 1);
    }

    #[test]
    fn test_empty_chain_is_unassigned() {
        let plan = ChainBuilder::build(None, &[]);
        assert!(plan.is_unassigned());
    }
}
