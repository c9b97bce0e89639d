//! Expense approval workflow engine.
//!
//! This module implements the multi-step approval workflow: which
//! approvers an expense needs, in what order they may act, how an
//! individual decision is validated, and how the expense's terminal
//! status is derived from the recorded decisions.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ExpenseStatus, Decision, UserRole)
//! - `error` - Workflow-specific error types
//! - `rules` - Approval rule domain types and validation
//! - `chain` - Approval chain construction at submission time
//! - `decision` - Per-record decision preconditions and effects
//! - `resolution` - Expense status derivation after each decision

pub mod chain;
pub mod decision;
pub mod error;
pub mod resolution;
pub mod rules;
pub mod types;

#[cfg(test)]
mod resolution_props;

pub use chain::{ChainBuilder, ChainPlan, PlannedApproval};
pub use decision::{DecisionAction, DecisionService, RecordState};
pub use error::WorkflowError;
pub use resolution::{ResolutionEvaluator, ResolutionOutcome};
pub use rules::{sort_by_sequence, ApprovalRule, HybridLogic, RuleKind};
pub use types::{Decision, ExpenseStatus, UserRole, Verdict};
