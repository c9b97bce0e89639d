//! Repository layer.
//!
//! Repositories fetch state, delegate the business decision to
//! `expensa-core`, and persist the outcome. Multi-row writes run
//! inside a database transaction.

pub mod approval;
pub mod approval_rule;
pub mod expense;
pub mod user;

pub use approval::ApprovalRepository;
pub use approval_rule::ApprovalRuleRepository;
pub use expense::ExpenseRepository;
pub use user::UserRepository;
