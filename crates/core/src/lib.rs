//! Core business logic for Expensa.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `workflow` - Expense approval workflow engine
//! - `currency` - Currency conversion at submission time
//! - `receipt` - Receipt scan (OCR) result types

pub mod currency;
pub mod receipt;
pub mod workflow;
