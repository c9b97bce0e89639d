//! Multi-currency handling at expense submission time.
//!
//! Expenses are stored in the company's default currency; the original
//! amount and currency are kept alongside the rate used. A failed rate
//! lookup degrades to the original amount rather than aborting the
//! submission.

pub mod conversion;

pub use conversion::{Conversion, convert_amount};
