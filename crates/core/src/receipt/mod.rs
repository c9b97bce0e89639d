//! Receipt scan (OCR) result types.
//!
//! Scanning is best effort: any field the OCR service could not extract
//! stays `None`, and the caller pre-fills the submission form with
//! whatever came back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Best-effort fields extracted from a receipt image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptScan {
    /// Detected total amount.
    pub amount: Option<Decimal>,
    /// Detected expense date.
    pub date: Option<NaiveDate>,
    /// Detected currency code (ISO 4217).
    pub currency: Option<String>,
}

impl ReceiptScan {
    /// Returns true when nothing could be extracted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount.is_none() && self.date.is_none() && self.currency.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_scan_is_empty() {
        assert!(ReceiptScan::default().is_empty());
    }

    #[test]
    fn test_partial_scan_not_empty() {
        let scan = ReceiptScan {
            amount: Some(dec!(19.99)),
            ..ReceiptScan::default()
        };
        assert!(!scan.is_empty());
    }
}
