//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to currency's decimal places
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// Decimal places stored for monetary amounts.
pub const AMOUNT_DECIMALS: u32 = 2;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Decimal {
    let converted = amount * rate;
    converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// The result of converting a submitted amount into the company currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Amount as submitted.
    pub original_amount: Decimal,
    /// Currency as submitted (ISO 4217).
    pub original_currency: String,
    /// Amount in the company currency.
    pub amount: Decimal,
    /// The company currency (ISO 4217).
    pub currency: String,
    /// The rate applied (1 when no conversion happened).
    pub exchange_rate: Decimal,
}

impl Conversion {
    /// Applies a point-in-time exchange rate.
    #[must_use]
    pub fn apply(amount: Decimal, from: &str, to: &str, rate: Decimal) -> Self {
        Self {
            original_amount: amount,
            original_currency: from.to_string(),
            amount: convert_amount(amount, rate, AMOUNT_DECIMALS),
            currency: to.to_string(),
            exchange_rate: rate,
        }
    }

    /// Fallback when the rate lookup failed or no conversion is needed:
    /// the original amount is used as-is.
    #[must_use]
    pub fn identity(amount: Decimal, currency: &str) -> Self {
        Self {
            original_amount: amount,
            original_currency: currency.to_string(),
            amount,
            currency: currency.to_string(),
            exchange_rate: Decimal::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_amount() {
        // 100 USD * 15000 = 1,500,000 IDR
        let amount = dec!(100);
        let rate = dec!(15000);
        let result = convert_amount(amount, rate, 0);
        assert_eq!(result, dec!(1500000));
    }

    #[test]
    fn test_bankers_rounding() {
        // 2.5 rounds to 2, 3.5 rounds to 4 (round half to even)
        assert_eq!(convert_amount(dec!(1), dec!(2.5), 0), dec!(2));
        assert_eq!(convert_amount(dec!(1), dec!(3.5), 0), dec!(4));
    }

    #[test]
    fn test_apply_keeps_original() {
        let conversion = Conversion::apply(dec!(100), "EUR", "USD", dec!(1.0850));
        assert_eq!(conversion.original_amount, dec!(100));
        assert_eq!(conversion.original_currency, "EUR");
        assert_eq!(conversion.amount, dec!(108.50));
        assert_eq!(conversion.currency, "USD");
        assert_eq!(conversion.exchange_rate, dec!(1.0850));
    }

    #[test]
    fn test_identity_fallback() {
        let conversion = Conversion::identity(dec!(42.10), "USD");
        assert_eq!(conversion.amount, conversion.original_amount);
        assert_eq!(conversion.currency, conversion.original_currency);
        assert_eq!(conversion.exchange_rate, Decimal::ONE);
    }
}
