//! Exchange-rate lookup client.
//!
//! Queries a `GET {base_url}/{currency}` endpoint returning the rates
//! table for that base currency, and converts the submitted amount into
//! the company currency. On any failure the caller falls back to the
//! identity conversion.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use expensa_core::currency::Conversion;

/// Rates table as returned by the exchange-rate service.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Decimal>,
}

/// Client for the exchange-rate service.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    /// Creates a client with the given base URL and request timeout.
    #[must_use]
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    /// Converts `amount` from `from` into `to`.
    ///
    /// Same-currency submissions skip the lookup. On lookup failure the
    /// conversion degrades to identity and the expense keeps the
    /// submitted amount; the failure is logged, not surfaced.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Conversion {
        if from.eq_ignore_ascii_case(to) {
            return Conversion::identity(amount, to);
        }

        match self.fetch_rate(from, to).await {
            Ok(rate) => Conversion::apply(amount, from, to, rate),
            Err(e) => {
                tracing::warn!(
                    from = %from,
                    to = %to,
                    error = %e,
                    "exchange rate lookup failed, storing amount unconverted"
                );
                Conversion::identity(amount, from)
            }
        }
    }

    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, String> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), from);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body: RatesResponse = response.json().await.map_err(|e| e.to_string())?;
        body.rates
            .get(&to.to_uppercase())
            .copied()
            .ok_or_else(|| format!("no rate for {to}"))
    }
}
