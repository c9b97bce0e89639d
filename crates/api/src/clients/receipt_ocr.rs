//! Receipt OCR client.
//!
//! Forwards a receipt image to the OCR service and maps its response
//! into a best-effort `ReceiptScan`. Every field is optional; a failed
//! scan returns an empty result, never an error.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use expensa_core::receipt::ReceiptScan;

#[derive(Debug, Deserialize)]
struct OcrResponse {
    amount: Option<Decimal>,
    date: Option<NaiveDate>,
    currency: Option<String>,
}

/// Client for the receipt OCR service.
#[derive(Debug, Clone)]
pub struct ReceiptOcrClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReceiptOcrClient {
    /// Creates a client with the given base URL and request timeout.
    #[must_use]
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    /// Scans a receipt image, returning whatever fields the service
    /// recognized.
    pub async fn scan(&self, image: Vec<u8>) -> ReceiptScan {
        let url = format!("{}/scan", self.base_url.trim_end_matches('/'));
        let result = async {
            let response = self
                .http
                .post(&url)
                .body(image)
                .send()
                .await
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?;
            response
                .json::<OcrResponse>()
                .await
                .map_err(|e| e.to_string())
        }
        .await;

        match result {
            Ok(body) => ReceiptScan {
                amount: body.amount,
                date: body.date,
                currency: body.currency,
            },
            Err(e) => {
                tracing::warn!(error = %e, "receipt scan failed, returning empty result");
                ReceiptScan::default()
            }
        }
    }
}
