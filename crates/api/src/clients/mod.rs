//! Outbound HTTP clients.
//!
//! Both clients fail soft: a lookup failure degrades the feature
//! (identity conversion, empty scan) instead of failing the request.

pub mod exchange_rate;
pub mod receipt_ocr;

pub use exchange_rate::ExchangeRateClient;
pub use receipt_ocr::ReceiptOcrClient;
