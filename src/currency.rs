//! Currency conversion against an external rate service
//!
//! The converter keeps the principal amount in `Decimal` the whole way; only
//! the looked-up rate itself is a float. Same-currency conversions short
//! circuit without touching the network, and unsupported codes are rejected
//! before any lookup is attempted.

use crate::error::{WorkerError, WorkerResult};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// External rate lookup. Codes are already in the service's own convention.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rate(&self, from: &str, to: &str) -> WorkerResult<f64>;
}

/// Rate source backed by a `GET {endpoint}/{from}/{to}.json` service whose
/// response body is `{ "<to>": <rate> }`
pub struct HttpRateSource {
    endpoint: String,
    client: Client,
}

impl HttpRateSource {
    pub fn new(endpoint: String, timeout: Duration) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::rate_lookup_failed(e.to_string()))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rate(&self, from: &str, to: &str) -> WorkerResult<f64> {
        let url = format!(
            "{}/{from}/{to}.json",
            self.endpoint.trim_end_matches('/')
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::rate_lookup_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::rate_lookup_failed(format!(
                "rate service returned {status}"
            )));
        }

        let body: HashMap<String, Value> = response
            .json()
            .await
            .map_err(|e| WorkerError::rate_lookup_failed(format!("invalid response body: {e}")))?;

        body.get(to)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                WorkerError::rate_lookup_failed(format!("rate key '{to}' absent from response"))
            })
    }
}

/// Converts monetary amounts between the configured currencies
pub struct CurrencyConverter<R> {
    /// ISO code -> rate service code; doubles as the supported-currency set
    codes: HashMap<String, String>,
    source: R,
}

impl<R: RateSource> CurrencyConverter<R> {
    pub fn new(codes: HashMap<String, String>, source: R) -> Self {
        Self { codes, source }
    }

    /// Convert `amount` from one currency to another.
    ///
    /// Identity when `from == to`, with zero external calls. Both codes are
    /// validated against the configured table before any network traffic.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> WorkerResult<Decimal> {
        let service_from = self.service_code(from)?;
        let service_to = self.service_code(to)?;

        if from == to {
            return Ok(amount);
        }

        let rate = self.source.fetch_rate(service_from, service_to).await?;
        let rate = Decimal::from_f64(rate).ok_or_else(|| {
            WorkerError::rate_lookup_failed(format!("rate {rate} is not a finite number"))
        })?;

        Ok(amount * rate)
    }

    fn service_code(&self, code: &str) -> WorkerResult<&str> {
        self.codes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| WorkerError::unsupported_currency(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRateSource {
        rate: f64,
        calls: AtomicUsize,
    }

    impl CountingRateSource {
        fn new(rate: f64) -> Self {
            Self {
                rate,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateSource for CountingRateSource {
        async fn fetch_rate(&self, _from: &str, _to: &str) -> WorkerResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rate)
        }
    }

    fn converter(rate: f64) -> CurrencyConverter<CountingRateSource> {
        CurrencyConverter::new(
            crate::config::CurrencySection::default().codes,
            CountingRateSource::new(rate),
        )
    }

    #[tokio::test]
    async fn test_same_currency_is_identity_with_zero_lookups() {
        let converter = converter(0.92);
        let amount = Decimal::from(6000);

        let result = converter.convert(amount, "EUR", "EUR").await.unwrap();

        assert_eq!(result, amount);
        assert_eq!(converter.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cross_currency_multiplies_by_rate() {
        let converter = converter(0.92);

        let result = converter
            .convert(Decimal::from(3000), "USD", "EUR")
            .await
            .unwrap();

        assert_eq!(result.to_string(), "2760.00");
        assert_eq!(converter.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_source_currency_fails_before_lookup() {
        let converter = converter(0.92);

        let result = converter.convert(Decimal::from(100), "JPY", "EUR").await;

        assert!(matches!(
            result,
            Err(WorkerError::UnsupportedCurrency { code }) if code == "JPY"
        ));
        assert_eq!(converter.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_target_currency_fails_before_lookup() {
        let converter = converter(0.92);

        let result = converter.convert(Decimal::from(100), "USD", "CHF").await;

        assert!(matches!(
            result,
            Err(WorkerError::UnsupportedCurrency { code }) if code == "CHF"
        ));
        assert_eq!(converter.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_code_rejected_even_for_identity_conversion() {
        let converter = converter(1.0);

        let result = converter.convert(Decimal::from(100), "JPY", "JPY").await;

        assert!(matches!(
            result,
            Err(WorkerError::UnsupportedCurrency { .. })
        ));
    }

    #[tokio::test]
    async fn test_principal_precision_is_preserved() {
        let converter = converter(2.0);
        let amount: Decimal = "1234.5678".parse().unwrap();

        let result = converter.convert(amount, "GBP", "EUR").await.unwrap();

        assert_eq!(result, "2469.1356".parse::<Decimal>().unwrap());
    }
}
