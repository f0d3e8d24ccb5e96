//! Payment gateway collaborator and retry policy
//!
//! The gateway is stateless from the core's point of view: a charge either
//! yields a gateway reference, fails transiently (worth retrying), or is
//! declined terminally. Production would wire a real processor behind the
//! trait; [`SimulatedGateway`] stands in for it here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::models::PaymentMethod;

/// Gateway charge errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transient failure - safe to retry
    #[error("Payment gateway timeout: {0}")]
    Transient(String),

    /// Terminal decline - retrying will not help
    #[error("Charge declined: {0}")]
    Declined(String),
}

/// Successful charge acknowledgment
#[derive(Debug, Clone)]
pub struct GatewayReceipt {
    pub gateway_ref: String,
    pub processed_at: DateTime<Utc>,
}

/// External payment gateway collaborator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: f64, method: PaymentMethod)
        -> Result<GatewayReceipt, GatewayError>;
}

/// Fixed-attempt retry policy with backoff scaled by attempt number
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before the attempt following `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Charge through the gateway, retrying transient failures up to
    /// `max_attempts`. Declines are never retried.
    pub async fn charge_with_retry(
        &self,
        gateway: &dyn PaymentGateway,
        amount: f64,
        method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError> {
        let mut attempt = 1;
        loop {
            match gateway.charge(amount, method).await {
                Ok(receipt) => return Ok(receipt),
                Err(GatewayError::Declined(reason)) => {
                    return Err(GatewayError::Declined(reason));
                }
                Err(GatewayError::Transient(reason)) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %reason,
                        "Payment gateway attempt failed"
                    );

                    if attempt >= self.max_attempts {
                        return Err(GatewayError::Transient(reason));
                    }

                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Simulated payment gateway with a configurable transient failure rate
pub struct SimulatedGateway {
    failure_rate: f64,
    processing_delay: Duration,
}

impl SimulatedGateway {
    pub fn new(failure_rate: f64, processing_delay: Duration) -> Self {
        Self {
            failure_rate,
            processing_delay,
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(
        &self,
        amount: f64,
        method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError> {
        tokio::time::sleep(self.processing_delay).await;

        let (should_fail, suffix) = {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            let should_fail = rng.gen::<f64>() < self.failure_rate;
            let suffix: String = (0..6)
                .map(|_| {
                    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
                    chars[rng.gen_range(0..chars.len())] as char
                })
                .collect();
            (should_fail, suffix)
        };

        if should_fail {
            return Err(GatewayError::Transient(
                "Payment gateway timeout".to_string(),
            ));
        }

        let receipt = GatewayReceipt {
            gateway_ref: format!("PG-{}-{}", Utc::now().timestamp_millis(), suffix),
            processed_at: Utc::now(),
        };

        tracing::debug!(
            amount,
            method = %method.as_str(),
            gateway_ref = %receipt.gateway_ref,
            "Simulated gateway charge succeeded"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_scales_with_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_simulated_gateway_never_fails_at_zero_rate() {
        let gateway = SimulatedGateway::new(0.0, Duration::from_millis(0));

        for _ in 0..10 {
            let receipt = gateway
                .charge(5.0, PaymentMethod::CreditCard)
                .await
                .expect("zero failure rate must succeed");
            assert!(receipt.gateway_ref.starts_with("PG-"));
        }
    }

    #[tokio::test]
    async fn test_simulated_gateway_always_fails_at_full_rate() {
        let gateway = SimulatedGateway::new(1.0, Duration::from_millis(0));

        let err = gateway
            .charge(5.0, PaymentMethod::Cash)
            .await
            .expect_err("full failure rate must fail");
        assert!(matches!(err, GatewayError::Transient(_)));
    }
}
