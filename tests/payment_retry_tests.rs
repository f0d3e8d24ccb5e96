//! Gateway retry policy tests
//!
//! These tests drive [`RetryPolicy::charge_with_retry`] against scripted
//! gateway doubles to pin down the retry contract: transient failures are
//! retried up to the attempt limit, declines are terminal on the first
//! response, and success stops the loop immediately.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use parkwise_server::models::PaymentMethod;
use parkwise_server::payment::{GatewayError, GatewayReceipt, PaymentGateway, RetryPolicy};

/// Gateway double that fails transiently a fixed number of times before
/// succeeding, counting every charge call.
struct FlakyGateway {
    failures_before_success: u32,
    calls: AtomicU32,
}

impl FlakyGateway {
    fn new(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FlakyGateway {
    async fn charge(
        &self,
        _amount: f64,
        _method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if call <= self.failures_before_success {
            return Err(GatewayError::Transient("simulated timeout".to_string()));
        }

        Ok(GatewayReceipt {
            gateway_ref: format!("PG-TEST-{}", call),
            processed_at: Utc::now(),
        })
    }
}

/// Gateway double that declines every charge, counting calls.
struct DecliningGateway {
    calls: AtomicU32,
}

impl DecliningGateway {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn charge(
        &self,
        _amount: f64,
        _method: PaymentMethod,
    ) -> Result<GatewayReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::Declined("insufficient funds".to_string()))
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1))
}

#[tokio::test]
async fn test_succeeds_first_try_without_retry() {
    let gateway = FlakyGateway::new(0);
    let policy = fast_policy(3);

    let receipt = policy
        .charge_with_retry(&gateway, 15.0, PaymentMethod::CreditCard)
        .await
        .expect("healthy gateway should succeed");

    assert_eq!(gateway.call_count(), 1);
    assert!(receipt.gateway_ref.starts_with("PG-TEST-"));
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    // Two timeouts, third attempt succeeds - within the 3-attempt budget.
    let gateway = FlakyGateway::new(2);
    let policy = fast_policy(3);

    let receipt = policy
        .charge_with_retry(&gateway, 15.0, PaymentMethod::DebitCard)
        .await
        .expect("third attempt should succeed");

    assert_eq!(gateway.call_count(), 3);
    assert_eq!(receipt.gateway_ref, "PG-TEST-3");
}

#[tokio::test]
async fn test_transient_exhaustion_returns_transient() {
    // More failures than attempts: the caller sees the last transient error
    // and must be able to retry the whole confirmation later.
    let gateway = FlakyGateway::new(10);
    let policy = fast_policy(3);

    let err = policy
        .charge_with_retry(&gateway, 15.0, PaymentMethod::Cash)
        .await
        .expect_err("exhausted retries should fail");

    assert_eq!(gateway.call_count(), 3);
    assert!(matches!(err, GatewayError::Transient(_)));
}

#[tokio::test]
async fn test_decline_is_never_retried() {
    let gateway = DecliningGateway::new();
    let policy = fast_policy(5);

    let err = policy
        .charge_with_retry(&gateway, 15.0, PaymentMethod::MobileWallet)
        .await
        .expect_err("declined charge should fail");

    assert_eq!(gateway.call_count(), 1, "declines are terminal");
    assert!(matches!(err, GatewayError::Declined(_)));
}

#[tokio::test]
async fn test_single_attempt_policy_does_not_retry() {
    let gateway = FlakyGateway::new(1);
    let policy = fast_policy(1);

    let err = policy
        .charge_with_retry(&gateway, 15.0, PaymentMethod::Upi)
        .await
        .expect_err("single attempt against one failure should fail");

    assert_eq!(gateway.call_count(), 1);
    assert!(matches!(err, GatewayError::Transient(_)));
}
