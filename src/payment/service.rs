//! Payment service layer - settlement state machine

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::events::EventRecorder;
use crate::models::{
    EventSeverity, ParkingSession, ParkingSpace, Payment, PaymentMethod, PaymentStatus,
    SessionStatus, SpaceStatus, Transaction, TransactionStatus,
};
use crate::payment::{
    generate_receipt_number, ConfirmPaymentResponse, CreatePaymentResponse, GatewayError,
    PaymentDetails, PaymentGateway, RetryPolicy, TransactionHandle,
};
use crate::pricing::{compute_fee, PricingConfig};

/// Payment service orchestrating fee computation, gateway confirmation and
/// space release
#[derive(Clone)]
pub struct PaymentService {
    db_pool: PgPool,
    pricing: PricingConfig,
    gateway: Arc<dyn PaymentGateway>,
    retry_policy: RetryPolicy,
    events: EventRecorder,
}

impl PaymentService {
    /// Create a new payment service instance
    pub fn new(
        db_pool: PgPool,
        pricing: PricingConfig,
        gateway: Arc<dyn PaymentGateway>,
        retry_policy: RetryPolicy,
        events: EventRecorder,
    ) -> Self {
        Self {
            db_pool,
            pricing,
            gateway,
            retry_policy,
            events,
        }
    }

    /// Create a payment for an active session.
    ///
    /// Idempotent with respect to the fee transaction: a second creation
    /// attempt for the same session reuses the existing pending transaction
    /// instead of duplicating it. A completed transaction rejects further
    /// payments. Each call does open a fresh payment attempt against the
    /// reused transaction, even while an earlier attempt is still live;
    /// confirmation is where attempts reconcile, since settling any one of
    /// them completes the shared transaction and terminal-state checks stop
    /// the rest.
    pub async fn create_payment(
        &self,
        session_id: Uuid,
        payment_method: &str,
    ) -> ApiResult<CreatePaymentResponse> {
        let method = PaymentMethod::parse(payment_method)
            .ok_or_else(|| ApiError::UnsupportedPaymentMethod(payment_method.to_string()))?;

        let mut tx = self.db_pool.begin().await?;

        // Exclusive read so two concurrent creations for one session
        // serialize on the row
        let session = sqlx::query_as::<_, ParkingSession>(
            "SELECT * FROM parking_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::SessionNotFound)?;

        if session.status != SessionStatus::Active {
            return Err(ApiError::SessionNotActive(
                session.status.as_str().to_string(),
            ));
        }
        if session.exit_time.is_some() {
            return Err(ApiError::SessionAlreadyExited);
        }

        // "now" is captured once; the same inputs always price the same
        let exit_time = Utc::now();
        let fee = compute_fee(session.entry_time, exit_time, &self.pricing, None)?;

        let existing = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE session_id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let handle = match existing {
            Some(transaction) if transaction.status == TransactionStatus::Completed => {
                return Err(ApiError::PaymentAlreadyCompleted);
            }
            Some(transaction) => TransactionHandle::Reused(transaction),
            None => {
                let transaction = sqlx::query_as::<_, Transaction>(
                    r#"
                    INSERT INTO transactions
                        (session_id, amount, currency, status, payment_method,
                         receipt_number, transaction_date)
                    VALUES ($1, $2, 'USD', 'pending', $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(session_id)
                .bind(fee.amount)
                .bind(method)
                .bind(generate_receipt_number())
                .bind(exit_time)
                .fetch_one(&mut *tx)
                .await?;

                TransactionHandle::Created(transaction)
            }
        };

        let transaction_reused = handle.was_reused();
        let transaction = handle.into_inner();

        let metadata = json!({
            "durationMinutes": fee.duration_minutes,
            "appliedRules": fee.applied_rules,
            "breakdown": fee.breakdown,
            "initiatedAt": exit_time.to_rfc3339(),
        });

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (transaction_id, amount, payment_method, status, payment_date, metadata)
            VALUES ($1, $2, $3, 'initiated', $4, $5)
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(fee.amount)
        .bind(method)
        .bind(exit_time)
        .bind(&metadata)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            session_id = %session_id,
            payment_id = %payment.id,
            transaction_id = %transaction.id,
            amount = fee.amount,
            method = %method.as_str(),
            transaction_reused,
            "Payment created"
        );

        self.events
            .record(
                "payment_created",
                EventSeverity::Low,
                "Payment",
                &format!(
                    "Payment initiated for session {}. Amount: ${:.2}",
                    session_id, fee.amount
                ),
                json!({ "sessionId": session_id, "paymentId": payment.id }),
            )
            .await;

        Ok(CreatePaymentResponse {
            payment,
            transaction,
            transaction_reused,
            amount: fee.amount,
            duration_minutes: fee.duration_minutes,
            applied_rules: fee.applied_rules,
            breakdown: fee.breakdown,
        })
    }

    /// Confirm a payment: charge the gateway with retry, then settle payment,
    /// transaction, session and space in one commit.
    ///
    /// A transient gateway exhaustion leaves the payment non-terminal and
    /// retryable by the caller. The gateway call itself sits outside the
    /// commit boundary (at-least-once; reconcile via gateway reference).
    pub async fn confirm_payment(&self, payment_id: Uuid) -> ApiResult<ConfirmPaymentResponse> {
        let mut tx = self.db_pool.begin().await?;

        // Lock the whole settlement chain: payment, transaction, session,
        // space. A concurrent confirm for the same payment parks here and
        // then observes a terminal status.
        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ApiError::PaymentNotFound)?;

        match payment.status {
            PaymentStatus::Completed => return Err(ApiError::PaymentAlreadyCompleted),
            PaymentStatus::Failed => return Err(ApiError::PaymentFailed),
            PaymentStatus::Initiated | PaymentStatus::Processing => {}
        }

        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE id = $1 FOR UPDATE",
        )
        .bind(payment.transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        if transaction.status == TransactionStatus::Completed {
            return Err(ApiError::PaymentAlreadyCompleted);
        }

        let session = sqlx::query_as::<_, ParkingSession>(
            "SELECT * FROM parking_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(transaction.session_id)
        .fetch_one(&mut *tx)
        .await?;

        let space = sqlx::query_as::<_, ParkingSpace>(
            "SELECT * FROM parking_spaces WHERE id = $1 FOR UPDATE",
        )
        .bind(session.space_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE payments SET status = 'processing', updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;

        // Gateway charge with retry. This is the one step the store cannot
        // roll back.
        let receipt = match self
            .retry_policy
            .charge_with_retry(self.gateway.as_ref(), payment.amount, payment.payment_method)
            .await
        {
            Ok(receipt) => receipt,
            Err(GatewayError::Transient(reason)) => {
                // Roll back so the payment stays non-terminal and retryable
                tx.rollback().await.ok();
                self.events
                    .record(
                        "payment_failed",
                        EventSeverity::Medium,
                        "Payment",
                        &format!("Gateway attempts exhausted for payment {}", payment_id),
                        json!({ "paymentId": payment_id, "reason": reason }),
                    )
                    .await;
                return Err(ApiError::GatewayError {
                    attempts: self.retry_policy.max_attempts,
                    reason,
                });
            }
            Err(GatewayError::Declined(reason)) => {
                // Terminal decline: pending -> failed, committed
                let now = Utc::now();
                sqlx::query("UPDATE payments SET status = 'failed', updated_at = $1 WHERE id = $2")
                    .bind(now)
                    .bind(payment.id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(
                    "UPDATE transactions SET status = 'failed', updated_at = $1 WHERE id = $2",
                )
                .bind(now)
                .bind(transaction.id)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;

                self.events
                    .record(
                        "payment_failed",
                        EventSeverity::Medium,
                        "Payment",
                        &format!("Charge declined for payment {}: {}", payment_id, reason),
                        json!({ "paymentId": payment_id, "reason": reason }),
                    )
                    .await;
                return Err(ApiError::PaymentFailed);
            }
        };

        // Settle everything in one commit
        let exit_time = Utc::now();
        let duration_minutes = (exit_time - session.entry_time).num_minutes() as i32;

        let mut metadata = payment.metadata.clone();
        if let Some(map) = metadata.as_object_mut() {
            map.insert("completedAt".to_string(), json!(exit_time.to_rfc3339()));
            map.insert(
                "gatewayProcessedAt".to_string(),
                json!(receipt.processed_at.to_rfc3339()),
            );
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'completed', payment_gateway_ref = $1, metadata = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&receipt.gateway_ref)
        .bind(&metadata)
        .bind(exit_time)
        .bind(payment.id)
        .fetch_one(&mut *tx)
        .await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET status = 'completed', updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(exit_time)
        .bind(transaction.id)
        .fetch_one(&mut *tx)
        .await?;

        let session = sqlx::query_as::<_, ParkingSession>(
            r#"
            UPDATE parking_sessions
            SET status = 'completed', exit_time = $1, duration_minutes = $2, updated_at = $1
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(exit_time)
        .bind(duration_minutes)
        .bind(session.id)
        .fetch_one(&mut *tx)
        .await?;

        let space = sqlx::query_as::<_, ParkingSpace>(
            r#"
            UPDATE parking_spaces
            SET status = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(SpaceStatus::Available)
        .bind(exit_time)
        .bind(space.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            transaction_id = %transaction.id,
            session_id = %session.id,
            gateway_ref = %receipt.gateway_ref,
            "Payment confirmed"
        );

        self.events
            .record(
                "payment_processed",
                EventSeverity::Low,
                "Payment",
                &format!(
                    "Payment processed for session {}. Amount: ${:.2}",
                    session.id, payment.amount
                ),
                json!({
                    "paymentId": payment.id,
                    "gatewayRef": receipt.gateway_ref,
                }),
            )
            .await;

        Ok(ConfirmPaymentResponse {
            payment,
            transaction,
            session,
            space,
            gateway_ref: receipt.gateway_ref,
        })
    }

    /// Get a payment with its transaction and session
    pub async fn get_payment_details(&self, payment_id: Uuid) -> ApiResult<PaymentDetails> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ApiError::PaymentNotFound)?;

        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(payment.transaction_id)
                .fetch_one(&self.db_pool)
                .await?;

        let session = sqlx::query_as::<_, ParkingSession>(
            "SELECT * FROM parking_sessions WHERE id = $1",
        )
        .bind(transaction.session_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaymentDetails {
            payment,
            transaction,
            session,
        })
    }
}
