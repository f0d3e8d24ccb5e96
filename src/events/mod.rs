//! Append-only system event sink
//!
//! Every component records audit events here. The sink is fire-and-forget:
//! recording failures are logged and never propagated, and no control-flow
//! decision ever reads events back.

use sqlx::PgPool;

use crate::models::EventSeverity;

/// Audit event recorder backed by the `system_events` table
#[derive(Clone)]
pub struct EventRecorder {
    db_pool: PgPool,
}

impl EventRecorder {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Record a system event. Never fails the caller.
    pub async fn record(
        &self,
        event_type: &str,
        severity: EventSeverity,
        component: &str,
        message: &str,
        details: serde_json::Value,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO system_events (event_type, severity, component, message, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event_type)
        .bind(severity)
        .bind(component)
        .bind(message)
        .bind(&details)
        .execute(&self.db_pool)
        .await;

        if let Err(e) = result {
            tracing::error!(
                event_type = %event_type,
                component = %component,
                error = %e,
                "Failed to record system event"
            );
        }
    }
}
