//! Simulated barrier hardware collaborator
//!
//! The core only consumes the acknowledgment; the session id is carried for
//! audit correlation and nothing else is shared.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::events::EventRecorder;
use crate::models::EventSeverity;

/// Barrier operation acknowledgment
#[derive(Debug, Serialize)]
pub struct BarrierAck {
    pub success: bool,
    pub message: String,
    pub session_id: Uuid,
    pub open_time: DateTime<Utc>,
}

/// Barrier close acknowledgment
#[derive(Debug, Serialize)]
pub struct BarrierCloseAck {
    pub success: bool,
    pub message: String,
    pub close_time: DateTime<Utc>,
}

/// Simulated barrier control service
#[derive(Clone)]
pub struct BarrierService {
    open_delay: Duration,
    events: EventRecorder,
}

impl BarrierService {
    pub fn new(open_delay: Duration, events: EventRecorder) -> Self {
        Self { open_delay, events }
    }

    /// Open the entry barrier for a session
    pub async fn open_entry(&self, session_id: Uuid) -> BarrierAck {
        self.open("entry", session_id).await
    }

    /// Open the exit barrier for a session
    pub async fn open_exit(&self, session_id: Uuid) -> BarrierAck {
        self.open("exit", session_id).await
    }

    /// Close the entry barrier
    pub async fn close_entry(&self) -> BarrierCloseAck {
        self.close("entry").await
    }

    /// Close the exit barrier
    pub async fn close_exit(&self) -> BarrierCloseAck {
        self.close("exit").await
    }

    async fn open(&self, gate: &str, session_id: Uuid) -> BarrierAck {
        tracing::info!(gate = %gate, session_id = %session_id, "Opening barrier");

        self.events
            .record(
                "barrier_open",
                EventSeverity::Low,
                "Barrier",
                &format!("{} barrier opened for session {}", gate, session_id),
                serde_json::json!({ "gate": gate, "sessionId": session_id }),
            )
            .await;

        tokio::time::sleep(self.open_delay).await;

        BarrierAck {
            success: true,
            message: format!("{} barrier opened", gate),
            session_id,
            open_time: Utc::now(),
        }
    }

    async fn close(&self, gate: &str) -> BarrierCloseAck {
        tracing::info!(gate = %gate, "Closing barrier");

        self.events
            .record(
                "barrier_close",
                EventSeverity::Low,
                "Barrier",
                &format!("{} barrier closed", gate),
                serde_json::json!({ "gate": gate }),
            )
            .await;

        tokio::time::sleep(self.open_delay).await;

        BarrierCloseAck {
            success: true,
            message: format!("{} barrier closed", gate),
            close_time: Utc::now(),
        }
    }
}
