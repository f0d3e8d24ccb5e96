//! Data models for the ParkWise backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Vehicle model
///
/// Created on the first allocation for an unseen plate and never deleted;
/// `last_seen` and `visit_count` are bumped on every subsequent allocation.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub visit_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parking space model
///
/// `status` is the only concurrency-sensitive field; every mutation happens
/// inside a store transaction that also reads the current value under lock.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ParkingSpace {
    pub id: Uuid,
    pub space_number: String,
    pub floor: i32,
    pub zone: String,
    pub status: SpaceStatus,
    pub space_type: SpaceType,
    pub is_active: bool,
    pub last_occupied: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parking space status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "space_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpaceStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

/// Parking space type
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "space_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Regular,
    Handicap,
    Electric,
    Vip,
}

/// Parking session model
///
/// One vehicle occupying one space for a bounded interval. At most one
/// `active` session per vehicle and per space at any time.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ParkingSession {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub space_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parking session status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

/// Fee transaction model - one per session (session_id is unique)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub session_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub receipt_number: String,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction status
///
/// `Refunded` is reachable only through out-of-band administrative action;
/// no service code path sets it.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Payment attempt model - multiple per transaction only if earlier
/// attempts failed
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_gateway_ref: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment attempt status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Initiated,
    Processing,
    Completed,
    Failed,
}

/// Supported payment methods - the allow-list for payment creation
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Cash,
    MobileWallet,
    Upi,
}

impl PaymentMethod {
    pub const SUPPORTED: [&'static str; 5] =
        ["credit_card", "debit_card", "cash", "mobile_wallet", "upi"];

    /// Parse a caller-supplied method string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit_card" => Some(PaymentMethod::CreditCard),
            "debit_card" => Some(PaymentMethod::DebitCard),
            "cash" => Some(PaymentMethod::Cash),
            "mobile_wallet" => Some(PaymentMethod::MobileWallet),
            "upi" => Some(PaymentMethod::Upi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileWallet => "mobile_wallet",
            PaymentMethod::Upi => "upi",
        }
    }
}

/// System event model - append-only audit record, never read back for
/// control decisions
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct SystemEvent {
    pub id: Uuid,
    pub event_type: String,
    pub severity: EventSeverity,
    pub component: String,
    pub message: String,
    pub details: serde_json::Value,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

/// Event severity
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "event_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(
            PaymentMethod::parse("credit_card"),
            Some(PaymentMethod::CreditCard)
        );
        assert_eq!(
            PaymentMethod::parse("CREDIT_CARD"),
            Some(PaymentMethod::CreditCard)
        );
        assert_eq!(PaymentMethod::parse("upi"), Some(PaymentMethod::Upi));
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
        assert_eq!(PaymentMethod::parse(""), None);
    }

    #[test]
    fn test_payment_method_round_trip() {
        for name in PaymentMethod::SUPPORTED {
            let method = PaymentMethod::parse(name).expect("supported method must parse");
            assert_eq!(method.as_str(), name);
        }
    }
}
