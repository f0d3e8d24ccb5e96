//! Space allocation and session ledger
//!
//! The allocator hands out scarce parking spaces under concurrency. All
//! correctness comes from the store: every mutation runs inside a single
//! database transaction and candidate rows are taken with `FOR UPDATE`.

mod service;

pub use service::ParkingService;

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ParkingSession, ParkingSpace, SessionStatus, Vehicle};

/// Optional allocation preferences
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AllocationPreferences {
    pub zone: Option<String>,
    pub floor: Option<i32>,
}

/// Result of a successful allocation
#[derive(Debug, Serialize)]
pub struct AllocationResult {
    pub session: ParkingSession,
    pub space: ParkingSpace,
    pub vehicle: Vehicle,
}

/// Occupancy statistics across the lot
#[derive(Debug, Serialize)]
pub struct SpaceStatistics {
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub reserved: i64,
    pub maintenance: i64,
    pub occupancy_rate: f64,
}

/// Active session joined with its vehicle and space
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActiveSession {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub space_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub status: SessionStatus,
    pub license_plate: String,
    pub space_number: String,
    pub zone: String,
    pub floor: i32,
}

/// Normalize a license plate to its canonical casing
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("abc-1234"), "ABC-1234");
        assert_eq!(normalize_plate("  xyz-999 "), "XYZ-999");
        assert_eq!(normalize_plate("ABC-1234"), "ABC-1234");
    }
}
