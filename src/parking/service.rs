//! Parking service layer - space allocation and release

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::events::EventRecorder;
use crate::models::{EventSeverity, ParkingSession, ParkingSpace, SpaceStatus, Vehicle};
use crate::parking::{
    normalize_plate, ActiveSession, AllocationPreferences, AllocationResult, SpaceStatistics,
};

#[derive(sqlx::FromRow)]
struct StatusCounts {
    total: i64,
    available: i64,
    occupied: i64,
    reserved: i64,
    maintenance: i64,
}

/// Parking service for space allocation and the session ledger
#[derive(Clone)]
pub struct ParkingService {
    db_pool: PgPool,
    events: EventRecorder,
}

impl ParkingService {
    /// Create a new parking service instance
    pub fn new(db_pool: PgPool, events: EventRecorder) -> Self {
        Self { db_pool, events }
    }

    /// Allocate a parking space to a vehicle.
    ///
    /// Runs as a single atomic unit of work: find-or-create the vehicle,
    /// reject a duplicate active session, pick the lowest-numbered available
    /// space under a row lock, occupy it and open the session. Either every
    /// step commits or none do.
    pub async fn allocate(
        &self,
        license_plate: &str,
        preferences: &AllocationPreferences,
    ) -> ApiResult<AllocationResult> {
        let plate = normalize_plate(license_plate);
        if plate.is_empty() {
            return Err(ApiError::BadRequest("License plate is required".to_string()));
        }

        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        // Find-or-create the vehicle in one race-free statement. The upsert
        // takes the row lock on conflict, so concurrent allocations for the
        // same plate serialize here instead of racing the unique index.
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (license_plate, first_seen, last_seen, visit_count)
            VALUES ($1, $2, $2, 1)
            ON CONFLICT (license_plate) DO UPDATE
            SET last_seen = EXCLUDED.last_seen,
                visit_count = vehicles.visit_count + 1,
                updated_at = EXCLUDED.last_seen
            RETURNING *
            "#,
        )
        .bind(&plate)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // One active session per vehicle
        let active_session = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM parking_sessions WHERE vehicle_id = $1 AND status = 'active'",
        )
        .bind(vehicle.id)
        .fetch_optional(&mut *tx)
        .await?;

        if active_session.is_some() {
            drop(tx);
            self.events
                .record(
                    "allocation_rejected",
                    EventSeverity::Low,
                    "Parking",
                    &format!("Duplicate session attempt for plate {}", plate),
                    json!({ "licensePlate": plate }),
                )
                .await;
            return Err(ApiError::DuplicateSession);
        }

        // Select one available candidate space under a row lock. The
        // deterministic space_number ordering gives concurrent allocators a
        // stable tie-break; the lock keeps them from picking the same row.
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
            "SELECT * FROM parking_spaces WHERE status = 'available' AND is_active = TRUE",
        );
        if let Some(zone) = &preferences.zone {
            query_builder.push(" AND zone = ");
            query_builder.push_bind(zone);
        }
        if let Some(floor) = preferences.floor {
            query_builder.push(" AND floor = ");
            query_builder.push_bind(floor);
        }
        query_builder.push(" ORDER BY space_number ASC LIMIT 1 FOR UPDATE");

        let candidate = query_builder
            .build_query_as::<ParkingSpace>()
            .fetch_optional(&mut *tx)
            .await?;

        let Some(space) = candidate else {
            drop(tx);
            self.events
                .record(
                    "allocation_rejected",
                    EventSeverity::Medium,
                    "Parking",
                    "No available parking spaces",
                    json!({
                        "licensePlate": plate,
                        "zone": preferences.zone,
                        "floor": preferences.floor,
                    }),
                )
                .await;
            return Err(ApiError::LotFull);
        };

        let space = sqlx::query_as::<_, ParkingSpace>(
            r#"
            UPDATE parking_spaces
            SET status = $1, last_occupied = $2, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(SpaceStatus::Occupied)
        .bind(now)
        .bind(space.id)
        .fetch_one(&mut *tx)
        .await?;

        let session = sqlx::query_as::<_, ParkingSession>(
            r#"
            INSERT INTO parking_sessions (vehicle_id, space_id, entry_time, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(space.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            license_plate = %plate,
            space_number = %space.space_number,
            session_id = %session.id,
            "Space allocated"
        );

        Ok(AllocationResult {
            session,
            space,
            vehicle,
        })
    }

    /// Release a parking space back to the pool.
    ///
    /// Administrative escape hatch: this only flips the space to available
    /// and does NOT complete any session. Outside the settlement path (which
    /// completes the session in the same commit) callers must reconcile
    /// session state themselves or the two will desynchronize.
    pub async fn release(&self, space_id: Uuid) -> ApiResult<ParkingSpace> {
        let mut tx = self.db_pool.begin().await?;

        let space = sqlx::query_as::<_, ParkingSpace>(
            "SELECT * FROM parking_spaces WHERE id = $1 FOR UPDATE",
        )
        .bind(space_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::SpaceNotFound)?;

        let space = sqlx::query_as::<_, ParkingSpace>(
            r#"
            UPDATE parking_spaces
            SET status = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(SpaceStatus::Available)
        .bind(Utc::now())
        .bind(space.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            space_id = %space_id,
            space_number = %space.space_number,
            "Space released"
        );

        Ok(space)
    }

    /// List all parking spaces ordered by space number
    pub async fn get_all_spaces(&self) -> ApiResult<Vec<ParkingSpace>> {
        let spaces = sqlx::query_as::<_, ParkingSpace>(
            "SELECT * FROM parking_spaces ORDER BY space_number ASC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(spaces)
    }

    /// Occupancy statistics across all spaces
    pub async fn space_statistics(&self) -> ApiResult<SpaceStatistics> {
        let counts = sqlx::query_as::<_, StatusCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'available') AS available,
                COUNT(*) FILTER (WHERE status = 'occupied') AS occupied,
                COUNT(*) FILTER (WHERE status = 'reserved') AS reserved,
                COUNT(*) FILTER (WHERE status = 'maintenance') AS maintenance
            FROM parking_spaces
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        let occupancy_rate = if counts.total > 0 {
            ((counts.occupied as f64 / counts.total as f64) * 10000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(SpaceStatistics {
            total: counts.total,
            available: counts.available,
            occupied: counts.occupied,
            reserved: counts.reserved,
            maintenance: counts.maintenance,
            occupancy_rate,
        })
    }

    /// Active sessions with their vehicle and space, newest entry first
    pub async fn active_sessions(&self) -> ApiResult<Vec<ActiveSession>> {
        let sessions = sqlx::query_as::<_, ActiveSession>(
            r#"
            SELECT
                s.id, s.vehicle_id, s.space_id, s.entry_time, s.status,
                v.license_plate,
                p.space_number, p.zone, p.floor
            FROM parking_sessions s
            JOIN vehicles v ON v.id = s.vehicle_id
            JOIN parking_spaces p ON p.id = s.space_id
            WHERE s.status = 'active'
            ORDER BY s.entry_time DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(sessions)
    }
}
