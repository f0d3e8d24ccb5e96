//! End-to-end parking flow tests
//!
//! These tests exercise allocation and settlement against a real Postgres
//! instance. They are ignored by default; run them with a migrated test
//! database:
//!
//! ```text
//! TEST_DATABASE_URL=postgresql://localhost/parkwise_test cargo test -- --ignored
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use sqlx::PgPool;
    use uuid::Uuid;

    use parkwise_server::error::ApiError;
    use parkwise_server::events::EventRecorder;
    use parkwise_server::models::{
        ParkingSpace, PaymentMethod, PaymentStatus, SessionStatus, SpaceStatus, TransactionStatus,
    };
    use parkwise_server::parking::{AllocationPreferences, ParkingService};
    use parkwise_server::payment::{
        GatewayError, GatewayReceipt, PaymentGateway, PaymentService, RetryPolicy,
        SimulatedGateway,
    };
    use parkwise_server::pricing::PricingConfig;

    /// Gateway double that declines every charge.
    struct DecliningGateway;

    #[async_trait]
    impl PaymentGateway for DecliningGateway {
        async fn charge(
            &self,
            _amount: f64,
            _method: PaymentMethod,
        ) -> Result<GatewayReceipt, GatewayError> {
            Err(GatewayError::Declined("insufficient funds".to_string()))
        }
    }

    /// Gateway double that times out on every charge.
    struct TimingOutGateway;

    #[async_trait]
    impl PaymentGateway for TimingOutGateway {
        async fn charge(
            &self,
            _amount: f64,
            _method: PaymentMethod,
        ) -> Result<GatewayReceipt, GatewayError> {
            Err(GatewayError::Transient("gateway timeout".to_string()))
        }
    }

    /// Helper to create a test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/parkwise_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn parking_service(pool: &PgPool) -> ParkingService {
        ParkingService::new(pool.clone(), EventRecorder::new(pool.clone()))
    }

    /// Payment service wired to a gateway that always succeeds instantly
    fn payment_service(pool: &PgPool) -> PaymentService {
        payment_service_with(pool, Arc::new(SimulatedGateway::new(0.0, Duration::from_millis(0))))
    }

    fn payment_service_with(pool: &PgPool, gateway: Arc<dyn PaymentGateway>) -> PaymentService {
        PaymentService::new(
            pool.clone(),
            PricingConfig::default(),
            gateway,
            RetryPolicy::new(3, Duration::from_millis(1)),
            EventRecorder::new(pool.clone()),
        )
    }

    async fn fetch_space(pool: &PgPool, space_id: Uuid) -> ParkingSpace {
        sqlx::query_as::<_, ParkingSpace>("SELECT * FROM parking_spaces WHERE id = $1")
            .bind(space_id)
            .fetch_one(pool)
            .await
            .expect("space should exist")
    }

    /// Seed `count` available spaces in a fresh zone, returning the zone name.
    /// A unique zone isolates each test run from leftover data.
    async fn seed_zone(pool: &PgPool, count: usize) -> String {
        let zone = format!("T{}", &Uuid::new_v4().simple().to_string()[..8]);

        for i in 0..count {
            sqlx::query(
                r#"
                INSERT INTO parking_spaces (space_number, floor, zone, status, space_type)
                VALUES ($1, 1, $2, 'available', 'regular')
                "#,
            )
            .bind(format!("{}-{:03}", zone, i + 1))
            .bind(&zone)
            .execute(pool)
            .await
            .expect("Failed to seed parking space");
        }

        zone
    }

    fn unique_plate() -> String {
        format!("TST-{}", &Uuid::new_v4().simple().to_string()[..6].to_uppercase())
    }

    fn zone_prefs(zone: &str) -> AllocationPreferences {
        AllocationPreferences {
            zone: Some(zone.to_string()),
            floor: None,
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_allocation_never_oversells() {
        let pool = setup_test_db().await;
        let service = Arc::new(parking_service(&pool));

        let space_count = 2;
        let request_count = 6;
        let zone = seed_zone(&pool, space_count).await;

        let mut handles = Vec::new();
        for _ in 0..request_count {
            let service = service.clone();
            let zone = zone.clone();
            handles.push(tokio::spawn(async move {
                service.allocate(&unique_plate(), &zone_prefs(&zone)).await
            }));
        }

        let mut allocated = 0usize;
        let mut lot_full = 0usize;
        let mut space_ids = Vec::new();
        for handle in handles {
            match handle.await.expect("allocation task panicked") {
                Ok(result) => {
                    allocated += 1;
                    space_ids.push(result.space.id);
                }
                Err(ApiError::LotFull) => lot_full += 1,
                Err(other) => panic!("unexpected allocation error: {}", other),
            }
        }

        assert_eq!(allocated, space_count, "every space should be handed out once");
        assert_eq!(lot_full, request_count - space_count);

        // No space was handed to two vehicles
        space_ids.sort();
        space_ids.dedup();
        assert_eq!(space_ids.len(), space_count);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_active_session_rejected() {
        let pool = setup_test_db().await;
        let service = parking_service(&pool);

        let zone = seed_zone(&pool, 2).await;
        let plate = unique_plate();

        service
            .allocate(&plate, &zone_prefs(&zone))
            .await
            .expect("first allocation should succeed");

        let err = service
            .allocate(&plate, &zone_prefs(&zone))
            .await
            .expect_err("second allocation for the same plate should fail");

        assert!(matches!(err, ApiError::DuplicateSession));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_first_allocations_same_plate_get_domain_error() {
        let pool = setup_test_db().await;
        let service = Arc::new(parking_service(&pool));

        // A plate the database has never seen: the vehicle upsert must
        // absorb the race on the unique index, so the loser sees the
        // duplicate-session conflict rather than a database error
        let zone = seed_zone(&pool, 2).await;
        let plate = unique_plate();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = service.clone();
            let plate = plate.clone();
            let zone = zone.clone();
            handles.push(tokio::spawn(async move {
                service.allocate(&plate, &zone_prefs(&zone)).await
            }));
        }

        let mut allocated = 0usize;
        let mut duplicates = 0usize;
        for handle in handles {
            match handle.await.expect("allocation task panicked") {
                Ok(_) => allocated += 1,
                Err(ApiError::DuplicateSession) => duplicates += 1,
                Err(other) => panic!("unexpected allocation error: {}", other),
            }
        }

        assert_eq!(allocated, 1);
        assert_eq!(duplicates, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_payment_creation_is_idempotent() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let payments = payment_service(&pool);

        let zone = seed_zone(&pool, 1).await;
        let allocation = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let first = payments
            .create_payment(allocation.session.id, "credit_card")
            .await
            .expect("first payment creation should succeed");
        assert!(!first.transaction_reused);

        let second = payments
            .create_payment(allocation.session.id, "credit_card")
            .await
            .expect("second payment creation should succeed");

        assert!(second.transaction_reused, "pending transaction must be reused");
        assert_eq!(second.transaction.id, first.transaction.id);

        // Each creation opens its own attempt against the shared transaction
        assert_ne!(second.payment.id, first.payment.id);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_settlement_updates_all_records_atomically() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let payments = payment_service(&pool);

        let zone = seed_zone(&pool, 1).await;
        let allocation = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let created = payments
            .create_payment(allocation.session.id, "credit_card")
            .await
            .expect("payment creation should succeed");
        assert_eq!(created.payment.status, PaymentStatus::Initiated);

        let settled = payments
            .confirm_payment(created.payment.id)
            .await
            .expect("confirmation should succeed against a healthy gateway");

        assert_eq!(settled.payment.status, PaymentStatus::Completed);
        assert!(settled.payment.payment_gateway_ref.is_some());
        assert_eq!(settled.transaction.status, TransactionStatus::Completed);
        assert_eq!(settled.session.status, SessionStatus::Completed);
        assert!(settled.session.exit_time.is_some());
        assert!(settled.session.duration_minutes.is_some());
        assert_eq!(settled.space.status, SpaceStatus::Available);
        assert_eq!(settled.space.id, allocation.space.id);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_declined_charge_fails_payment_but_keeps_session_open() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let payments = payment_service_with(&pool, Arc::new(DecliningGateway));

        let zone = seed_zone(&pool, 1).await;
        let allocation = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let created = payments
            .create_payment(allocation.session.id, "credit_card")
            .await
            .expect("payment creation should succeed");

        let err = payments
            .confirm_payment(created.payment.id)
            .await
            .expect_err("declined charge should fail the confirmation");
        assert!(matches!(err, ApiError::PaymentFailed));

        // The decline is committed: payment and transaction are failed, but
        // the vehicle has not left - session stays active, space occupied
        let details = payments
            .get_payment_details(created.payment.id)
            .await
            .expect("payment should still be readable");
        assert_eq!(details.payment.status, PaymentStatus::Failed);
        assert_eq!(details.transaction.status, TransactionStatus::Failed);
        assert_eq!(details.session.status, SessionStatus::Active);
        assert!(details.session.exit_time.is_none());

        let space = fetch_space(&pool, allocation.space.id).await;
        assert_eq!(space.status, SpaceStatus::Occupied);

        // A failed payment cannot be confirmed again
        let err = payments
            .confirm_payment(created.payment.id)
            .await
            .expect_err("failed payment must stay terminal");
        assert!(matches!(err, ApiError::PaymentFailed));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_gateway_exhaustion_leaves_payment_retryable() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let flaky = payment_service_with(&pool, Arc::new(TimingOutGateway));

        let zone = seed_zone(&pool, 1).await;
        let allocation = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let created = flaky
            .create_payment(allocation.session.id, "credit_card")
            .await
            .expect("payment creation should succeed");

        let err = flaky
            .confirm_payment(created.payment.id)
            .await
            .expect_err("exhausted gateway should fail the confirmation");
        match err {
            ApiError::GatewayError { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {}", other),
        }

        // The rollback keeps the payment non-terminal
        let details = flaky
            .get_payment_details(created.payment.id)
            .await
            .expect("payment should still be readable");
        assert_eq!(details.payment.status, PaymentStatus::Initiated);
        assert_eq!(details.transaction.status, TransactionStatus::Pending);
        assert_eq!(details.session.status, SessionStatus::Active);

        // Once the gateway recovers, the same payment settles
        let healthy = payment_service(&pool);
        let settled = healthy
            .confirm_payment(created.payment.id)
            .await
            .expect("retry against a healthy gateway should settle");
        assert_eq!(settled.payment.status, PaymentStatus::Completed);
        assert_eq!(settled.space.status, SpaceStatus::Available);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_double_confirmation_rejected() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let payments = payment_service(&pool);

        let zone = seed_zone(&pool, 1).await;
        let allocation = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let created = payments
            .create_payment(allocation.session.id, "cash")
            .await
            .expect("payment creation should succeed");

        payments
            .confirm_payment(created.payment.id)
            .await
            .expect("first confirmation should succeed");

        let err = payments
            .confirm_payment(created.payment.id)
            .await
            .expect_err("second confirmation should be rejected");

        assert!(matches!(err, ApiError::PaymentAlreadyCompleted));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_space_released_after_settlement_is_reallocatable() {
        let pool = setup_test_db().await;
        let parking = parking_service(&pool);
        let payments = payment_service(&pool);

        let zone = seed_zone(&pool, 1).await;
        let first = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("allocation should succeed");

        let created = payments
            .create_payment(first.session.id, "upi")
            .await
            .expect("payment creation should succeed");
        payments
            .confirm_payment(created.payment.id)
            .await
            .expect("confirmation should succeed");

        // The only space in the zone is free again
        let second = parking
            .allocate(&unique_plate(), &zone_prefs(&zone))
            .await
            .expect("reallocation of the settled space should succeed");
        assert_eq!(second.space.id, first.space.id);
    }
}
