//! Application state shared across handlers

use std::sync::Arc;

use crate::barrier::BarrierService;
use crate::lpr::LprService;
use crate::parking::ParkingService;
use crate::payment::PaymentService;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub parking_service: Arc<ParkingService>,
    pub payment_service: Arc<PaymentService>,
    pub lpr_service: Arc<LprService>,
    pub barrier_service: Arc<BarrierService>,
}

impl AppState {
    pub fn new(
        parking_service: Arc<ParkingService>,
        payment_service: Arc<PaymentService>,
        lpr_service: Arc<LprService>,
        barrier_service: Arc<BarrierService>,
    ) -> Self {
        Self {
            parking_service,
            payment_service,
            lpr_service,
            barrier_service,
        }
    }
}

impl FromRef<AppState> for Arc<ParkingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.parking_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<LprService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.lpr_service.clone()
    }
}

impl FromRef<AppState> for Arc<BarrierService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.barrier_service.clone()
    }
}
