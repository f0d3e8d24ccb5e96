//! Route definitions for the ParkWise API

mod barrier;
mod lpr;
mod parking;
mod payment;

pub use barrier::barrier_routes;
pub use lpr::lpr_routes;
pub use parking::parking_routes;
pub use payment::payment_routes;
