//! API handlers for the ParkWise backend

mod barrier;
mod lpr;
mod parking;
mod payment;

pub use barrier::*;
pub use lpr::*;
pub use parking::*;
pub use payment::*;
