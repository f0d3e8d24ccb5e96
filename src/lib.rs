//! ParkWise Backend Library
//!
//! This library exports the core modules for the ParkWise parking
//! management backend server.

pub mod barrier;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lpr;
pub mod middleware;
pub mod models;
pub mod parking;
pub mod payment;
pub mod pricing;
pub mod routes;
pub mod state;
