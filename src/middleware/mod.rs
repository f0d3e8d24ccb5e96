//! HTTP middleware

mod tracing;

pub use self::tracing::request_tracing;
