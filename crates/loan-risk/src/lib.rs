//! Decision-support core for the consumer-lending risk dashboard.
//!
//! The crate derives loan installments, maps risk-engine responses into the
//! gauge/decision presentation, and owns the editable risk policy with its
//! remote-primary, local-fallback persistence.

pub mod config;
pub mod error;
pub mod risk;
pub mod telemetry;
