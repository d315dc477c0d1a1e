//! Core of the squid abundance forecaster client.
//!
//! The request lifecycle controller drives confirmation, single-flight
//! submission and result propagation; the heat-layer renderer owns the
//! overlay attached to a map surface and guarantees detach-before-attach.

pub mod client;
pub mod lifecycle;
pub mod math;
pub mod model;
pub mod prelude;
pub mod render;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use prelude::{PredictionError, PredictionResult, SelectionError};
