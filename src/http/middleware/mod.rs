//! Request middleware applied in front of every handler.

pub mod classify;
pub mod limit;

pub use classify::classification_middleware;
pub use limit::{in_flight_limit, InFlightLimit};
