//! API route definitions.
//!
//! This module organizes all HTTP routes for the Popstream API server.

mod demographics;
mod health;
mod realtime;
mod status;

pub use demographics::demographics_routes;
pub use health::health_routes;
pub use realtime::realtime_routes;
pub use status::status_routes;
