//! Popstream Shared Library
//!
//! This crate contains the demographic data pipeline behind the Popstream
//! server: provider clients, rate derivation, the state store, the refresh
//! orchestrator and the fan-out publisher.
//!
//! # Modules
//!
//! - [`models`] - Metric snapshots and the full demographic state
//! - [`rates`] - Daily rate derivation
//! - [`sources`] - Statistics provider clients
//! - [`storage`] - State store and fetch gate
//! - [`synthetic`] - Synthetic fallback data
//! - [`refresh`] - Refresh orchestrator and scheduler
//! - [`publish`] - Fan-out to live subscribers
//!
//! # Example
//!
//! ```
//! use shared::rates::{annual_births_from_rate, daily_births};
//!
//! let annual = annual_births_from_rate(10.5, 67_000_000.0);
//! assert_eq!(annual, 703_500);
//! assert_eq!(daily_births(703_500.0), 1927);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod publish;
pub mod rates;
pub mod refresh;
pub mod sources;
pub mod storage;
pub mod synthetic;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
