//! Data models for the Popstream demographics service.
//!
//! This module contains the metric snapshot types shared by the refresh
//! pipeline, the HTTP layer and the CLI.

pub mod demographics;

pub use demographics::{DataSource, DemographicState, MetricKind, MetricSnapshot};
