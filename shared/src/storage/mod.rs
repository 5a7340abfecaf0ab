//! Process-lifetime state.
//!
//! Two single-writer slots live here: the [`DemographicStore`] holding the
//! latest metric snapshots and the [`FetchCache`] gating live refreshes.
//! Both hand out cheap read-only handles for the HTTP layer.

pub mod fetch_cache;
pub mod state_store;

pub use fetch_cache::{FetchCache, FetchCacheReader};
pub use state_store::{DemographicStore, StateReader, StoreError};
