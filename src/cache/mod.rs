//! Persisted state and forecast caching
//!
//! A flat key-value store backed by JSON files, plus the single-slot
//! forecast cache with its fixed validity window.

pub mod manager;
pub mod slot;

pub use manager::StateStore;
pub use slot::{CachedForecast, ForecastCache, VALIDITY_MINUTES};
