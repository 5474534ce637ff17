//! Single-slot forecast cache
//!
//! Holds the most recent forecast pair and its write timestamp. The slot is
//! not keyed by location: switching location is only corrected by the next
//! overwrite. Entries expire logically after the validity window but are
//! never deleted, only superseded.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::StateStore;
use crate::data::{ForecastBundle, Location, Units};

/// Store key for the forecast slot
const FORECAST_KEY: &str = "forecast";

/// Minutes a cached forecast stays fresh
pub const VALIDITY_MINUTES: i64 = 30;

/// The most recent forecast pair, stamped with its write time
///
/// The metric and imperial bundles are always derived together from one
/// snapshot; the imperial bundle is a pure unit conversion of the metric
/// one, never fetched on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedForecast {
    /// The place the forecast was fetched for
    pub location: Location,
    /// The metric bundle
    pub metric: ForecastBundle,
    /// The imperial bundle, converted from the metric one
    pub imperial: ForecastBundle,
    /// When the pair was written
    pub cached_at: DateTime<Utc>,
}

impl CachedForecast {
    /// Returns the bundle expressed in the requested unit system
    pub fn bundle(&self, units: Units) -> &ForecastBundle {
        match units {
            Units::Metric => &self.metric,
            Units::Imperial => &self.imperial,
        }
    }
}

/// Single-slot cache over the persisted state store
#[derive(Debug, Clone)]
pub struct ForecastCache {
    store: StateStore,
}

impl ForecastCache {
    /// Creates a cache over the given store
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Returns the cached bundle for the requested units if the slot is
    /// still inside the validity window
    ///
    /// A stale or missing slot returns `None`; the caller is expected to
    /// fetch, regenerate, and overwrite.
    pub fn fresh(&self, units: Units) -> Option<ForecastBundle> {
        let entry: CachedForecast = self.store.get(FORECAST_KEY)?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age >= Duration::minutes(VALIDITY_MINUTES) {
            return None;
        }

        Some(entry.bundle(units).clone())
    }

    /// Overwrites the slot with a new entry
    pub fn store(&self, entry: &CachedForecast) -> std::io::Result<()> {
        self.store.set(FORECAST_KEY, entry)
    }
}
