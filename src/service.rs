//! Request dispatch and the fetch pipeline
//!
//! The service owns the shared context (API client, state store, forecast
//! cache) and routes UI-originated requests to it over a channel. Each
//! request is handled in its own task so no request kind blocks another.
//! Concurrent requests racing the scheduler are not coordinated: the store
//! has no locks and the last write wins.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::cache::{CachedForecast, ForecastCache, StateStore};
use crate::data::{ForecastBundle, Location, Units, WeatherClient, WeatherError};
use crate::forecast::{simulate_forecast, to_imperial};
use crate::refresh::RefreshHandle;

/// Keys under which the service persists its state
pub mod keys {
    /// The location of the most recent successful fetch
    pub const LAST_LOCATION: &str = "last_location";
    /// Preferred unit system
    pub const UNITS: &str = "units";
    /// Refresh period in minutes (0 = disabled)
    pub const REFRESH_INTERVAL: &str = "refresh_interval";
    /// Compact current-temperature string for at-a-glance display
    pub const LAST_DISPLAY: &str = "last_display";
}

/// Shared state behind the dispatcher and the scheduler
#[derive(Debug)]
pub struct ServiceContext {
    /// OpenWeather API client
    pub client: WeatherClient,
    /// Persisted key-value state
    pub store: StateStore,
    /// Single-slot forecast cache over the store
    pub cache: ForecastCache,
}

impl ServiceContext {
    /// Builds a context over the given client and store
    pub fn new(client: WeatherClient, store: StateStore) -> Self {
        let cache = ForecastCache::new(store.clone());
        Self {
            client,
            store,
            cache,
        }
    }

    /// Runs the fetch pipeline: one observation fetch, simulated expansion
    /// into the metric/imperial pair, cache overwrite, and bookkeeping
    ///
    /// Store writes are logged on failure but never fail the request; the
    /// caller still gets its bundle.
    pub async fn update_weather(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<ForecastBundle, WeatherError> {
        let observation = self.client.current_observation(location).await?;

        let metric = simulate_forecast(
            &observation.location,
            &observation.snapshot,
            &mut rand::thread_rng(),
        );
        let imperial = to_imperial(&metric);

        let entry = CachedForecast {
            location: observation.location.clone(),
            metric,
            imperial,
            cached_at: Utc::now(),
        };

        if let Err(e) = self.cache.store(&entry) {
            warn!("failed to persist forecast cache: {e}");
        }
        if let Err(e) = self.store.set(keys::LAST_LOCATION, &entry.location) {
            warn!("failed to persist last location: {e}");
        }
        if let Err(e) = self.store.set(keys::UNITS, &units) {
            warn!("failed to persist unit preference: {e}");
        }

        let bundle = entry.bundle(units).clone();

        let display = format!("{}°", bundle.current.temp.round());
        if let Err(e) = self.store.set(keys::LAST_DISPLAY, &display) {
            warn!("failed to persist display value: {e}");
        }

        Ok(bundle)
    }
}

/// A request routed through the dispatcher
#[derive(Debug)]
pub enum Request {
    /// Fetch (or serve from cache) the forecast for a location
    GetWeather {
        location: Location,
        units: Units,
        reply: oneshot::Sender<ServiceResult>,
    },
    /// Bypass the cache and refresh the stored last location
    Refresh { reply: oneshot::Sender<ServiceResult> },
    /// Persist a new refresh period and re-arm the scheduler
    UpdateRefreshInterval {
        minutes: u64,
        reply: oneshot::Sender<ServiceResult>,
    },
}

/// Successful reply payloads
#[derive(Debug, Clone)]
pub enum Response {
    /// A forecast bundle in the requested unit system
    Weather(Box<ForecastBundle>),
    /// The request completed with nothing to return
    Ack,
}

/// Replies carry either a payload or a human-readable error message
pub type ServiceResult = Result<Response, String>;

/// The dispatcher task
pub struct WeatherService;

impl WeatherService {
    /// Spawns the dispatcher and its refresh scheduler
    ///
    /// # Arguments
    /// * `ctx` - The shared context
    /// * `refresh_minutes` - Initial refresh period (0 disables the ticker)
    pub fn spawn(ctx: ServiceContext, refresh_minutes: u64) -> ServiceHandle {
        let ctx = Arc::new(ctx);
        let refresh = RefreshHandle::spawn(refresh_minutes, ctx.clone());
        let (tx, mut rx) = mpsc::channel::<Request>(32);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let ctx = ctx.clone();
                let refresh = refresh.clone();
                tokio::spawn(async move {
                    handle_request(request, ctx, refresh).await;
                });
            }
        });

        ServiceHandle { tx }
    }
}

async fn handle_request(request: Request, ctx: Arc<ServiceContext>, refresh: RefreshHandle) {
    match request {
        Request::GetWeather {
            location,
            units,
            reply,
        } => {
            // The slot is not keyed by location; a fresh entry answers any
            // request until it is superseded.
            let result = match ctx.cache.fresh(units) {
                Some(bundle) => Ok(Response::Weather(Box::new(bundle))),
                None => ctx
                    .update_weather(&location, units)
                    .await
                    .map(|bundle| Response::Weather(Box::new(bundle)))
                    .map_err(|e| e.to_string()),
            };
            let _ = reply.send(result);
        }
        Request::Refresh { reply } => {
            let result = match ctx.store.get::<Location>(keys::LAST_LOCATION) {
                Some(location) => {
                    let units = ctx.store.get(keys::UNITS).unwrap_or(Units::Metric);
                    ctx.update_weather(&location, units)
                        .await
                        .map(|_| Response::Ack)
                        .map_err(|e| e.to_string())
                }
                // Nothing fetched yet, nothing to refresh
                None => Ok(Response::Ack),
            };
            let _ = reply.send(result);
        }
        Request::UpdateRefreshInterval { minutes, reply } => {
            if let Err(e) = ctx.store.set(keys::REFRESH_INTERVAL, &minutes) {
                let _ = reply.send(Err(format!("failed to persist refresh interval: {e}")));
                return;
            }
            refresh.set_interval(minutes).await;
            let _ = reply.send(Ok(Response::Ack));
        }
    }
}

/// Caller-side handle for sending requests to the dispatcher
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Request>,
}

impl ServiceHandle {
    /// Requests the forecast for a location, serving from cache when fresh
    pub async fn get_weather(&self, location: Location, units: Units) -> ServiceResult {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::GetWeather {
                location,
                units,
                reply,
            })
            .await
            .map_err(|_| "weather service is not running".to_string())?;
        rx.await
            .unwrap_or_else(|_| Err("weather service dropped the request".to_string()))
    }

    /// Forces a refresh of the stored last location
    pub async fn refresh(&self) -> ServiceResult {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Refresh { reply })
            .await
            .map_err(|_| "weather service is not running".to_string())?;
        rx.await
            .unwrap_or_else(|_| Err("weather service dropped the request".to_string()))
    }

    /// Persists a new refresh period and re-arms the scheduler
    pub async fn update_refresh_interval(&self, minutes: u64) -> ServiceResult {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::UpdateRefreshInterval { minutes, reply })
            .await
            .map_err(|_| "weather service is not running".to_string())?;
        rx.await
            .unwrap_or_else(|_| Err("weather service dropped the request".to_string()))
    }
}
