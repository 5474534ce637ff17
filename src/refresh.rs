//! Background refresh scheduling
//!
//! Re-runs the fetch pipeline on a fixed period and keeps the persisted
//! display value current. The task is controlled over tokio channels: one
//! to re-arm the ticker when the interval setting changes, one to shut it
//! down. A failed tick is logged and leaves the stale cache entry in place;
//! the next tick is a fresh attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, warn};

use crate::data::Units;
use crate::service::{keys, ServiceContext};

/// Default refresh period in minutes
pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;

/// Handle for controlling the background refresh task
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    /// Channel for re-arming the ticker with a new period (minutes)
    interval_tx: mpsc::Sender<u64>,
    /// Channel for signalling shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task with the given period in minutes
    ///
    /// A period of 0 disables the ticker until a new interval arrives. The
    /// first tick fires one full period after spawn, never immediately.
    pub fn spawn(minutes: u64, ctx: Arc<ServiceContext>) -> Self {
        let (interval_tx, mut interval_rx) = mpsc::channel(4);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut ticker = make_ticker(minutes);

            loop {
                tokio::select! {
                    _ = next_tick(&mut ticker) => {
                        if let Err(e) = run_refresh(&ctx).await {
                            warn!("scheduled refresh failed: {e}");
                        }
                    }
                    Some(minutes) = interval_rx.recv() => {
                        if minutes > 0 {
                            info!("refresh interval set to {minutes} minutes");
                        } else {
                            info!("periodic refresh disabled");
                        }
                        // Any pending tick is dropped along with the old ticker
                        ticker = make_ticker(minutes);
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            interval_tx,
            shutdown_tx,
        }
    }

    /// Re-arms the ticker with a new period in minutes (0 disables)
    pub async fn set_interval(&self, minutes: u64) {
        let _ = self.interval_tx.send(minutes).await;
    }

    /// Shuts down the refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Builds the ticker for the given period, skipping the immediate first tick
fn make_ticker(minutes: u64) -> Option<Interval> {
    (minutes > 0).then(|| {
        let period = Duration::from_secs(minutes.saturating_mul(60));
        interval_at(Instant::now() + period, period)
    })
}

/// Waits for the next tick, or forever when the ticker is disabled
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => futures::future::pending().await,
    }
}

/// Runs one refresh cycle for the stored last location
///
/// Skips quietly when no location has been recorded yet: there is nothing
/// to refresh until the first request resolves one.
async fn run_refresh(ctx: &ServiceContext) -> Result<(), crate::data::WeatherError> {
    let Some(location) = ctx.store.get::<crate::data::Location>(keys::LAST_LOCATION) else {
        debug!("no stored location yet, skipping scheduled refresh");
        return Ok(());
    };
    let units = ctx.store.get(keys::UNITS).unwrap_or(Units::Metric);

    let bundle = ctx.update_weather(&location, units).await?;
    info!(
        "refreshed weather for {} ({}{})",
        bundle.location.label(),
        bundle.current.temp.round(),
        units.temp_suffix()
    );

    Ok(())
}
