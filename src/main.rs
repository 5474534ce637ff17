//! Skycast - weather at a glance from the terminal
//!
//! A thin shell over the background weather service: subcommands map to
//! dispatcher requests, plus a direct client query for the live outlook.

use std::error::Error;

use chrono::Local;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skycast::cache::StateStore;
use skycast::cli::{parse_units_arg, Cli, Command, LocationArgs};
use skycast::config::Settings;
use skycast::data::{Location, Units, WeatherClient};
use skycast::forecast::to_imperial;
use skycast::refresh::DEFAULT_INTERVAL_MINUTES;
use skycast::render;
use skycast::service::{keys, Response, ServiceContext, WeatherService};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Current(LocationArgs::default()));

    match command {
        Command::Configure { api_key } => {
            let mut updated = settings;
            updated.api_key = Some(api_key);
            let path = updated.save()?;
            println!("API key saved to {}", path.display());
            Ok(())
        }
        command => run_weather_command(command, &settings).await,
    }
}

/// Runs a subcommand that needs the API client and the persisted state
async fn run_weather_command(command: Command, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let api_key = settings.resolved_api_key()?;
    let client = WeatherClient::new(api_key).with_deadline(settings.request_deadline());
    let store = StateStore::new()
        .ok_or("could not determine a data directory for persisted state")?;
    let refresh_minutes = store
        .get(keys::REFRESH_INTERVAL)
        .unwrap_or(DEFAULT_INTERVAL_MINUTES);

    match command {
        Command::Current(args) => {
            let units = resolve_units(&args, &store)?;
            let location = resolve_location(&args, &client, &store).await?;

            let handle = WeatherService::spawn(ServiceContext::new(client, store), refresh_minutes);
            match handle.get_weather(location, units).await? {
                Response::Weather(bundle) => {
                    print!("{}", render::render_current(&bundle, Local::now()));
                }
                Response::Ack => {}
            }
        }
        Command::Outlook {
            location: args,
            live,
        } => {
            let units = resolve_units(&args, &store)?;
            let location = resolve_location(&args, &client, &store).await?;

            if live {
                // Direct provider query; the cache and simulator stay out
                // of the picture. Imperial is still derived by conversion.
                let metric = client.extended_forecast(&location).await?;
                let bundle = match units {
                    Units::Metric => metric,
                    Units::Imperial => to_imperial(&metric),
                };
                print!("{}", render::render_outlook(&bundle, Local::now()));
            } else {
                let handle =
                    WeatherService::spawn(ServiceContext::new(client, store), refresh_minutes);
                match handle.get_weather(location, units).await? {
                    Response::Weather(bundle) => {
                        print!("{}", render::render_outlook(&bundle, Local::now()));
                    }
                    Response::Ack => {}
                }
            }
        }
        Command::Refresh => {
            let handle = WeatherService::spawn(
                ServiceContext::new(client, store.clone()),
                refresh_minutes,
            );
            handle.refresh().await?;
            match store.get::<String>(keys::LAST_DISPLAY) {
                Some(display) => println!("Refreshed: {display}"),
                None => println!("Nothing to refresh yet; fetch a forecast first"),
            }
        }
        Command::SetInterval { minutes } => {
            let handle = WeatherService::spawn(ServiceContext::new(client, store), refresh_minutes);
            handle.update_refresh_interval(minutes).await?;
            if minutes > 0 {
                println!("Auto-refresh every {minutes} minutes");
            } else {
                println!("Auto-refresh disabled");
            }
        }
        Command::Watch => {
            let handle = WeatherService::spawn(ServiceContext::new(client, store), refresh_minutes);

            // Bring the cache up to date before settling into the timer
            if let Err(message) = handle.refresh().await {
                warn!("initial refresh failed: {message}");
            }

            info!("weather service running ({refresh_minutes} minute refresh) - press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            info!("weather service stopped");
        }
        Command::Configure { .. } => {
            // Handled before the client is built
        }
    }

    Ok(())
}

/// Resolves the unit system from flags, then the stored preference
fn resolve_units(args: &LocationArgs, store: &StateStore) -> Result<Units, Box<dyn Error>> {
    match &args.units {
        Some(s) => Ok(parse_units_arg(s)?),
        None => Ok(store.get(keys::UNITS).unwrap_or(Units::Metric)),
    }
}

/// Resolves the requested location from flags, then the stored last location
async fn resolve_location(
    args: &LocationArgs,
    client: &WeatherClient,
    store: &StateStore,
) -> Result<Location, Box<dyn Error>> {
    if let Some(place) = &args.place {
        return Ok(client.search_place(place).await?);
    }
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        return Ok(Location {
            latitude: lat,
            longitude: lon,
            name: None,
        });
    }
    if args.here {
        return Ok(client.locate().await?);
    }
    store
        .get(keys::LAST_LOCATION)
        .ok_or_else(|| "no location on record yet; pass --place, --lat/--lon, or --here".into())
}
