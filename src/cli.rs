//! Command-line interface parsing for Skycast
//!
//! This module handles parsing of CLI arguments using clap, including the
//! location-selection flags shared by the weather subcommands.

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::data::Units;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified unit system is not recognized
    #[error("Invalid unit system: '{0}'. Valid values: metric, imperial")]
    InvalidUnits(String),
}

/// Skycast - cached weather observations and a week-long outlook
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Weather at a glance: cached observations and a week-long outlook")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run; defaults to showing current conditions
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Skycast subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show current conditions
    Current(LocationArgs),
    /// Show the day-by-day outlook
    Outlook {
        #[command(flatten)]
        location: LocationArgs,
        /// Query the provider's real extended forecast instead of the
        /// simulated outlook (bypasses the cache)
        #[arg(long)]
        live: bool,
    },
    /// Refresh the cached forecast for the last-used location
    Refresh,
    /// Set the background refresh interval in minutes (0 disables it)
    SetInterval {
        /// New interval in minutes
        minutes: u64,
    },
    /// Run the background service until interrupted
    Watch,
    /// Store the OpenWeather API key
    Configure {
        /// API key to store
        #[arg(long)]
        api_key: String,
    },
}

/// Location and unit selection shared by the weather subcommands
///
/// With no flags the last-used location and unit preference are reused.
#[derive(Args, Debug, Default)]
pub struct LocationArgs {
    /// Place name to look up (e.g. "London" or "Paris,FR")
    #[arg(long, conflicts_with_all = ["lat", "lon", "here"])]
    pub place: Option<String>,

    /// Latitude (used together with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude (used together with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Resolve the current location from the network
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub here: bool,

    /// Unit system: metric or imperial
    #[arg(long)]
    pub units: Option<String>,
}

/// Parses a unit-system string argument into a Units enum.
///
/// # Arguments
/// * `s` - The unit system string from CLI
///
/// # Returns
/// * `Ok(Units)` if the string matches a valid unit system
/// * `Err(CliError::InvalidUnits)` if the string doesn't match
pub fn parse_units_arg(s: &str) -> Result<Units, CliError> {
    Units::from_str(s).ok_or_else(|| CliError::InvalidUnits(s.to_string()))
}
