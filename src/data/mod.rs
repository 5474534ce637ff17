//! Core data model for Skycast
//!
//! This module contains the types shared by the API client, the forecast
//! generator, the cache, and the rendering layer: locations, observed
//! conditions, and forecast bundles.

pub mod openweather;

pub use openweather::{WeatherClient, WeatherError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit system a forecast bundle is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    /// Parses a unit system from user input, accepting common aliases.
    pub fn from_str(s: &str) -> Option<Units> {
        match s.to_lowercase().trim() {
            "metric" | "c" | "celsius" => Some(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Some(Units::Imperial),
            _ => None,
        }
    }

    /// Suffix for temperature values in this unit system
    pub fn temp_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    /// Suffix for wind speed values in this unit system
    pub fn wind_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

/// A geographic point a forecast is requested for
///
/// Immutable once attached to a request; the display name is filled in by
/// the geocoder or the observation response when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Human-readable place name (e.g. "London, GB"), if known
    pub name: Option<String>,
}

impl Location {
    /// Returns the display name, falling back to raw coordinates.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:.2}, {:.2}", self.latitude, self.longitude),
        }
    }
}

/// An OpenWeather condition code plus its short description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Provider condition code (e.g. 800 = clear sky)
    pub code: u16,
    /// Short description (e.g. "light rain")
    pub description: String,
}

impl Condition {
    /// Returns the display archetype for this condition code.
    pub fn kind(&self) -> ConditionKind {
        condition_code_to_kind(self.code)
    }
}

/// Display archetypes for weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Atmosphere,
    Clear,
    Clouds,
}

/// Map an OpenWeather condition code to a display archetype
///
/// Condition code groups per the OpenWeather API:
/// - 2xx: thunderstorm
/// - 3xx: drizzle
/// - 5xx: rain
/// - 6xx: snow
/// - 7xx: atmosphere (mist, fog, haze, ...)
/// - 800: clear sky
/// - 80x: clouds
pub fn condition_code_to_kind(code: u16) -> ConditionKind {
    match code {
        200..=232 => ConditionKind::Thunderstorm,
        300..=321 => ConditionKind::Drizzle,
        500..=531 => ConditionKind::Rain,
        600..=622 => ConditionKind::Snow,
        701..=781 => ConditionKind::Atmosphere,
        800 => ConditionKind::Clear,
        _ => ConditionKind::Clouds,
    }
}

/// One real, fetched weather observation
///
/// Created once per successful fetch and never mutated. All values are
/// metric as fetched; imperial views are derived by conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Current temperature
    pub temp: f64,
    /// Feels-like temperature
    pub feels_like: f64,
    /// Today's minimum temperature
    pub temp_min: f64,
    /// Today's maximum temperature
    pub temp_max: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed
    pub wind_speed: f64,
    /// Visibility in metres
    pub visibility: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Sunrise as epoch seconds
    pub sunrise: i64,
    /// Sunset as epoch seconds
    pub sunset: i64,
    /// Observed weather condition
    pub condition: Condition,
    /// When this observation was fetched
    pub captured_at: DateTime<Utc>,
}

/// Temperature range for a single day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempRange {
    /// Daytime temperature
    pub day: f64,
    /// Minimum temperature
    pub min: f64,
    /// Maximum temperature
    pub max: f64,
}

/// Outlook for a single day of the forecast
///
/// Day 0 is the literal observation; later days are synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOutlook {
    /// Days from today (0 = today)
    pub offset: u8,
    /// Temperature range for the day
    pub temp: TempRange,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed
    pub wind_speed: f64,
    /// Weather condition for the day
    pub condition: Condition,
    /// Sunrise as epoch seconds
    pub sunrise: i64,
    /// Sunset as epoch seconds
    pub sunset: i64,
}

/// A snapshot expanded into a multi-day outlook in one unit system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    /// Unit system every value in this bundle is expressed in
    pub units: Units,
    /// The place this forecast is for
    pub location: Location,
    /// The observed current conditions
    pub current: WeatherSnapshot,
    /// Day-by-day outlook, today first
    pub daily: Vec<DailyOutlook>,
}
