//! Simulated forecast generation and unit conversion
//!
//! Expands one real observation into a week-long outlook by perturbing the
//! observed values with small random deltas. This is display filler, not a
//! forecast model: the synthesized days only need to look plausible next to
//! the real reading. The RNG is injected so tests can seed it and assert
//! exact values.

use rand::Rng;

use crate::data::{
    Condition, DailyOutlook, ForecastBundle, Location, TempRange, Units, WeatherSnapshot,
};

/// Number of synthesized days appended after the observed day
const SYNTHESIZED_DAYS: u8 = 7;

/// Condition archetypes synthesized days are drawn from
const CONDITION_ARCHETYPES: [(u16, &str); 5] = [
    (800, "clear sky"),
    (801, "few clouds"),
    (802, "scattered clouds"),
    (500, "light rain"),
    (501, "moderate rain"),
];

/// Humidity bounds for synthesized days
const HUMIDITY_MIN: f64 = 30.0;
const HUMIDITY_MAX: f64 = 100.0;

/// Wind speed conversion factor, m/s to mph
const MPS_TO_MPH: f64 = 2.237;

/// Expands a metric observation into a metric forecast bundle
///
/// Day 0 is the literal observation; days 1 through 7 are synthesized:
/// the daytime temperature moves by a uniform delta in [-3, +3] (min and
/// max follow at delta-1 and delta+1), humidity wanders by up to ±10 within
/// [30, 100], wind by up to ±2 but never below zero, and sunrise/sunset by
/// up to ±300 seconds.
pub fn simulate_forecast<R: Rng>(
    location: &Location,
    snapshot: &WeatherSnapshot,
    rng: &mut R,
) -> ForecastBundle {
    let mut daily = Vec::with_capacity(usize::from(SYNTHESIZED_DAYS) + 1);

    // The observed day carries over untouched
    daily.push(DailyOutlook {
        offset: 0,
        temp: TempRange {
            day: snapshot.temp,
            min: snapshot.temp_min,
            max: snapshot.temp_max,
        },
        humidity: snapshot.humidity,
        wind_speed: snapshot.wind_speed,
        condition: snapshot.condition.clone(),
        sunrise: snapshot.sunrise,
        sunset: snapshot.sunset,
    });

    for offset in 1..=SYNTHESIZED_DAYS {
        daily.push(synthesize_day(offset, snapshot, rng));
    }

    ForecastBundle {
        units: Units::Metric,
        location: location.clone(),
        current: snapshot.clone(),
        daily,
    }
}

/// Synthesizes one future day from the observation
fn synthesize_day<R: Rng>(offset: u8, snapshot: &WeatherSnapshot, rng: &mut R) -> DailyOutlook {
    let delta = rng.gen_range(-3.0..=3.0);
    let (code, description) = CONDITION_ARCHETYPES[rng.gen_range(0..CONDITION_ARCHETYPES.len())];

    DailyOutlook {
        offset,
        temp: TempRange {
            day: snapshot.temp + delta,
            min: snapshot.temp_min + delta - 1.0,
            max: snapshot.temp_max + delta + 1.0,
        },
        humidity: (snapshot.humidity + rng.gen_range(-10.0..=10.0))
            .clamp(HUMIDITY_MIN, HUMIDITY_MAX),
        wind_speed: (snapshot.wind_speed + rng.gen_range(-2.0..=2.0)).max(0.0),
        condition: Condition {
            code,
            description: description.to_string(),
        },
        sunrise: snapshot.sunrise + rng.gen_range(-300..=300),
        sunset: snapshot.sunset + rng.gen_range(-300..=300),
    }
}

/// Converts a metric bundle to imperial
///
/// A pure function of the metric bundle: Celsius to Fahrenheit on every
/// temperature field, m/s to mph on every wind speed. There is no inverse;
/// applying this to an imperial bundle produces garbage.
pub fn to_imperial(bundle: &ForecastBundle) -> ForecastBundle {
    let current = WeatherSnapshot {
        temp: c_to_f(bundle.current.temp),
        feels_like: c_to_f(bundle.current.feels_like),
        temp_min: c_to_f(bundle.current.temp_min),
        temp_max: c_to_f(bundle.current.temp_max),
        wind_speed: bundle.current.wind_speed * MPS_TO_MPH,
        ..bundle.current.clone()
    };

    let daily = bundle
        .daily
        .iter()
        .map(|day| DailyOutlook {
            temp: TempRange {
                day: c_to_f(day.temp.day),
                min: c_to_f(day.temp.min),
                max: c_to_f(day.temp.max),
            },
            wind_speed: day.wind_speed * MPS_TO_MPH,
            ..day.clone()
        })
        .collect();

    ForecastBundle {
        units: Units::Imperial,
        location: bundle.location.clone(),
        current,
        daily,
    }
}

fn c_to_f(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
