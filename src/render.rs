//! Plain-text rendering of forecast bundles
//!
//! Pure formatting functions over a bundle and a reference time. The caller
//! decides where the text goes; nothing in here touches the terminal or the
//! clock.

use chrono::{DateTime, Duration, Local, Timelike};

use crate::data::{ConditionKind, ForecastBundle, Units};

/// Renders the current-conditions panel
pub fn render_current(bundle: &ForecastBundle, now: DateTime<Local>) -> String {
    let current = &bundle.current;
    let glyph = condition_glyph(current.condition.kind(), is_day(now.hour()));

    let mut out = String::new();
    out.push_str(&format!(
        "{}  {}  {}\n",
        format_temp(current.temp, bundle.units),
        glyph,
        current.condition.description
    ));
    out.push_str(&format!(
        "{}  ·  feels like {}\n",
        bundle.location.label(),
        format_temp(current.feels_like, bundle.units)
    ));
    out.push_str(&format!(
        "Wind {}  ·  Humidity {:.0}%  ·  Visibility {:.1} km  ·  Pressure {:.0} hPa\n",
        format_wind(current.wind_speed, bundle.units),
        current.humidity,
        current.visibility / 1000.0,
        current.pressure
    ));
    out.push_str(&format!(
        "Sunrise {}  ·  Sunset {}\n",
        format_epoch(current.sunrise),
        format_epoch(current.sunset)
    ));
    out
}

/// Renders the day-by-day outlook, one row per day
pub fn render_outlook(bundle: &ForecastBundle, now: DateTime<Local>) -> String {
    let mut out = format!("{}\n", bundle.location.label());

    for day in &bundle.daily {
        let glyph = condition_glyph(day.condition.kind(), true);
        out.push_str(&format!(
            "{}  {}  {} / {}  {}\n",
            short_day(now, day.offset),
            glyph,
            format_temp(day.temp.max, bundle.units),
            format_temp(day.temp.min, bundle.units),
            day.condition.description
        ));
    }

    out
}

/// Formats a temperature with its unit suffix, rounded for display
pub fn format_temp(value: f64, units: Units) -> String {
    format!("{}{}", value.round(), units.temp_suffix())
}

/// Formats a wind speed with its unit suffix
pub fn format_wind(value: f64, units: Units) -> String {
    format!("{:.1} {}", value, units.wind_suffix())
}

/// Formats an epoch-second timestamp as a local wall-clock time
fn format_epoch(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Short uppercase day label for a day offset from the reference time
fn short_day(now: DateTime<Local>, offset: u8) -> String {
    let date = now + Duration::days(i64::from(offset));
    if offset == 0 {
        "TODAY ".to_string()
    } else {
        format!(
            "{} {}",
            date.format("%a").to_string().to_uppercase(),
            date.format("%d")
        )
    }
}

/// Day time is considered from 6am to 6pm
pub fn is_day(hour: u32) -> bool {
    hour > 6 && hour < 18
}

/// Picks a glyph for a condition archetype
fn condition_glyph(kind: ConditionKind, day: bool) -> &'static str {
    match kind {
        ConditionKind::Thunderstorm => "⚡",
        ConditionKind::Drizzle | ConditionKind::Rain => "☂",
        ConditionKind::Snow => "❄",
        ConditionKind::Atmosphere => "≈",
        ConditionKind::Clear if day => "☀",
        ConditionKind::Clear => "☽",
        ConditionKind::Clouds => "☁",
    }
}
