//! Plain-text rendering of a [`ForecastSummary`].

use std::fmt::Write;

use weather_core::{AirQualityIndex, ForecastError, ForecastSummary, SkyCategory, Units};

const BAR_WIDTH: f64 = 30.0;

fn temp(celsius: f64, units: Units) -> String {
    match units {
        Units::Metric => format!("{celsius:.1}°C"),
        Units::Imperial => format!("{:.1}°F", celsius * 9.0 / 5.0 + 32.0),
    }
}

fn speed(mps: f64, units: Units) -> String {
    match units {
        Units::Metric => format!("{mps:.1} m/s"),
        Units::Imperial => format!("{:.1} mph", mps * 2.236_936),
    }
}

fn sky_symbol(sky: &SkyCategory) -> &'static str {
    match sky {
        SkyCategory::Clear => "☀",
        SkyCategory::Clouds => "☁",
        SkyCategory::Rain | SkyCategory::Drizzle => "☂",
        SkyCategory::Thunderstorm => "⚡",
        SkyCategory::Snow => "❄",
        SkyCategory::Mist | SkyCategory::Other(_) => "~",
    }
}

pub fn header(summary: &ForecastSummary, days: u32, units: Units) -> String {
    let city = &summary.city;
    let current = &summary.current;
    let day_word = if days == 1 { "day" } else { "days" };

    let mut out = String::new();
    let _ = writeln!(out, "Forecast for the next {days} {day_word} in {}, {}", city.name, city.country);
    let _ = writeln!(out, "Local time: {}", summary.local_time.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(
        out,
        "Now: {} (feels like {}), {}, humidity {}%, wind {}",
        temp(current.temperature_c, units),
        temp(current.feels_like_c, units),
        current.description,
        current.humidity_pct,
        speed(current.wind_speed_mps, units),
    );
    out.push('\n');
    out
}

/// One line per sample with a bar scaled between the window's extremes.
pub fn temperature_view(summary: &ForecastSummary, units: Units) -> String {
    let temps: Vec<f64> = summary.forecast.iter().map(|e| e.temperature_c).collect();
    let lo = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(f64::EPSILON);

    let mut out = String::new();
    for entry in &summary.forecast {
        let len = 1 + ((entry.temperature_c - lo) / span * BAR_WIDTH).round() as usize;
        let _ = writeln!(
            out,
            "{}  {:>8}  {}",
            entry.timestamp.format("%a %d %H:%M"),
            temp(entry.temperature_c, units),
            "█".repeat(len),
        );
    }
    out
}

pub fn sky_view(summary: &ForecastSummary) -> String {
    let mut out = String::new();
    for entry in &summary.forecast {
        let _ = writeln!(
            out,
            "{}  {} {:<12} {:<24} rain {:>3.0}%",
            entry.timestamp.format("%a %d %H:%M"),
            sky_symbol(&entry.sky),
            entry.sky.as_str(),
            entry.description,
            entry.precipitation_probability * 100.0,
        );
    }
    out
}

pub fn daily_view(summary: &ForecastSummary, units: Units) -> String {
    let mut out = String::new();
    for day in summary.daily_chronological() {
        let _ = writeln!(
            out,
            "{}  {:>8} / {:<8}  humidity {:>3.0}%  wind {:>9}  {}",
            day.date.format("%a %Y-%m-%d"),
            temp(day.temp_min_c, units),
            temp(day.temp_max_c, units),
            day.humidity_pct,
            speed(day.wind_speed_mps, units),
            day.description,
        );
    }
    out
}

/// Air quality line; a failed lookup is reported without hiding the forecast.
pub fn air_quality_line(result: &Result<AirQualityIndex, ForecastError>) -> String {
    match result {
        Ok(aqi) => format!("\nAir quality: {aqi}\n"),
        Err(err) => format!("\nAir quality: unavailable ({})\n", err.user_message()),
    }
}
