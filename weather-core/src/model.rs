use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Endpoint, ForecastError};

/// Coarse sky category as reported in `weather[0].main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkyCategory {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Other(String),
}

impl SkyCategory {
    pub fn as_str(&self) -> &str {
        match self {
            SkyCategory::Clear => "Clear",
            SkyCategory::Clouds => "Clouds",
            SkyCategory::Rain => "Rain",
            SkyCategory::Drizzle => "Drizzle",
            SkyCategory::Thunderstorm => "Thunderstorm",
            SkyCategory::Snow => "Snow",
            SkyCategory::Mist => "Mist",
            SkyCategory::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for SkyCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Clear" => SkyCategory::Clear,
            "Clouds" => SkyCategory::Clouds,
            "Rain" => SkyCategory::Rain,
            "Drizzle" => SkyCategory::Drizzle,
            "Thunderstorm" => SkyCategory::Thunderstorm,
            "Snow" => SkyCategory::Snow,
            "Mist" => SkyCategory::Mist,
            _ => SkyCategory::Other(value),
        }
    }
}

impl From<SkyCategory> for String {
    fn from(value: SkyCategory) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SkyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One 3-hour sample, as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForecastEntry {
    /// UTC timestamp of the sample.
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub sky: SkyCategory,
    pub description: String,
    pub icon: String,
    /// Probability of precipitation, 0.0 - 1.0.
    pub precipitation_probability: f64,
}

impl RawForecastEntry {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub name: String,
    pub country: String,
    /// Shift in seconds from UTC.
    pub timezone_offset_secs: i32,
    pub sunrise: i64,
    pub sunset: i64,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
}

/// Summary of every forecast entry that falls on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
}

/// Air Quality Index on OpenWeather's 1 (good) to 5 (very poor) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AirQualityIndex(u8);

impl AirQualityIndex {
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Good",
            2 => "Fair",
            3 => "Moderate",
            4 => "Poor",
            _ => "Very Poor",
        }
    }
}

impl TryFrom<i64> for AirQualityIndex {
    type Error = ForecastError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v @ 1..=5) => Ok(Self(v)),
            _ => Err(ForecastError::malformed(
                Endpoint::AirPollution,
                format!("aqi {value} is outside the 1-5 scale"),
            )),
        }
    }
}

impl std::fmt::Display for AirQualityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// Everything the presentation layer needs for one place.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub city: CityInfo,
    pub current: CurrentWeather,
    /// Windowed entries, in provider order.
    pub forecast: Vec<RawForecastEntry>,
    /// One aggregate per date, ordered by first appearance in `forecast`.
    pub daily: Vec<DailyAggregate>,
    /// Wall-clock time at the city when the summary was built.
    pub local_time: NaiveDateTime,
    pub generated_at: DateTime<Utc>,
}

impl ForecastSummary {
    pub fn day(&self, date: NaiveDate) -> Option<&DailyAggregate> {
        self.daily.iter().find(|d| d.date == date)
    }

    /// Daily aggregates sorted by date.
    pub fn daily_chronological(&self) -> Vec<&DailyAggregate> {
        let mut days: Vec<_> = self.daily.iter().collect();
        days.sort_by_key(|d| d.date);
        days
    }
}
