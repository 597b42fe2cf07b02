use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::{Endpoint, ForecastError},
    model::{AirQualityIndex, CityInfo, Coordinates, CurrentWeather, RawForecastEntry},
};

use super::{ForecastPayload, WeatherSource};

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?;
        Self::new(api_key, &config.base_url, config.timeout())
    }

    /// Issue one GET and return the body of a successful response.
    ///
    /// `place` is only used to recognise OpenWeather's "city not found" 404.
    async fn get(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
        place: Option<&str>,
    ) -> Result<String, ForecastError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(%endpoint, %url, "Sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ForecastError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ForecastError::Transport { endpoint, source })?;

        if status.is_success() {
            return Ok(body);
        }

        warn!(%endpoint, %status, body = %truncate_body(&body), "OpenWeather request failed");

        if let Some(place) = place
            && status == StatusCode::NOT_FOUND
            && is_city_not_found(&body)
        {
            return Err(ForecastError::unknown_place(place));
        }

        Err(ForecastError::UpstreamFetch { endpoint, status: status.as_u16() })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn forecast(&self, place: &str) -> Result<ForecastPayload, ForecastError> {
        let endpoint = Endpoint::Forecast;
        let body = self
            .get(endpoint, &[("q", place), ("units", "metric")], Some(place))
            .await?;

        let parsed: OwForecastResponse = serde_json::from_str(&body)
            .map_err(|e| ForecastError::malformed(endpoint, e.to_string()))?;

        let (Some(city), Some(list)) = (parsed.city, parsed.list) else {
            return Err(ForecastError::unknown_place(place));
        };

        let entries = list
            .into_iter()
            .map(OwForecastEntry::into_entry)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(entries = entries.len(), city = %city.name, "Parsed OpenWeather forecast");

        Ok(ForecastPayload { city: city.into_city(), entries })
    }

    #[instrument(skip(self))]
    async fn current(&self, place: &str) -> Result<CurrentWeather, ForecastError> {
        let endpoint = Endpoint::Current;
        let body = self
            .get(endpoint, &[("q", place), ("units", "metric")], Some(place))
            .await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| ForecastError::malformed(endpoint, e.to_string()))?;

        let main = parsed.main.ok_or_else(|| ForecastError::unknown_place(place))?;
        let wind = parsed.wind.ok_or_else(|| ForecastError::malformed(endpoint, "missing wind"))?;
        let condition = parsed
            .weather
            .and_then(|w| w.into_iter().next())
            .ok_or_else(|| ForecastError::malformed(endpoint, "empty weather list"))?;

        Ok(CurrentWeather {
            temperature_c: main.temp,
            feels_like_c: main.feels_like,
            humidity_pct: main.humidity,
            wind_speed_mps: wind.speed,
            description: condition.description,
            icon: condition.icon,
        })
    }

    #[instrument(skip(self))]
    async fn air_quality(&self, coordinates: Coordinates) -> Result<AirQualityIndex, ForecastError> {
        let endpoint = Endpoint::AirPollution;
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();
        let body = self.get(endpoint, &[("lat", lat.as_str()), ("lon", lon.as_str())], None).await?;

        let parsed: OwAirResponse = serde_json::from_str(&body)
            .map_err(|e| ForecastError::malformed(endpoint, e.to_string()))?;

        let first = parsed
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::malformed(endpoint, "empty list"))?;

        AirQualityIndex::try_from(first.main.aqi)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
    weather: Option<Vec<OwWeather>>,
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
    coord: OwCoord,
    timezone: i32,
    sunrise: i64,
    sunset: i64,
}

impl OwCity {
    fn into_city(self) -> CityInfo {
        CityInfo {
            name: self.name,
            country: self.country,
            timezone_offset_secs: self.timezone,
            sunrise: self.sunrise,
            sunset: self.sunset,
            coordinates: Coordinates { lat: self.coord.lat, lon: self.coord.lon },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

impl OwForecastEntry {
    fn into_entry(self) -> Result<RawForecastEntry, ForecastError> {
        let endpoint = Endpoint::Forecast;
        let timestamp = unix_to_naive(self.dt)
            .ok_or_else(|| ForecastError::malformed(endpoint, format!("invalid dt {}", self.dt)))?;

        let condition = self.weather.into_iter().next().ok_or_else(|| {
            ForecastError::malformed(endpoint, format!("entry at {timestamp} has no weather"))
        })?;

        Ok(RawForecastEntry {
            timestamp,
            temperature_c: self.main.temp,
            temp_min_c: self.main.temp_min,
            temp_max_c: self.main.temp_max,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed_mps: self.wind.speed,
            sky: condition.main.into(),
            description: condition.description,
            icon: condition.icon,
            precipitation_probability: self.pop,
        })
    }
}

/// `list`/`city` are absent when the place could not be resolved.
#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Option<Vec<OwForecastEntry>>,
}

#[derive(Debug, Deserialize)]
struct OwAqi {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAqi,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

fn is_city_not_found(body: &str) -> bool {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .is_some_and(|m| m.eq_ignore_ascii_case("city not found"))
}

fn unix_to_naive(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_city_not_found_body() {
        assert!(is_city_not_found(r#"{"cod":"404","message":"city not found"}"#));
        assert!(!is_city_not_found(r#"{"cod":404,"message":"Internal error"}"#));
        assert!(!is_city_not_found("not json"));
        assert!(!is_city_not_found(""));
    }

    #[test]
    fn forecast_entry_conversion_takes_first_condition() {
        let raw: OwForecastEntry = serde_json::from_value(serde_json::json!({
            "dt": 1_792_281_600,
            "main": { "temp": 12.5, "feels_like": 11.0, "temp_min": 11.2, "temp_max": 13.1, "humidity": 71 },
            "weather": [
                { "main": "Rain", "description": "light rain", "icon": "10d" },
                { "main": "Clouds", "description": "overcast clouds", "icon": "04d" }
            ],
            "wind": { "speed": 4.2 }
        }))
        .unwrap();

        let entry = raw.into_entry().unwrap();
        assert_eq!(entry.timestamp.to_string(), "2026-10-18 00:00:00");
        assert_eq!(entry.sky, crate::model::SkyCategory::Rain);
        assert_eq!(entry.description, "light rain");
        assert_eq!(entry.icon, "10d");
        assert_eq!(entry.precipitation_probability, 0.0);
    }

    #[test]
    fn forecast_entry_without_weather_is_malformed() {
        let raw: OwForecastEntry = serde_json::from_value(serde_json::json!({
            "dt": 1_792_281_600,
            "main": { "temp": 1.0, "feels_like": 1.0, "temp_min": 1.0, "temp_max": 1.0, "humidity": 1 },
            "weather": [],
            "wind": { "speed": 1.0 }
        }))
        .unwrap();

        assert!(matches!(raw.into_entry(), Err(ForecastError::MalformedResponse { .. })));
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client =
            OpenWeatherClient::new("KEY".into(), "http://localhost:1234/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:1234");
    }
}
