use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use tracing::{debug, info, instrument};

use crate::{
    aggregate,
    config::Config,
    error::{Endpoint, ForecastError},
    model::{AirQualityIndex, Coordinates, ForecastSummary},
    provider::{WeatherSource, openweather::OpenWeatherClient},
};

/// Public entry point: fetches, windows and summarises a forecast for one place.
///
/// Holds no per-request state; every call goes to the network.
#[derive(Debug, Clone)]
pub struct ForecastAggregator<S> {
    source: S,
}

impl ForecastAggregator<OpenWeatherClient> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(OpenWeatherClient::from_config(config)?))
    }
}

impl<S: WeatherSource> ForecastAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn summarize(
        &self,
        place: &str,
        forecast_days: u32,
    ) -> Result<ForecastSummary, ForecastError> {
        self.summarize_at(place, forecast_days, Utc::now()).await
    }

    /// Same as [`summarize`](Self::summarize) with an explicit "now".
    ///
    /// The forecast is requested first; current conditions are only requested
    /// once it succeeded.
    #[instrument(skip(self, now))]
    pub async fn summarize_at(
        &self,
        place: &str,
        forecast_days: u32,
        now: DateTime<Utc>,
    ) -> Result<ForecastSummary, ForecastError> {
        let place = place.trim();
        if place.is_empty() {
            return Err(ForecastError::InvalidRequest("Place must not be empty".into()));
        }
        if forecast_days == 0 {
            return Err(ForecastError::InvalidRequest(
                "Forecast days must be at least 1".into(),
            ));
        }

        let payload = self.source.forecast(place).await?;
        let current = self.source.current(place).await?;

        let forecast = aggregate::window(&payload.entries, now.date_naive(), forecast_days).to_vec();
        let daily = aggregate::daily(&forecast);
        let local_time = local_time(now, payload.city.timezone_offset_secs)?;

        info!(
            city = %payload.city.name,
            entries = forecast.len(),
            days = daily.len(),
            "Forecast summarised"
        );

        Ok(ForecastSummary {
            city: payload.city,
            current,
            forecast,
            daily,
            local_time,
            generated_at: now,
        })
    }

    #[instrument(skip(self))]
    pub async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQualityIndex, ForecastError> {
        validate_coordinates(lat, lon)?;
        let aqi = self.source.air_quality(Coordinates { lat, lon }).await?;
        debug!(aqi = aqi.value(), "Air quality fetched");
        Ok(aqi)
    }
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ForecastError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ForecastError::InvalidRequest(format!(
            "Invalid coordinates ({lat}, {lon}): latitude must be -90 to 90, longitude -180 to 180"
        )));
    }
    Ok(())
}

/// Wall-clock time at a place `offset_secs` away from UTC.
fn local_time(now: DateTime<Utc>, offset_secs: i32) -> Result<NaiveDateTime, ForecastError> {
    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| {
        ForecastError::malformed(Endpoint::Forecast, format!("timezone offset {offset_secs} out of range"))
    })?;
    Ok(now.with_timezone(&offset).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::tests::entry,
        model::{CityInfo, CurrentWeather},
        provider::ForecastPayload,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct FakeSource {
        fail_forecast: Option<u16>,
        forecast_calls: AtomicUsize,
        current_calls: AtomicUsize,
        air_calls: Mutex<Vec<Coordinates>>,
    }

    fn city() -> CityInfo {
        CityInfo {
            name: "Tokyo".into(),
            country: "JP".into(),
            timezone_offset_secs: 9 * 3600,
            sunrise: 1_792_184_000,
            sunset: 1_792_225_000,
            coordinates: Coordinates { lat: 35.6895, lon: 139.6917 },
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn forecast(&self, _place: &str) -> Result<ForecastPayload, ForecastError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_forecast {
                return Err(ForecastError::UpstreamFetch { endpoint: Endpoint::Forecast, status });
            }
            Ok(ForecastPayload {
                city: city(),
                entries: vec![
                    entry("2026-10-17 15:00:00", 10.0, 15.0, 40, "Clear"),
                    entry("2026-10-17 18:00:00", 8.0, 18.0, 60, "Clear"),
                    entry("2026-10-17 21:00:00", 12.0, 14.0, 50, "Rain"),
                    entry("2026-10-18 00:00:00", 5.0, 9.0, 90, "Snow"),
                    entry("2026-10-18 03:00:00", 6.0, 7.0, 80, "Snow"),
                ],
            })
        }

        async fn current(&self, _place: &str) -> Result<CurrentWeather, ForecastError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CurrentWeather {
                temperature_c: 14.0,
                feels_like_c: 13.0,
                humidity_pct: 55,
                wind_speed_mps: 2.5,
                description: "clear sky".into(),
                icon: "01d".into(),
            })
        }

        async fn air_quality(&self, coordinates: Coordinates) -> Result<AirQualityIndex, ForecastError> {
            self.air_calls.lock().unwrap().push(coordinates);
            AirQualityIndex::try_from(2_i64)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 14, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn summarize_windows_and_aggregates() {
        let agg = ForecastAggregator::new(FakeSource::default());
        let summary = agg.summarize_at("Tokyo", 1, now()).await.unwrap();

        assert_eq!(summary.forecast.len(), 3);
        assert_eq!(summary.daily.len(), 1);

        let day = &summary.daily[0];
        assert_eq!(day.temp_min_c, 8.0);
        assert_eq!(day.temp_max_c, 18.0);
        assert_eq!(day.humidity_pct, 50.0);
        assert_eq!(day.description, "Clear");
        assert_eq!(summary.current.description, "clear sky");
        assert_eq!(summary.city.country, "JP");
    }

    #[tokio::test]
    async fn summarize_two_days_includes_tomorrow() {
        let agg = ForecastAggregator::new(FakeSource::default());
        let summary = agg.summarize_at("Tokyo", 2, now()).await.unwrap();

        assert_eq!(summary.forecast.len(), 5);
        let tomorrow = summary.day(chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()).unwrap();
        assert_eq!(tomorrow.description, "Snow");
        assert!((tomorrow.humidity_pct - 85.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn local_time_applies_city_offset() {
        let agg = ForecastAggregator::new(FakeSource::default());
        let summary = agg.summarize_at("Tokyo", 1, now()).await.unwrap();

        assert_eq!(summary.local_time.to_string(), "2026-10-17 23:30:00");
        assert_eq!(summary.generated_at, now());
    }

    #[tokio::test]
    async fn forecast_failure_skips_current_request() {
        let source = FakeSource { fail_forecast: Some(404), ..Default::default() };
        let agg = ForecastAggregator::new(source);

        let err = agg.summarize_at("Tokyo", 3, now()).await.unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamFetch { status: 404, .. }));
        assert_eq!(agg.source.forecast_calls.load(Ordering::SeqCst), 1);
        assert_eq!(agg.source.current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_days_rejected_before_any_request() {
        let agg = ForecastAggregator::new(FakeSource::default());
        let err = agg.summarize_at("Tokyo", 0, now()).await.unwrap_err();

        assert!(matches!(err, ForecastError::InvalidRequest(_)));
        assert_eq!(agg.source.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_place_rejected() {
        let agg = ForecastAggregator::new(FakeSource::default());
        let err = agg.summarize_at("   ", 1, now()).await.unwrap_err();
        assert!(matches!(err, ForecastError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn air_quality_validates_coordinates() {
        let agg = ForecastAggregator::new(FakeSource::default());

        assert!(matches!(
            agg.air_quality(91.0, 0.0).await,
            Err(ForecastError::InvalidRequest(_))
        ));
        assert!(agg.source.air_calls.lock().unwrap().is_empty());

        let aqi = agg.air_quality(35.6895, 139.6917).await.unwrap();
        assert_eq!(aqi.value(), 2);
        assert_eq!(agg.source.air_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn local_time_rejects_absurd_offsets() {
        assert!(local_time(now(), 200_000).is_err());
        assert_eq!(local_time(now(), -5 * 3600).unwrap().to_string(), "2026-10-17 09:30:00");
    }
}
