use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::ForecastError,
    model::{AirQualityIndex, CityInfo, Coordinates, CurrentWeather, RawForecastEntry},
};

pub mod openweather;

/// The forecast endpoint's payload after extraction: the embedded city block
/// plus every 3-hour entry in provider order.
#[derive(Debug, Clone)]
pub struct ForecastPayload {
    pub city: CityInfo,
    pub entries: Vec<RawForecastEntry>,
}

/// Upstream calls the aggregator depends on. Each call is one request.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn forecast(&self, place: &str) -> Result<ForecastPayload, ForecastError>;

    async fn current(&self, place: &str) -> Result<CurrentWeather, ForecastError>;

    async fn air_quality(&self, coordinates: Coordinates) -> Result<AirQualityIndex, ForecastError>;
}
