//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client (forecast, current conditions, air pollution)
//! - Forecast windowing and per-day aggregation
//! - Shared domain models and the error taxonomy
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregator::ForecastAggregator;
pub use config::{Config, Units};
pub use error::{Endpoint, ForecastError};
pub use model::{
    AirQualityIndex, CityInfo, Coordinates, CurrentWeather, DailyAggregate, ForecastSummary,
    RawForecastEntry, SkyCategory,
};
pub use provider::{ForecastPayload, WeatherSource, openweather::OpenWeatherClient};
