use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode, Select};
use tracing::debug;
use weather_core::{Config, ForecastAggregator, Units};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather forecast for the next days")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Temperature of every 3-hour sample.
    Temperature,
    /// Sky condition of every 3-hour sample.
    Sky,
    /// One summary line per day.
    Daily,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and display preferences.
    Configure,

    /// Show the forecast for a place.
    Show {
        /// Place name, e.g. "Tokyo" or "Paris,FR".
        place: String,

        /// Number of forecast days.
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=5))]
        days: u32,

        /// What to show for the forecast window.
        #[arg(long, value_enum, default_value_t = View::Daily)]
        view: View,

        /// Display units; defaults to the configured ones.
        #[arg(long)]
        units: Option<Units>,

        /// Also look up the air quality index.
        #[arg(long)]
        aqi: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { place, days, view, units, aqi } => {
                let config = Config::load()?;
                let units = units.unwrap_or(config.units);
                show(&config, &place, days, view, units, aqi).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let units = Select::new("Display units:", vec!["metric", "imperial"])
        .with_starting_cursor(if config.units == Units::Imperial { 1 } else { 0 })
        .prompt()
        .context("Failed to read units")?;
    config.units = units.parse().map_err(anyhow::Error::msg)?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(
    config: &Config,
    place: &str,
    days: u32,
    view: View,
    units: Units,
    with_aqi: bool,
) -> anyhow::Result<()> {
    let aggregator = ForecastAggregator::from_config(config)?;
    debug!(place, days, ?view, "Requesting forecast");

    let summary = match aggregator.summarize(place, days).await {
        Ok(summary) => summary,
        Err(err) => {
            debug!(error = ?err, "Forecast request failed");
            anyhow::bail!(err.user_message());
        }
    };

    let mut out = render::header(&summary, days, units);
    out.push_str(&match view {
        View::Temperature => render::temperature_view(&summary, units),
        View::Sky => render::sky_view(&summary),
        View::Daily => render::daily_view(&summary, units),
    });

    print!("{out}");

    if with_aqi {
        let coords = summary.city.coordinates;
        let aqi = aggregator.air_quality(coords.lat, coords.lon).await;
        if let Err(err) = &aqi {
            debug!(error = ?err, "Air quality request failed");
        }
        print!("{}", render::air_quality_line(&aqi));
    }

    Ok(())
}
