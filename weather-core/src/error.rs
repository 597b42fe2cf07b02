use thiserror::Error;

/// Which upstream endpoint a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Forecast,
    Current,
    AirPollution,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Forecast => "forecast",
            Endpoint::Current => "current weather",
            Endpoint::AirPollution => "air pollution",
        }
    }

    /// Path below the configured base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Forecast => "/data/2.5/forecast",
            Endpoint::Current => "/data/2.5/weather",
            Endpoint::AirPollution => "/data/2.5/air_pollution",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can abort a single forecast or air-quality request.
///
/// None of these are retried; the caller decides how to show them.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("OpenWeather {endpoint} request failed with status {status}")]
    UpstreamFetch { endpoint: Endpoint, status: u16 },

    #[error("Place '{place}' could not be found")]
    UnknownPlace { place: String },

    #[error("Malformed OpenWeather {endpoint} response: {detail}")]
    MalformedResponse { endpoint: Endpoint, detail: String },

    #[error("Failed to reach OpenWeather ({endpoint})")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ForecastError {
    pub(crate) fn malformed(endpoint: Endpoint, detail: impl Into<String>) -> Self {
        Self::MalformedResponse { endpoint, detail: detail.into() }
    }

    pub(crate) fn unknown_place(place: &str) -> Self {
        Self::UnknownPlace { place: place.to_string() }
    }

    /// Short text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::UnknownPlace { place } => format!("That place does not exist: {place}"),
            ForecastError::UpstreamFetch { status: 401, .. } => {
                "The weather service rejected the API key.\n\
                 Hint: run `weather configure` and enter a valid key."
                    .to_string()
            }
            ForecastError::UpstreamFetch { .. } | ForecastError::Transport { .. } => {
                "The weather service is currently unavailable. Please try again later.".to_string()
            }
            ForecastError::MalformedResponse { .. } => {
                "The weather service returned data that could not be understood.".to_string()
            }
            ForecastError::InvalidRequest(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_fetch_names_endpoint_and_status() {
        let err = ForecastError::UpstreamFetch { endpoint: Endpoint::Forecast, status: 404 };
        let msg = err.to_string();
        assert!(msg.contains("forecast"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn endpoint_display_is_readable_and_path_unchanged() {
        let err = ForecastError::UpstreamFetch { endpoint: Endpoint::Current, status: 500 };
        assert_eq!(err.to_string(), "OpenWeather current weather request failed with status 500");
        assert_eq!(Endpoint::Current.path(), "/data/2.5/weather");
        assert_eq!(Endpoint::AirPollution.to_string(), "air pollution");
        assert_eq!(Endpoint::AirPollution.path(), "/data/2.5/air_pollution");
    }

    #[test]
    fn unauthorized_gets_configure_hint() {
        let err = ForecastError::UpstreamFetch { endpoint: Endpoint::Current, status: 401 };
        assert!(err.user_message().contains("weather configure"));
    }

    #[test]
    fn unknown_place_message_is_distinct_from_outage() {
        let missing = ForecastError::unknown_place("Atlantis").user_message();
        let outage =
            ForecastError::UpstreamFetch { endpoint: Endpoint::Forecast, status: 503 }.user_message();
        assert!(missing.contains("Atlantis"));
        assert_ne!(missing, outage);
    }
}
