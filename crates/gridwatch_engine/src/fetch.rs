use std::time::Duration;

use gridwatch_core::{CityEntity, WeatherRecord};
use url::Url;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Base of the dashboard API, e.g. `http://localhost:8080/api`.
    pub api_base_url: String,
    pub bearer_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            bearer_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Request/response lookup of current conditions, keyed by city.
#[async_trait::async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current_weather(&self, city: &CityEntity) -> Result<WeatherRecord, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestWeatherLookup {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestWeatherLookup {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// `{base}/weather/current/{city}` with the city as one encoded segment.
    fn current_weather_url(&self, city: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.settings.api_base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(["weather", "current", city]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl WeatherLookup for ReqwestWeatherLookup {
    async fn current_weather(&self, city: &CityEntity) -> Result<WeatherRecord, FetchError> {
        let url = self.current_weather_url(&city.name)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.settings.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
