//! Current-temperature lookups against the wttr.in JSON API.

use crate::config::{Units, WeatherConfig};
use crate::types::WeatherRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Source of current temperatures, one city per call.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherRecord>;
}

/// wttr.in weather client.
#[derive(Debug, Clone)]
pub struct WttrClient {
    base_url: String,
    units: Units,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: Option<String>,
    #[serde(rename = "temp_F")]
    temp_f: Option<String>,
}

impl WttrClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units,
            http,
        })
    }
}

#[async_trait]
impl WeatherLookup for WttrClient {
    async fn current(&self, city: &str) -> Result<WeatherRecord> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(city));
        debug!("Weather lookup: {}", city);

        let resp = self
            .http
            .get(&url)
            .query(&[("format", "j1")])
            .send()
            .await
            .map_err(|e| {
                Error::from_transport(&format!("weather request for '{city}' failed"), e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body: format!("weather lookup for '{city}': {body}"),
            });
        }

        let body: WttrResponse = resp.json().await.map_err(|e| {
            Error::MalformedResponse(format!(
                "weather response for '{city}' is not valid JSON: {e}"
            ))
        })?;

        let condition = body.current_condition.into_iter().next().ok_or_else(|| {
            Error::MalformedResponse(format!(
                "weather response for '{city}' has no current condition"
            ))
        })?;
        let value = match self.units {
            Units::Metric => condition.temp_c,
            Units::Imperial => condition.temp_f,
        }
        .ok_or_else(|| {
            Error::MalformedResponse(format!(
                "weather response for '{city}' has no temperature"
            ))
        })?;

        Ok(WeatherRecord {
            city: city.to_string(),
            temperature: format!("{} {}", value, self.units.label()),
        })
    }
}

/// Split the model's comma-joined `location` argument into city names.
pub fn split_cities(location: &str) -> Vec<&str> {
    location
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}
