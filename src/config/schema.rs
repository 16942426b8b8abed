//! Configuration schema (TOML-based, overridable from the environment).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watsonx: WatsonxConfig,
    pub decoding: DecodingParams,
    pub weather: WeatherConfig,
}

/// Credentials and endpoint for the watsonx.ai chat API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatsonxConfig {
    /// IBM Cloud API key, exchanged for an IAM bearer token.
    pub api_key: String,

    /// watsonx.ai project the requests are billed to.
    pub project_id: String,

    /// Regional service URL, e.g. https://us-south.ml.cloud.ibm.com.
    pub url: String,

    /// Chat model identifier.
    pub model_id: String,

    /// IAM token service base URL.
    pub iam_url: String,

    /// `version` query parameter of the watsonx REST API.
    pub api_version: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            url: String::new(),
            model_id: String::new(),
            iam_url: "https://iam.cloud.ibm.com".into(),
            api_version: "2024-05-01".into(),
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for WatsonxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("WatsonxConfig")
            .field("api_key", &api_key)
            .field("project_id", &self.project_id)
            .field("url", &self.url)
            .field("model_id", &self.model_id)
            .field("iam_url", &self.iam_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Text generation parameters sent with every chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingParams {
    /// Shown and logged only; the chat endpoint has no field for it.
    pub decoding_method: String,
    /// Sent as `max_tokens`.
    pub max_new_tokens: u32,
    /// Shown and logged only; the chat endpoint has no field for it.
    pub min_new_tokens: u32,
    pub temperature: f64,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            decoding_method: "greedy".into(),
            max_new_tokens: 400,
            min_new_tokens: 1,
            temperature: 1.0,
        }
    }
}

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// wttr.in-compatible base URL.
    pub base_url: String,

    pub units: Units,

    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wttr.in".into(),
            units: Units::Metric,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Unit name appended to temperature values.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Metric => "celsius",
            Self::Imperial => "fahrenheit",
        }
    }
}
