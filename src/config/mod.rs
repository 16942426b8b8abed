pub mod schema;

pub use schema::{AppConfig, DecodingParams, Units, WatsonxConfig, WeatherConfig};

use crate::{Error, Result};
use std::path::Path;

/// IBM Cloud credential group.
pub const ENV_API_KEY: &str = "IBMCLOUD_APIKEY";
/// watsonx credential group.
pub const ENV_PROJECT_ID: &str = "WATSONX_PROJECT_ID";
pub const ENV_URL: &str = "WATSONX_URL";
pub const ENV_MODEL_ID: &str = "WATSONX_LLM_NAME";

/// Load config from the given TOML file, or return defaults when it is absent.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))
}

/// Parse a TOML config document.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents)
        .map_err(|e| Error::Config(format!("invalid TOML: {e}")))
}

/// Override file values with any set, non-blank environment variables.
///
/// `lookup` is `std::env::var(..).ok()` in the binary.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let targets: [(&str, &mut String); 4] = [
        (ENV_API_KEY, &mut config.watsonx.api_key),
        (ENV_PROJECT_ID, &mut config.watsonx.project_id),
        (ENV_URL, &mut config.watsonx.url),
        (ENV_MODEL_ID, &mut config.watsonx.model_id),
    ];
    for (var, slot) in targets {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            *slot = value.trim().to_string();
        }
    }
}

/// Load the file (if any), then the process environment.
pub fn load_from_env(path: &Path) -> Result<AppConfig> {
    let mut config = load_config(path)?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

impl WatsonxConfig {
    /// Check both credential groups; the first incomplete group fails.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(format!(
                "IBM Cloud credentials incomplete: {ENV_API_KEY} is not set"
            )));
        }

        let missing: Vec<&str> = [
            (ENV_PROJECT_ID, &self.project_id),
            (ENV_URL, &self.url),
            (ENV_MODEL_ID, &self.model_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "watsonx settings incomplete: {} not set",
                missing.join(", ")
            )));
        }

        for (name, url) in [("url", &self.url), ("iam_url", &self.iam_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "watsonx.{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}
