//! One-shot tool dispatch: Build messages → Invoke → Select → Dispatch → Report.
//!
//! The driver never loops back to the model and never retries. Any error
//! from the chat client or an adapter ends the run.

use crate::dispatch::Scenario;
use crate::finance::FinanceRequest;
use crate::tools::{FINANCE_SERVICE, WEATHER_SERVICE};
use crate::types::*;
use crate::watsonx::ChatWithTools;
use crate::weather::{split_cities, WeatherLookup};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Picks the tool call to execute from the model's ordered list.
pub type SelectionPolicy = for<'a> fn(&'a [ToolCallRequest]) -> Option<&'a ToolCallRequest>;

/// Default policy: the first tool call wins, the rest are ignored.
pub fn select_primary_tool_call(calls: &[ToolCallRequest]) -> Option<&ToolCallRequest> {
    calls.first()
}

/// Result of executing the selected tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", content = "result", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Weather(Vec<WeatherRecord>),
    Finance(FinanceRequest),
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weather(records) => {
                let parts: Vec<String> = records
                    .iter()
                    .map(|r| format!("{}: {}", r.city, r.temperature))
                    .collect();
                write!(f, "{}", parts.join(", "))
            }
            Self::Finance(request) => write!(f, "{request}"),
        }
    }
}

/// Everything one scenario produced, in step order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub messages: Vec<ChatMessage>,
    pub response: ModelResponse,
    pub selected: ToolCallRequest,
    pub outcome: DispatchOutcome,
}

/// Routes the model's chosen tool call to the matching adapter.
pub struct Dispatcher<'a> {
    chat: &'a dyn ChatWithTools,
    weather: &'a dyn WeatherLookup,
    policy: SelectionPolicy,
}

impl<'a> Dispatcher<'a> {
    pub fn new(chat: &'a dyn ChatWithTools, weather: &'a dyn WeatherLookup) -> Self {
        Self {
            chat,
            weather,
            policy: select_primary_tool_call,
        }
    }

    /// Substitute the tool-call selection policy.
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one scenario through the full sequence.
    pub async fn run(&self, scenario: &Scenario) -> Result<DispatchReport> {
        let messages = scenario.messages();
        info!("Invoking model for the {} scenario", scenario.label);

        let response = self.chat.invoke(&messages).await?;
        if response.tool_calls.is_empty() {
            warn!(
                "Model returned no tool call for the {} scenario: {:?}",
                scenario.label, response.content
            );
        }

        let selected = (self.policy)(&response.tool_calls)
            .cloned()
            .ok_or_else(|| {
                Error::MalformedResponse(format!(
                    "model response for the {} scenario contains no tool call",
                    scenario.label
                ))
            })?;
        info!(
            "Selected tool call {} of {}: {}",
            selected.name,
            response.tool_calls.len(),
            selected.id
        );

        let outcome = self.dispatch(&selected).await?;

        Ok(DispatchReport {
            messages,
            response,
            selected,
            outcome,
        })
    }

    /// Forward a tool call to the adapter named by its `name`.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<DispatchOutcome> {
        match call.name.as_str() {
            WEATHER_SERVICE => Ok(DispatchOutcome::Weather(
                fetch_weather(call, self.weather).await?,
            )),
            FINANCE_SERVICE => Ok(DispatchOutcome::Finance(FinanceRequest::from_call(call)?)),
            other => Err(Error::MalformedResponse(format!(
                "model requested unknown tool '{other}'"
            ))),
        }
    }
}

/// Look up every city in the call's `location` argument, in order.
///
/// Cities are queried one at a time. The first failure aborts the batch
/// and no partial list is returned.
pub async fn fetch_weather(
    call: &ToolCallRequest,
    weather: &dyn WeatherLookup,
) -> Result<Vec<WeatherRecord>> {
    let location = call.required_arg("location")?;
    let cities = split_cities(location);
    if cities.is_empty() {
        return Err(Error::MalformedResponse(format!(
            "location argument '{location}' names no city"
        )));
    }

    let mut records = Vec::with_capacity(cities.len());
    for city in cities {
        records.push(weather.current(city).await?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned response and records what it was sent.
    struct ScriptedChat {
        response: Result<ModelResponse>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn replying(tool_calls: Vec<ToolCallRequest>) -> Self {
            Self {
                response: Ok(ModelResponse {
                    tool_calls,
                    ..ModelResponse::default()
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                response: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatWithTools for ScriptedChat {
        async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.response {
                Ok(resp) => Ok(resp.clone()),
                Err(e) => Err(Error::Network(e.to_string())),
            }
        }
    }

    /// Records requested cities; fails for the city named in `fail_on`.
    #[derive(Default)]
    struct RecordingWeather {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl WeatherLookup for RecordingWeather {
        async fn current(&self, city: &str) -> Result<WeatherRecord> {
            self.calls.lock().unwrap().push(city.to_string());
            if self.fail_on == Some(city) {
                return Err(Error::Network(format!(
                    "weather request for '{city}' failed"
                )));
            }
            Ok(WeatherRecord {
                city: city.to_string(),
                temperature: format!("{} celsius", 10 + city.len()),
            })
        }
    }

    fn weather_call(location: &str) -> ToolCallRequest {
        ToolCallRequest::new(WEATHER_SERVICE, [("location", location)])
    }

    fn finance_call(start: &str, end: &str) -> ToolCallRequest {
        ToolCallRequest::new(
            FINANCE_SERVICE,
            [("startdate", start), ("enddate", end)],
        )
    }

    #[tokio::test]
    async fn each_city_is_queried_once_in_order() {
        let weather = RecordingWeather::default();
        let records = fetch_weather(&weather_call("LA,NY"), &weather)
            .await
            .unwrap();

        assert_eq!(*weather.calls.lock().unwrap(), ["LA", "NY"]);
        let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["LA", "NY"]);
    }

    #[tokio::test]
    async fn single_city_yields_single_record() {
        let weather = RecordingWeather::default();
        let records = fetch_weather(&weather_call("Paris"), &weather)
            .await
            .unwrap();
        assert_eq!(
            records,
            [WeatherRecord {
                city: "Paris".into(),
                temperature: "15 celsius".into(),
            }]
        );
    }

    #[tokio::test]
    async fn first_city_failure_aborts_the_batch() {
        let weather = RecordingWeather {
            fail_on: Some("LA"),
            ..RecordingWeather::default()
        };
        let err = fetch_weather(&weather_call("LA,NY"), &weather)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert_eq!(*weather.calls.lock().unwrap(), ["LA"]);
    }

    #[tokio::test]
    async fn missing_location_is_malformed() {
        let weather = RecordingWeather::default();
        let call = ToolCallRequest::new(WEATHER_SERVICE, [("city", "LA")]);
        let err = fetch_weather(&call, &weather).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));

        let err = fetch_weather(&weather_call(" , "), &weather)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(weather.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn finance_dates_pass_through_unchanged() {
        let chat = ScriptedChat::replying(vec![finance_call("01-01-2024", "31-12-2024")]);
        let weather = RecordingWeather::default();
        let dispatcher = Dispatcher::new(&chat, &weather);

        let report = dispatcher.run(&Scenario::finance().unwrap()).await.unwrap();
        assert_eq!(
            report.outcome,
            DispatchOutcome::Finance(FinanceRequest {
                startdate: "01-01-2024".into(),
                enddate: "31-12-2024".into(),
            })
        );
        assert_eq!(
            report.outcome.to_string(),
            "Your finance request is from 01-01-2024 to 31-12-2024"
        );
        assert!(weather.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_sends_scenario_messages_once() {
        let chat = ScriptedChat::replying(vec![weather_call("LA,NY")]);
        let weather = RecordingWeather::default();
        let scenario = Scenario::weather();

        let report = Dispatcher::new(&chat, &weather)
            .run(&scenario)
            .await
            .unwrap();

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], scenario.messages());
        assert_eq!(report.messages, scenario.messages());
        assert_eq!(report.selected.name, WEATHER_SERVICE);
        assert!(matches!(report.outcome, DispatchOutcome::Weather(ref r) if r.len() == 2));
    }

    #[tokio::test]
    async fn first_tool_call_wins() {
        let chat = ScriptedChat::replying(vec![weather_call("Paris"), weather_call("Rome")]);
        let weather = RecordingWeather::default();

        let report = Dispatcher::new(&chat, &weather)
            .run(&Scenario::weather())
            .await
            .unwrap();

        assert_eq!(*weather.calls.lock().unwrap(), ["Paris"]);
        assert_eq!(report.response.tool_calls.len(), 2);
        assert_eq!(report.outcome.to_string(), "Paris: 15 celsius");
    }

    #[tokio::test]
    async fn policy_can_be_substituted() {
        fn last_wins(calls: &[ToolCallRequest]) -> Option<&ToolCallRequest> {
            calls.last()
        }

        let chat = ScriptedChat::replying(vec![weather_call("Paris"), weather_call("Rome")]);
        let weather = RecordingWeather::default();

        Dispatcher::new(&chat, &weather)
            .with_policy(last_wins)
            .run(&Scenario::weather())
            .await
            .unwrap();

        assert_eq!(*weather.calls.lock().unwrap(), ["Rome"]);
    }

    #[tokio::test]
    async fn no_tool_call_is_malformed() {
        let chat = ScriptedChat::replying(Vec::new());
        let weather = RecordingWeather::default();

        let err = Dispatcher::new(&chat, &weather)
            .run(&Scenario::weather())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unknown_tool_is_malformed() {
        let call = ToolCallRequest::new("stock_service", [("ticker", "IBM")]);
        let chat = ScriptedChat::replying(vec![call]);
        let weather = RecordingWeather::default();

        let err = Dispatcher::new(&chat, &weather)
            .run(&Scenario::weather())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stock_service"));
    }

    #[tokio::test]
    async fn chat_errors_propagate() {
        let chat = ScriptedChat::failing(Error::Network("connection reset".into()));
        let weather = RecordingWeather::default();

        let err = Dispatcher::new(&chat, &weather)
            .run(&Scenario::weather())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(weather.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn outcome_serializes_with_tool_tag() {
        let outcome = DispatchOutcome::Weather(vec![WeatherRecord {
            city: "NY".into(),
            temperature: "21 celsius".into(),
        }]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["tool"], "weather");
        assert_eq!(value["result"][0]["temperature"], "21 celsius");
    }
}
