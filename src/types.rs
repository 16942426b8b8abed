//! Shared types used across the client, the tools and the dispatcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A single message in a one-shot conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Human,
}

impl ChatRole {
    /// Role name as the chat endpoint expects it.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "user",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Human => write!(f, "human"),
        }
    }
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Human,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Model output
// ---------------------------------------------------------------------------

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl ToolCallRequest {
    pub fn new<K, V>(name: &str, arguments: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: String::new(),
            name: name.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up an argument the model was required to supply.
    pub fn required_arg(&self, key: &str) -> crate::Result<&str> {
        self.arguments.get(key).map(String::as_str).ok_or_else(|| {
            crate::Error::MalformedResponse(format!(
                "tool call '{}' is missing argument '{}'",
                self.name, key
            ))
        })
    }
}

/// Response from the chat endpoint: optional text plus ordered tool calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: TokenUsage,
}

/// Token usage reported by the chat endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Adapter results
// ---------------------------------------------------------------------------

/// Current temperature for one requested city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_role_is_sent_as_user() {
        assert_eq!(ChatRole::Human.wire_name(), "user");
        assert_eq!(ChatRole::System.wire_name(), "system");
        assert_eq!(ChatRole::Human.to_string(), "human");
    }

    #[test]
    fn required_arg_reports_missing_key() {
        let call = ToolCallRequest::new("weather_service", [("city", "Paris")]);
        assert_eq!(call.required_arg("city").unwrap(), "Paris");

        let err = call.required_arg("location").unwrap_err();
        assert!(matches!(err, crate::Error::MalformedResponse(_)));
        assert!(err.to_string().contains("location"));
    }
}
