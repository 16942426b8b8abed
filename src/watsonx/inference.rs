//! Chat inference against the watsonx.ai `text/chat` endpoint.
//!
//! Tools are advertised in the OpenAI-compatible function format; the model
//! may answer with text, tool calls, or both.

use crate::config::{DecodingParams, WatsonxConfig};
use crate::tools::{ParameterSchema, ToolCatalog, ToolSpec};
use crate::types::*;
use crate::watsonx::auth::IamAuthenticator;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A chat model with a tool catalog attached.
#[async_trait]
pub trait ChatWithTools: Send + Sync {
    /// Send one conversation and return the model's reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse>;
}

/// watsonx.ai chat client.
#[derive(Debug, Clone)]
pub struct WatsonxChat {
    chat_url: String,
    model_id: String,
    project_id: String,
    decoding: DecodingParams,
    auth: Arc<IamAuthenticator>,
    http: reqwest::Client,
}

/// [`WatsonxChat`] with a validated tool catalog bound to every request.
#[derive(Debug, Clone)]
pub struct ToolAwareChat {
    chat: WatsonxChat,
    tools: ToolCatalog,
}

// -- Request/response types ---------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    messages: Vec<MessagePayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'static str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a ParameterSchema,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    #[serde(default)]
    id: String,
    function: FunctionCallPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPayload {
    name: String,
    /// A JSON-encoded string in the documented API; some models return an object.
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl WatsonxChat {
    /// Create a client. Fails with [`Error::Config`] on incomplete settings,
    /// without touching the network.
    pub fn new(config: &WatsonxConfig, decoding: DecodingParams) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            chat_url: format!(
                "{}/ml/v1/text/chat?version={}",
                config.url.trim_end_matches('/'),
                config.api_version
            ),
            model_id: config.model_id.clone(),
            project_id: config.project_id.clone(),
            decoding,
            auth: Arc::new(IamAuthenticator::new(
                &config.iam_url,
                &config.api_key,
                http.clone(),
            )),
            http,
        })
    }

    /// Attach a tool catalog to every subsequent request.
    pub fn bind_tools(self, tools: ToolCatalog) -> ToolAwareChat {
        ToolAwareChat { chat: self, tools }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Run one chat completion, advertising `tools` when non-empty.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse> {
        let tool_payloads = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ToolPayload {
                        r#type: "function",
                        function: FunctionPayload {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.parameters,
                        },
                    })
                    .collect(),
            )
        };

        let request = ChatRequest {
            model_id: &self.model_id,
            project_id: &self.project_id,
            messages: messages
                .iter()
                .map(|m| MessagePayload {
                    role: m.role.wire_name(),
                    content: &m.content,
                })
                .collect(),
            tools: tool_payloads,
            max_tokens: self.decoding.max_new_tokens,
            temperature: self.decoding.temperature,
        };

        debug!(
            "Chat request to model {} ({} messages, {} tools, decoding: {})",
            self.model_id,
            messages.len(),
            tools.len(),
            self.decoding.decoding_method
        );

        let token = self.auth.token().await?;
        let resp = self
            .http
            .post(&self.chat_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport("chat request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::from_status(status, body));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::from_transport("failed to parse chat response", e))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("chat response has no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let arguments = parse_arguments(&tc.function.name, &tc.function.arguments)?;
                Ok(ToolCallRequest {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            "Chat response: {} tool calls, {} total tokens",
            tool_calls.len(),
            usage.total_tokens
        );

        Ok(ModelResponse {
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls,
            usage,
        })
    }
}

impl ToolAwareChat {
    pub fn tools(&self) -> &ToolCatalog {
        &self.tools
    }

    pub fn model_id(&self) -> &str {
        self.chat.model_id()
    }
}

#[async_trait]
impl ChatWithTools for ToolAwareChat {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
        self.chat.chat(messages, self.tools.specs()).await
    }
}

/// Flatten tool-call arguments into string values.
///
/// Strings are kept as-is, other JSON values keep their JSON text and
/// `null` entries are dropped.
fn parse_arguments(tool: &str, raw: &serde_json::Value) -> Result<BTreeMap<String, String>> {
    let parsed;
    let value = match raw {
        serde_json::Value::String(s) if s.trim().is_empty() => return Ok(BTreeMap::new()),
        serde_json::Value::String(s) => {
            parsed = serde_json::from_str::<serde_json::Value>(s).map_err(|e| {
                Error::MalformedResponse(format!(
                    "tool '{tool}' arguments are not valid JSON: {e}"
                ))
            })?;
            &parsed
        }
        serde_json::Value::Null => return Ok(BTreeMap::new()),
        other => other,
    };

    let object = value.as_object().ok_or_else(|| {
        Error::MalformedResponse(format!(
            "tool '{tool}' arguments must be a JSON object, got {value}"
        ))
    })?;

    Ok(object
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect())
}
