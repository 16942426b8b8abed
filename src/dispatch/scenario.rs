//! Conversation setup for one scripted invocation.

use crate::dispatch::system_prompt;
use crate::finance;
use crate::types::ChatMessage;
use crate::Result;

/// A one-shot conversation: a system prompt followed by a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub label: String,
    pub system_prompt: String,
    pub question: String,
}

impl Scenario {
    pub fn weather() -> Self {
        Self {
            label: "weather".into(),
            system_prompt: system_prompt::WEATHER_SYSTEM_PROMPT.into(),
            question: system_prompt::WEATHER_QUESTION.into(),
        }
    }

    pub fn finance() -> Result<Self> {
        Ok(Self {
            label: "finance".into(),
            system_prompt: system_prompt::build_finance_prompt(&finance::load_categories())?,
            question: system_prompt::FINANCE_QUESTION.into(),
        })
    }

    /// Replace the scripted question.
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    /// Build the message list sent to the model.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::human(&self.question),
        ]
    }
}
