//! System prompts and questions for the two scripted scenarios.

use crate::finance::FinanceCategory;
use crate::{Error, Result};
use tracing::debug;

pub const WEATHER_SYSTEM_PROMPT: &str =
    "You are a weather expert. If the question is not about the weather, say: I don't know.";

pub const WEATHER_QUESTION: &str = "Which city is hotter today: LA or NY?";

/// The `{categories}` placeholder is replaced by the category table.
const FINANCE_SYSTEM_PROMPT: &str = r#"You are a finance expert tasked with analyzing the questions and selecting the most relevant title from a specified table. Find the finance topic and finance category that best match the content of the sentence.
**Dictionary:**
{categories}
**Instructions:**
- Determine the correct table from the dictionary.
- Use this table to find the finance topic and finance category values that are most relevant to the finance sentence
- Ensure that the values retrieved are the best match to the content of the sentence.
**Conclusion:**
Provide the result in the following format, only return following information not add any other word or sentence in response, give answer only in JSON Object format, only return answer with the following format do not use different format:
{"category": "found_category", "id": category_id}"#;

pub const FINANCE_QUESTION: &str = "What percentage of total Debit Card and Credit Card \
    expenditures were made in the Airlines and Accommodation sectors in 2023?";

/// Render the finance system prompt with the category table embedded as JSON.
pub fn build_finance_prompt(categories: &[FinanceCategory]) -> Result<String> {
    let table = serde_json::to_string_pretty(categories)
        .map_err(|e| Error::Config(format!("failed to serialize finance categories: {e}")))?;
    let prompt = FINANCE_SYSTEM_PROMPT.replace("{categories}", &table);
    debug!("Finance system prompt: {} chars", prompt.len());
    Ok(prompt)
}
