//! Finance reference data and the report produced by the finance tool.

use crate::types::ToolCallRequest;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the fixed finance category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceCategory {
    pub category: String,
    pub id: u32,
}

const CATEGORIES: [(&str, u32); 3] = [
    ("Exchange_Rates", 1),
    ("International_Investment_Position", 2),
    ("Bank_and_Credit_Card_Sectoral_Expenditure_Statistics", 3),
];

/// The category table offered to the model in the finance system prompt.
pub fn load_categories() -> Vec<FinanceCategory> {
    CATEGORIES
        .iter()
        .map(|(category, id)| FinanceCategory {
            category: (*category).to_string(),
            id: *id,
        })
        .collect()
}

/// Date range the model extracted for a `finance_service` call.
///
/// Dates are carried exactly as the model wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceRequest {
    pub startdate: String,
    pub enddate: String,
}

impl FinanceRequest {
    /// Read `startdate` and `enddate` from a tool call.
    pub fn from_call(call: &ToolCallRequest) -> Result<Self> {
        Ok(Self {
            startdate: call.required_arg("startdate")?.to_string(),
            enddate: call.required_arg("enddate")?.to_string(),
        })
    }
}

impl fmt::Display for FinanceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Your finance request is from {} to {}",
            self.startdate, self.enddate
        )
    }
}
