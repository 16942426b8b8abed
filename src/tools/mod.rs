pub mod schema;

pub use schema::{ParameterSchema, ToolSpec};

use crate::{Error, Result};
use std::collections::HashSet;

pub const FINANCE_SERVICE: &str = "finance_service";
pub const WEATHER_SERVICE: &str = "weather_service";

// ---------------------------------------------------------------------------
// Tool definitions for the chat model
// ---------------------------------------------------------------------------

/// Build the list of tool definitions offered to the model.
///
/// The date fallbacks live in the parameter descriptions: the model applies
/// them, nothing in this crate does.
pub fn load_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: FINANCE_SERVICE.into(),
            description: "finance advisor api provide all of the financial needs and information \
                in that api, it serve financial instructions, international finance statuses, \
                money transactions, loans, debits, banking operations or etc, you can found \
                everything for financial area in this api"
                .into(),
            parameters: ParameterSchema::object()
                .property(
                    "startdate",
                    ParameterSchema::string(
                        "requested transaction start date or time with format dd-MM-yyyy, it is \
                         required parameter you must find and return begin date value. If query \
                         not contains any start date, you can alternatively set start date as \
                         01-01-2024",
                    ),
                    true,
                )
                .property(
                    "enddate",
                    ParameterSchema::string(
                        "requested transaction end date or time with format dd-MM-yyyy, it is \
                         required parameter you must find and return last date value. If query \
                         not contains any end date, you can alternatively set end date as \
                         31-12-2024",
                    ),
                    true,
                ),
        },
        ToolSpec {
            name: WEATHER_SERVICE.into(),
            description: "weather advisor api provide all of the weather needs and information \
                in that api, it serve weather information"
                .into(),
            parameters: ParameterSchema::object().property(
                "location",
                ParameterSchema::string("The city and state, e.g. San Francisco, CA"),
                true,
            ),
        },
    ]
}

// ---------------------------------------------------------------------------
// Validated catalog
// ---------------------------------------------------------------------------

/// A set of tool specs that passed validation; the only form the chat
/// client accepts.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    pub fn new(specs: Vec<ToolSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate tool name '{}'",
                    spec.name
                )));
            }
        }
        Ok(Self { specs })
    }

    /// The built-in finance and weather tools.
    pub fn builtin() -> Result<Self> {
        Self::new(load_tools())
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }
}
