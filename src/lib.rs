//! watsonx-tools — function calling against watsonx.ai chat models.
//!
//! A tool catalog is advertised to the model, and the tool call it selects
//! is dispatched to a weather lookup or a finance date-range report.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod finance;
pub mod tools;
pub mod types;
pub mod watsonx;
pub mod weather;

pub use error::{Error, Result};
