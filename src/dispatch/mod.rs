pub mod driver;
pub mod scenario;
pub mod system_prompt;

pub use driver::{
    fetch_weather, select_primary_tool_call, DispatchOutcome, DispatchReport, Dispatcher,
    SelectionPolicy,
};
pub use scenario::Scenario;
