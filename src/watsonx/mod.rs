pub mod auth;
pub mod inference;

pub use auth::IamAuthenticator;
pub use inference::{ChatWithTools, ToolAwareChat, WatsonxChat};
