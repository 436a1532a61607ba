pub mod api;
pub mod client;
pub mod types;

pub use api::ChatBackend;
pub use client::OpenRouterClient;
pub use types::{ChatMessage, ChatRequest, ChatResponse, ContentPart, MessageContent};
