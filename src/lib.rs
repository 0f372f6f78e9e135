pub mod auth;
pub mod cli;
pub mod client;
pub mod core;
pub mod eventsource;
pub mod types;

pub use auth::{EnvToken, NoToken, StaticToken, TokenProvider};
pub use client::{
    Callbacks, ChatClient, ChatEventHandler, MessageStream, SessionOutcome, StreamHandle,
};
pub use crate::core::{ChatError, ClientConfig, StreamEndPolicy};
pub use types::{ChatCodeBlock, ChatCompletion, ChatRequest, Provider, StreamingChatMessage};
