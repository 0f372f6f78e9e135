pub mod message;
pub mod request;

pub use message::{ChatCodeBlock, ChatCompletion, SavedCodeBlock, StreamingChatMessage};
pub use request::{ChatRequest, Provider};
