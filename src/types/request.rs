use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// LLM providers the backend can route a conversation to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "anthropic")]
    Anthropic,
}

/// One chat turn submitted to the completion endpoints.
///
/// Immutable once submitted. Knobs left unset stay out of the serialized
/// body so the server applies its own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub conversation_id: Uuid,
    pub message: String,
    pub provider: Provider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(
        conversation_id: Uuid,
        message: impl Into<String>,
        provider: Provider,
        model: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            message: message.into(),
            provider,
            model: model.into(),
            file_id: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Attaches an uploaded file to the turn.
    pub fn with_file(mut self, file_id: Uuid) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_left_out_of_body() {
        let request = ChatRequest::new(
            Uuid::nil(),
            "hello",
            Provider::OpenAI,
            "gpt-4-turbo-preview",
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["provider"], "openai");
        assert_eq!(body["message"], "hello");
        assert!(body.get("file_id").is_none());
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_builder_knobs_serialized() {
        let file = Uuid::new_v4();
        let request = ChatRequest::new(Uuid::new_v4(), "hi", Provider::Anthropic, "claude-3-haiku-20240307")
            .with_file(file)
            .with_temperature(0.2)
            .with_max_tokens(256);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["provider"], "anthropic");
        assert_eq!(body["file_id"], file.to_string());
        assert_eq!(body["max_tokens"], 256);
    }
}
